// src/state.rs
use crate::{config::AppConfig, services::notifier::Notifier};
use sqlx::SqlitePool;
use std::sync::Arc;

// Dependências partilhadas, passadas explicitamente a cada handler
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<AppConfig>,
    // Canal usado para os links de reset de senha
    pub notifier: Arc<dyn Notifier>,
}
