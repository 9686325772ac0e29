// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod mw_auth;
pub mod routes;
pub mod user_handlers;

use crate::error::{AppError, AppResult};
use askama::Template;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

/// Mensagens de feedback passadas na query string (padrão Post/Redirect/Get).
#[derive(Deserialize, Debug, Default)]
pub struct FeedbackParams {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Renderiza um template Askama; falhas de render viram erro 500.
pub fn render(template: &impl Template) -> AppResult<Response> {
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar template: {}", e);
            Err(AppError::TemplateError(e))
        }
    }
}

/// Redireciona com `?success=...` ou `?error=...` já codificado.
pub fn redirect_with(path: &str, key: &str, message: &str) -> Redirect {
    let redirect_url = format!("{}?{}={}", path, key, urlencoding::encode(message));
    Redirect::to(&redirect_url)
}
