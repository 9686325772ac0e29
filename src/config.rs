// src/config.rs
use std::env;

/// Configuração lida do ambiente (.env via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Prefixo dos links enviados por email (ex: reset de senha).
    pub base_url: String,
    /// Chave partilhada exigida no registo de administradores. Vazia = registo admin desativado.
    pub admin_signup_key: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
        let base_url = env::var("APP_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();
        let admin_signup_key = env::var("ADMIN_SIGNUP_KEY").unwrap_or_default();
        if admin_signup_key.is_empty() {
            tracing::warn!("⚠️ ADMIN_SIGNUP_KEY não definida: registo de administradores desativado.");
        }
        Ok(Self {
            database_url,
            bind_addr,
            base_url,
            admin_signup_key,
        })
    }

    /// Configuração fixa para testes.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            bind_addr: "127.0.0.1:0".into(),
            base_url: "http://library.test".into(),
            admin_signup_key: "letmein".into(),
        }
    }
}
