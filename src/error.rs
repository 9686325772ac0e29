// src/error.rs
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

/// Falhas de validação recuperáveis: o handler volta a mostrar o formulário com a mensagem.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required.")]
    MissingFields,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("An account with this email or mobile number already exists.")]
    Duplicate,

    #[error("Unknown account type.")]
    InvalidRole,

    #[error("Invalid admin key.")]
    InvalidAdminKey,

    #[error("This reset link is invalid or has expired.")]
    NotFoundOrExpired,
}

impl ValidationError {
    /// Código estável (usado nos logs e nos testes).
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingFields => "missing_fields",
            ValidationError::PasswordMismatch => "password_mismatch",
            ValidationError::Duplicate => "duplicate",
            ValidationError::InvalidRole => "invalid_role",
            ValidationError::InvalidAdminKey => "invalid_admin_key",
            ValidationError::NotFoundOrExpired => "not_found_or_expired",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    // Mensagem genérica: não revela se foi o email, a role ou a senha
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Erro ao renderizar template: {0}")]
    TemplateError(#[from] askama::Error),

    #[error("Registo não encontrado")]
    NotFound,

    #[error("Erro interno inesperado")]
    InternalServerError,
}

// Como converter AppError numa resposta HTTP
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Erro processado: {:?}", self);

        let (status, user_message) = match self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Could not access the library data.")
            }
            AppError::PasswordHashingError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Could not process credentials.")
            }
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid form data."),
            AppError::SessionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Your session could not be handled.")
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "The requested record does not exist."),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred."),
        };

        (status, Html(format!(r#"
            <!DOCTYPE html><html><head><title>Error</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Error {status_code}</h1><p>{message}</p><a href="javascript:history.back()">Back</a></body></html>
         "#, status_code=status.as_u16(), message=user_message))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
