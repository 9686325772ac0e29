// src/web/mw_auth.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{Role, SessionPrincipal},
    services::auth_service::{self, Authorization},
};
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Chave onde o SessionPrincipal fica guardado na sessão.
pub const PRINCIPAL_KEY: &str = "principal";

/// Lê o principal da sessão (None = anónimo).
pub async fn load_principal(session: &Session) -> AppResult<Option<SessionPrincipal>> {
    session
        .get::<SessionPrincipal>(PRINCIPAL_KEY)
        .await
        .map_err(|e| AppError::SessionError(format!("Erro ao ler sessão: {}", e)))
}

/// anónimo -> autenticado: roda o ID da sessão e guarda o principal.
pub async fn establish_session(session: &Session, principal: &SessionPrincipal) -> AppResult<()> {
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
    session
        .insert(PRINCIPAL_KEY, principal)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))
}

async fn require_role(
    session: Session,
    mut request: Request,
    next: Next,
    required_role: Role,
) -> Result<Response, AppError> {
    let principal = load_principal(&session).await?;

    match auth_service::authorize(principal, required_role) {
        Authorization::Allowed(principal) => {
            tracing::debug!(
                "Autorização MW: '{}' autorizado como {}. Prosseguindo...",
                principal.user_id,
                required_role
            );
            // Os handlers protegidos recebem o principal via Extension
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Authorization::Denied => {
            tracing::debug!(
                "Autorização MW: acesso {} negado a {}. Redirecionando para {}",
                required_role,
                request.uri().path(),
                required_role.login_path()
            );
            Ok(Redirect::to(required_role.login_path()).into_response())
        }
    }
}

/// Rotas /admin/*: exige sessão com role admin.
pub async fn require_admin(session: Session, request: Request, next: Next) -> Result<Response, AppError> {
    require_role(session, request, next, Role::Admin).await
}

/// Rotas /user/* protegidas: exige sessão com role user.
pub async fn require_user(session: Session, request: Request, next: Next) -> Result<Response, AppError> {
    require_role(session, request, next, Role::User).await
}
