// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{ForgotPasswordForm, LoginForm, ResetPasswordForm, Role, SignupForm},
    services::auth_service,
    state::AppState,
    templates::{ForgotPasswordPage, LoginPage, ResetPasswordPage, SignupPage},
    web::{mw_auth, redirect_with, render, FeedbackParams},
};
use axum::{
    extract::{Form, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

// Mesma resposta quer o email exista quer não
const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent.";

fn login_page(role: Role, error: Option<String>, success: Option<String>) -> LoginPage {
    match role {
        Role::User => LoginPage {
            heading: "User login",
            action: "/login",
            is_admin_surface: false,
            error,
            success,
        },
        Role::Admin => LoginPage {
            heading: "Admin login",
            action: "/admin/login",
            is_admin_surface: true,
            error,
            success,
        },
    }
}

/// Página inicial de cada role após login.
fn landing_path(role: Role) -> &'static str {
    match role {
        Role::User => "/user/dashboard",
        Role::Admin => "/admin/books",
    }
}

async fn show_login(session: Session, params: FeedbackParams, role: Role) -> AppResult<Response> {
    // Já autenticado com esta role: vai direto para a página inicial
    if let Some(principal) = mw_auth::load_principal(&session).await? {
        if principal.role == role {
            tracing::debug!("GET {}: '{}' já logado, redirecionando", role.login_path(), principal.user_id);
            return Ok(Redirect::to(landing_path(role)).into_response());
        }
    }
    render(&login_page(role, params.error, params.success))
}

async fn login_as(state: &AppState, session: &Session, form: LoginForm, role: Role) -> AppResult<Response> {
    tracing::info!("Tentativa de login ({}) para: {}", role, form.email);

    match auth_service::authenticate(&state.db_pool, &form.email, &form.password, role).await {
        Ok(principal) => {
            mw_auth::establish_session(session, &principal).await?;
            tracing::info!("✅ Login bem-sucedido para: {} ({})", principal.user_id, role);
            Ok(Redirect::to(landing_path(role)).into_response())
        }
        Err(AppError::InvalidCredentials) => {
            // Mensagem genérica, nunca diz qual campo falhou
            let message = AppError::InvalidCredentials.to_string();
            render(&login_page(role, Some(message), None))
        }
        Err(e) => {
            tracing::error!("Erro ao autenticar {}: {:?}", form.email, e);
            Err(e)
        }
    }
}

// GET /login
pub async fn show_login_form(session: Session, Query(params): Query<FeedbackParams>) -> AppResult<Response> {
    show_login(session, params, Role::User).await
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    login_as(&state, &session, form, Role::User).await
}

// GET /admin/login
pub async fn show_admin_login_form(
    session: Session,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    show_login(session, params, Role::Admin).await
}

// POST /admin/login
pub async fn handle_admin_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    login_as(&state, &session, form, Role::Admin).await
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let principal = mw_auth::load_principal(&session).await.ok().flatten();

    // Apaga todos os dados da sessão atual
    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    match principal {
        Some(p) => tracing::info!("🚪 Utilizador '{}' desligado.", p.user_id),
        None => tracing::info!("🚪 Sessão anónima desligada."),
    }

    Ok(Redirect::to("/login"))
}

// GET /signup
pub async fn show_signup_form() -> AppResult<Response> {
    render(&SignupPage {
        error: None,
        full_name: String::new(),
        email: String::new(),
        mobile: String::new(),
        role: "user".to_string(),
    })
}

// POST /signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    tracing::info!("POST /signup: registo para '{}' (role '{}')", form.email, form.role);

    match auth_service::signup(&state.db_pool, &form, &state.config.admin_signup_key, Utc::now()).await {
        Ok(_) => {
            // O registo não autentica: segue para o login da role escolhida
            let role = form.role.parse::<Role>().unwrap_or(Role::User);
            Ok(redirect_with(role.login_path(), "success", "Account created. Please log in.").into_response())
        }
        Err(AppError::Validation(v)) => {
            tracing::warn!("Registo falhou para '{}': {}", form.email, v.code());
            render(&SignupPage {
                error: Some(v.to_string()),
                full_name: form.full_name,
                email: form.email,
                mobile: form.mobile,
                role: form.role,
            })
        }
        Err(e) => Err(e),
    }
}

// GET /forgot-password
pub async fn show_forgot_password_form() -> AppResult<Response> {
    render(&ForgotPasswordPage { message: None })
}

// POST /forgot-password
pub async fn handle_forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> AppResult<Response> {
    auth_service::issue_reset_token(
        &state.db_pool,
        state.notifier.as_ref(),
        &state.config.base_url,
        &form.email,
        Utc::now(),
    )
    .await?;

    render(&ForgotPasswordPage {
        message: Some(RESET_REQUESTED_MESSAGE.to_string()),
    })
}

// GET /reset-password/{token}
pub async fn show_reset_password_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Response> {
    let error = match auth_service::find_valid_reset_token(&state.db_pool, &token, Utc::now()).await? {
        Some(_) => None,
        None => Some(crate::error::ValidationError::NotFoundOrExpired.to_string()),
    };
    render(&ResetPasswordPage { token, error })
}

// POST /reset-password/{token}
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> AppResult<Response> {
    match auth_service::consume_reset_token(
        &state.db_pool,
        &token,
        &form.new_password,
        &form.confirm_password,
        Utc::now(),
    )
    .await
    {
        Ok(()) => Ok(redirect_with("/login", "success", "Password updated. Please log in.").into_response()),
        Err(AppError::Validation(v)) => {
            tracing::warn!("Reset de senha falhou: {}", v.code());
            render(&ResetPasswordPage {
                token,
                error: Some(v.to_string()),
            })
        }
        Err(e) => Err(e),
    }
}
