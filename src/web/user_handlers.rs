// src/web/user_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        book::CatalogQuery,
        ticket::{NewTicketForm, ISSUE_TYPES},
        user::{Role, SessionPrincipal},
    },
    services::{catalog_service, ticket_service, user_service},
    state::AppState,
    templates::{category_options, SupportPage, UserBooksPage, UserDashboardPage},
    web::{mw_auth, redirect_with, render, FeedbackParams},
};
use axum::{
    extract::{Extension, Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

// GET /user/dashboard (protegido por require_user)
pub async fn dashboard_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(principal): Extension<SessionPrincipal>,
) -> AppResult<Response> {
    tracing::debug!("GET /user/dashboard: acesso para {}", principal.user_id);

    // A conta pode ter sido removida depois do login
    let Some(user) = user_service::find_user_by_id(&state.db_pool, &principal.user_id).await? else {
        tracing::error!("user_id '{}' autenticado não encontrado na DB! Terminando sessão.", principal.user_id);
        session
            .delete()
            .await
            .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;
        return Ok(Redirect::to(Role::User.login_path()).into_response());
    };

    let tickets = ticket_service::find_tickets_for_user(&state.db_pool, &principal.user_id).await?;
    let open_tickets = tickets.iter().filter(|t| !t.is_resolved()).count();

    render(&UserDashboardPage {
        user_name: user.full_name,
        open_tickets,
        total_tickets: tickets.len(),
    })
}

// GET /user/books?q=...&category=... (público; pesquisa só no título)
pub async fn user_books_handler(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CatalogQuery>,
) -> AppResult<Response> {
    let filter = catalog_service::build_user_filter(&params.q, &params.category);
    let books = catalog_service::find_books(&state.db_pool, &filter).await?;
    let categories = catalog_service::list_categories(&state.db_pool).await?;

    let logged_in = matches!(
        mw_auth::load_principal(&session).await?,
        Some(SessionPrincipal { role: Role::User, .. })
    );

    render(&UserBooksPage {
        books,
        categories: category_options(categories, params.category.trim()),
        query: params.q,
        logged_in,
    })
}

// GET /user/support
pub async fn support_page_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<SessionPrincipal>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    let tickets = ticket_service::find_tickets_for_user(&state.db_pool, &principal.user_id).await?;
    render(&SupportPage {
        tickets,
        issue_types: ISSUE_TYPES,
        success_message: params.success,
        error_message: params.error,
    })
}

// POST /user/support
pub async fn handle_new_ticket(
    State(state): State<AppState>,
    Extension(principal): Extension<SessionPrincipal>,
    Form(form): Form<NewTicketForm>,
) -> AppResult<Response> {
    tracing::info!("POST /user/support: novo ticket de {}", principal.user_id);

    match ticket_service::create_ticket(
        &state.db_pool,
        &principal.user_id,
        &form.issue_type,
        &form.message,
        Utc::now(),
    )
    .await
    {
        Ok(_) => Ok(redirect_with("/user/support", "success", "Your ticket was sent.").into_response()),
        Err(AppError::Validation(v)) => {
            Ok(redirect_with("/user/support", "error", &v.to_string()).into_response())
        }
        Err(e) => Err(e),
    }
}
