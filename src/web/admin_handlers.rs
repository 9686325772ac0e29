// src/web/admin_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookForm,
        borrow::BorrowForm,
        ticket::ResolveTicketForm,
        user::SessionPrincipal,
    },
    services::{borrow_service, catalog_service, ticket_service},
    state::AppState,
    templates::{
        category_options, AdminBooksPage, AdminTicketsPage, BookFormPage, BorrowFormPage,
        BorrowedBooksPage, CategoriesPage,
    },
    web::{redirect_with, render, FeedbackParams},
};
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;

// Pesquisa + feedback da última ação
#[derive(Deserialize, Debug, Default)]
pub struct AdminBooksParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    category: String,
    success: Option<String>,
}

// --- Livros ---

/// GET /admin/books - pesquisa por título OU autor, e categoria
pub async fn admin_books_handler(
    State(state): State<AppState>,
    Query(params): Query<AdminBooksParams>,
) -> AppResult<Response> {
    let AdminBooksParams { q, category, success } = params;
    tracing::debug!("GET /admin/books: q='{}' category='{}'", q, category);

    let categories = catalog_service::list_categories(&state.db_pool).await?;
    let filter = catalog_service::build_admin_filter(&q, &category);
    let books = catalog_service::find_books(&state.db_pool, &filter).await?;

    render(&AdminBooksPage {
        books,
        categories: category_options(categories, category.trim()),
        query: q,
        success_message: success,
    })
}

// GET /admin/add-book
pub async fn show_add_book_form() -> AppResult<Response> {
    render(&BookFormPage::empty())
}

// POST /admin/add-book
pub async fn handle_add_book(
    State(state): State<AppState>,
    Extension(admin): Extension<SessionPrincipal>,
    Form(form): Form<BookForm>,
) -> AppResult<Redirect> {
    tracing::info!("POST /admin/add-book: '{}' por {}", form.title, admin.user_id);
    catalog_service::create_book(&state.db_pool, &form).await?;
    Ok(redirect_with("/admin/books", "success", &format!("Book '{}' added.", form.title.trim())))
}

// GET /admin/edit-book/{id}
pub async fn show_edit_book_form(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Response> {
    let book = catalog_service::find_book_by_id(&state.db_pool, &book_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Tentativa de editar livro inexistente: {}", book_id);
            AppError::NotFound
        })?;
    render(&BookFormPage::for_book(book))
}

// POST /admin/edit-book/{id}
pub async fn handle_edit_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    Form(form): Form<BookForm>,
) -> AppResult<Redirect> {
    tracing::info!("POST /admin/edit-book/{}", book_id);
    catalog_service::update_book(&state.db_pool, &book_id, &form).await?;
    Ok(redirect_with("/admin/books", "success", &format!("Book '{}' updated.", form.title.trim())))
}

// GET /admin/delete-book/{id}
pub async fn handle_delete_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Redirect> {
    tracing::info!("GET /admin/delete-book/{}", book_id);
    catalog_service::delete_book(&state.db_pool, &book_id).await?;
    Ok(redirect_with("/admin/books", "success", "Book deleted."))
}

/// GET /admin/categories - agregação {type, count} por ordem alfabética
pub async fn categories_handler(State(state): State<AppState>) -> AppResult<Response> {
    let categories = catalog_service::category_counts(&state.db_pool).await?;
    render(&CategoriesPage { categories })
}

// --- Empréstimos ---

// GET /admin/borrowed-books
pub async fn borrowed_books_handler(
    State(state): State<AppState>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    let records = borrow_service::find_all_borrowed(&state.db_pool).await?;
    render(&BorrowedBooksPage {
        records,
        success_message: params.success,
    })
}

// GET /admin/add-borrowed-book
pub async fn show_add_borrowed_form() -> AppResult<Response> {
    render(&BorrowFormPage::empty())
}

// POST /admin/add-borrowed-book
pub async fn handle_add_borrowed(
    State(state): State<AppState>,
    Form(form): Form<BorrowForm>,
) -> AppResult<Redirect> {
    borrow_service::create_borrowed(&state.db_pool, &form).await?;
    Ok(redirect_with("/admin/borrowed-books", "success", "Borrow record added."))
}

// GET /admin/edit-borrowed-book/{id}
pub async fn show_edit_borrowed_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let record = borrow_service::find_borrowed_by_id(&state.db_pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    render(&BorrowFormPage::for_record(record))
}

// POST /admin/edit-borrowed-book/{id}
pub async fn handle_edit_borrowed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<BorrowForm>,
) -> AppResult<Redirect> {
    borrow_service::update_borrowed(&state.db_pool, &id, &form).await?;
    Ok(redirect_with("/admin/borrowed-books", "success", "Borrow record updated."))
}

// GET /admin/delete-borrowed-book/{id}
pub async fn handle_delete_borrowed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    borrow_service::delete_borrowed(&state.db_pool, &id).await?;
    Ok(redirect_with("/admin/borrowed-books", "success", "Borrow record deleted."))
}

// --- Tickets de suporte ---

// GET /admin/tickets
pub async fn tickets_handler(
    State(state): State<AppState>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    let tickets = ticket_service::find_all_tickets(&state.db_pool).await?;
    render(&AdminTicketsPage {
        tickets,
        success_message: params.success,
        error_message: params.error,
    })
}

// POST /admin/tickets/{id}/resolve
pub async fn handle_resolve_ticket(
    State(state): State<AppState>,
    Extension(admin): Extension<SessionPrincipal>,
    Path(ticket_id): Path<String>,
    Form(form): Form<ResolveTicketForm>,
) -> AppResult<Response> {
    tracing::info!("POST /admin/tickets/{}/resolve por {}", ticket_id, admin.user_id);

    if form.resolution.trim().is_empty() {
        return Ok(redirect_with("/admin/tickets", "error", "A resolution is required.").into_response());
    }

    let Some(ticket) = ticket_service::find_ticket_by_id(&state.db_pool, &ticket_id).await? else {
        tracing::warn!("Ticket '{}' não encontrado.", ticket_id);
        return Ok(redirect_with("/admin/tickets", "error", "Ticket not found.").into_response());
    };
    // Sem guarda de estado: um ticket resolvido pode ser resolvido de novo
    if ticket.is_resolved() {
        tracing::info!("Ticket '{}' já estava resolvido; substituindo a resolução.", ticket.id);
    }

    ticket_service::resolve_ticket(&state.db_pool, &ticket.id, &form.resolution, Utc::now()).await?;
    Ok(redirect_with("/admin/tickets", "success", "Ticket resolved.").into_response())
}
