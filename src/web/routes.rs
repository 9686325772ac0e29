// src/web/routes.rs
use crate::{
    state::AppState,
    web::{admin_handlers, auth_handlers, mw_auth, user_handlers},
};
use axum::{
    middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/", get(|| async { Redirect::to("/user/books") }))
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route(
            "/admin/login",
            get(auth_handlers::show_admin_login_form).post(auth_handlers::handle_admin_login),
        )
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/signup", get(auth_handlers::show_signup_form).post(auth_handlers::handle_signup))
        .route(
            "/forgot-password",
            get(auth_handlers::show_forgot_password_form).post(auth_handlers::handle_forgot_password),
        )
        .route(
            "/reset-password/{token}",
            get(auth_handlers::show_reset_password_form).post(auth_handlers::handle_reset_password),
        )
        .route("/user/books", get(user_handlers::user_books_handler));

    // --- Rotas de Admin --- (exigem sessão com role admin)
    let admin_routes = Router::new()
        .route("/", get(|| async { Redirect::to("/admin/books") }))
        .route("/books", get(admin_handlers::admin_books_handler))
        .route(
            "/add-book",
            get(admin_handlers::show_add_book_form).post(admin_handlers::handle_add_book),
        )
        .route(
            "/edit-book/{id}",
            get(admin_handlers::show_edit_book_form).post(admin_handlers::handle_edit_book),
        )
        .route("/delete-book/{id}", get(admin_handlers::handle_delete_book))
        .route("/categories", get(admin_handlers::categories_handler))
        .route("/borrowed-books", get(admin_handlers::borrowed_books_handler))
        .route(
            "/add-borrowed-book",
            get(admin_handlers::show_add_borrowed_form).post(admin_handlers::handle_add_borrowed),
        )
        .route(
            "/edit-borrowed-book/{id}",
            get(admin_handlers::show_edit_borrowed_form).post(admin_handlers::handle_edit_borrowed),
        )
        .route("/delete-borrowed-book/{id}", get(admin_handlers::handle_delete_borrowed))
        .route("/tickets", get(admin_handlers::tickets_handler))
        .route("/tickets/{id}/resolve", post(admin_handlers::handle_resolve_ticket))
        .route_layer(middleware::from_fn(mw_auth::require_admin));

    // --- Rotas do utilizador --- (exigem sessão com role user)
    let user_routes = Router::new()
        .route("/dashboard", get(user_handlers::dashboard_handler))
        .route(
            "/support",
            get(user_handlers::support_page_handler).post(user_handlers::handle_new_ticket),
        )
        .route_layer(middleware::from_fn(mw_auth::require_user));

    // --- Router Final ---
    Router::new()
        .merge(public_routes)
        .nest("/admin", admin_routes)
        .nest("/user", user_routes)
        .with_state(app_state)
}
