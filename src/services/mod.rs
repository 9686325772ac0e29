// src/services/mod.rs
pub mod auth_service;
pub mod borrow_service;
pub mod catalog_service;
pub mod notifier;
pub mod ticket_service;
pub mod user_service;
