// src/models/mod.rs
pub mod book;
pub mod borrow;
pub mod ticket;
pub mod user;
