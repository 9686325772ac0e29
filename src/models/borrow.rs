// src/models/borrow.rs
use serde::Deserialize;
use sqlx::FromRow;

pub const DEFAULT_BORROW_STATUS: &str = "borrowed";
pub const BORROW_STATUSES: &[&str] = &["borrowed", "returned", "overdue"];

// Sem integridade referencial: book_title é texto livre
#[derive(Debug, Clone, FromRow)]
pub struct BorrowRecord {
    pub id: String,
    pub student_name: String,
    pub student_id: String,
    pub year: String,
    pub book_title: String,
    pub borrow_date: String, // YYYY-MM-DD
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BorrowForm {
    pub student_name: String,
    pub student_id: String,
    pub year: String,
    pub book_title: String,
    pub borrow_date: String,
    #[serde(default)]
    pub status: String,
}

impl BorrowForm {
    /// Estado a gravar: o do formulário ou "borrowed" se vazio.
    pub fn status_or_default(&self) -> &str {
        let status = self.status.trim();
        if status.is_empty() {
            DEFAULT_BORROW_STATUS
        } else {
            status
        }
    }
}
