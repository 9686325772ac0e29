// src/models/ticket.rs
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;

pub const STATUS_OPEN: &str = "open";
pub const STATUS_RESOLVED: &str = "resolved";

pub const ISSUE_TYPES: &[&str] = &["account", "book", "borrowing", "other"];

#[derive(Debug, Clone, FromRow)]
pub struct SupportTicket {
    pub id: String,
    pub user_id: String,
    pub issue_type: String,
    pub message: String,
    pub status: String, // 'open' ou 'resolved'
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SupportTicket {
    pub fn is_resolved(&self) -> bool {
        self.status == STATUS_RESOLVED
    }
}

/// Ticket + nome do autor para a lista do admin.
/// O autor pode já não existir (LEFT JOIN), daí o Option.
#[derive(Debug, Clone, FromRow)]
pub struct TicketWithOwner {
    #[sqlx(flatten)]
    pub ticket: SupportTicket,
    pub owner_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTicketForm {
    #[serde(default)]
    pub issue_type: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveTicketForm {
    #[serde(default)]
    pub resolution: String,
}
