// src/services/ticket_service.rs
use crate::{
    error::{AppError, AppResult, ValidationError},
    models::ticket::{SupportTicket, TicketWithOwner, STATUS_OPEN, STATUS_RESOLVED},
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

const TICKET_COLUMNS: &str =
    "t.id, t.user_id, t.issue_type, t.message, t.status, t.resolution, t.created_at, t.resolved_at";

/// Abre um ticket em nome do utilizador autenticado.
pub async fn create_ticket(
    db_pool: &SqlitePool,
    user_id: &str,
    issue_type: &str,
    message: &str,
    now: DateTime<Utc>,
) -> AppResult<String> {
    let issue_type = issue_type.trim();
    let message = message.trim();
    if issue_type.is_empty() || message.is_empty() {
        return Err(ValidationError::MissingFields.into());
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO tickets (id, user_id, issue_type, message, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(issue_type)
    .bind(message)
    .bind(STATUS_OPEN)
    .bind(now)
    .execute(db_pool)
    .await?;
    tracing::info!("🎫 Ticket '{}' aberto por {}", id, user_id);
    Ok(id)
}

/// Tickets de um utilizador, mais recentes primeiro.
pub async fn find_tickets_for_user(db_pool: &SqlitePool, user_id: &str) -> AppResult<Vec<SupportTicket>> {
    let tickets = sqlx::query_as::<_, SupportTicket>(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets t WHERE t.user_id = ?1 ORDER BY t.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;
    Ok(tickets)
}

/// Todos os tickets, abertos primeiro, com o nome do autor se ainda existir.
pub async fn find_all_tickets(db_pool: &SqlitePool) -> AppResult<Vec<TicketWithOwner>> {
    let tickets = sqlx::query_as::<_, TicketWithOwner>(&format!(
        r#"
        SELECT {TICKET_COLUMNS}, u.full_name AS owner_name
        FROM tickets t
        LEFT JOIN users u ON u.id = t.user_id
        ORDER BY (t.status = 'resolved') ASC, t.created_at DESC
        "#
    ))
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Encontrados {} tickets.", tickets.len());
    Ok(tickets)
}

pub async fn find_ticket_by_id(db_pool: &SqlitePool, id: &str) -> AppResult<Option<SupportTicket>> {
    let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets t WHERE t.id = ?1"
    ))
    .bind(id)
    .fetch_optional(db_pool)
    .await?;
    Ok(ticket)
}

/// Marca o ticket como resolvido.
/// Não verifica o estado atual: resolver de novo substitui a resolução e a data.
pub async fn resolve_ticket(
    db_pool: &SqlitePool,
    id: &str,
    resolution: &str,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let rows_affected = sqlx::query(
        "UPDATE tickets SET status = ?1, resolution = ?2, resolved_at = ?3 WHERE id = ?4",
    )
    .bind(STATUS_RESOLVED)
    .bind(resolution.trim())
    .bind(now)
    .bind(id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Falha ao resolver ticket: '{}' não encontrado.", id);
        return Err(AppError::NotFound);
    }
    tracing::info!("✅ Ticket '{}' resolvido.", id);
    Ok(())
}
