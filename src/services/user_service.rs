// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult, ValidationError},
    models::user::{Role, User},
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, full_name, email, mobile, password_hash, role, created_at";

/// Busca o utilizador com este email E esta role.
/// A role faz parte do predicado: uma conta com outra role conta como inexistente.
pub async fn find_user_by_email_and_role(
    db_pool: &SqlitePool,
    email: &str,
    role: Role,
) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por email '{}' com role '{}'", email, role);
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?1 AND role = ?2 LIMIT 1"
    ))
    .bind(email)
    .bind(role.as_str())
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?1 LIMIT 1"
    ))
    .bind(email)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por ID: {}", user_id);
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
    ))
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

/// Verifica duplicados com um único predicado OR (email ou telemóvel).
pub async fn email_or_mobile_taken(
    db_pool: &SqlitePool,
    email: &str,
    mobile: &str,
) -> AppResult<bool> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT id FROM users WHERE email = ?1 OR mobile = ?2 LIMIT 1")
            .bind(email)
            .bind(mobile)
            .fetch_optional(db_pool)
            .await?;
    Ok(found.is_some())
}

/// Insere um utilizador já com o hash calculado. Devolve o novo ID.
pub async fn insert_user(
    db_pool: &SqlitePool,
    full_name: &str,
    email: &str,
    mobile: &str,
    password_hash: &str,
    role: Role,
    created_at: DateTime<Utc>,
) -> AppResult<String> {
    let id = Uuid::new_v4().to_string();
    tracing::info!("Criando utilizador '{}' ({})", email, role);

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, full_name, email, mobile, password_hash, role, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&id)
    .bind(full_name)
    .bind(email)
    .bind(mobile)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(created_at)
    .execute(db_pool)
    .await;

    // Corrida entre a verificação OR e o INSERT: a constraint UNIQUE decide
    if let Err(sqlx::Error::Database(db_err)) = &result {
        if db_err.is_unique_violation() {
            tracing::warn!("Falha ao criar user: email ou telemóvel '{}' já existe.", email);
            return Err(ValidationError::Duplicate.into());
        }
    }
    result?;

    tracing::info!("✅ Utilizador '{}' criado com ID {}.", email, id);
    Ok(id)
}

/// Substitui o hash da senha do utilizador com este email.
pub async fn update_password_hash_by_email(
    db_pool: &SqlitePool,
    email: &str,
    new_password_hash: &str,
) -> AppResult<()> {
    let rows_affected = sqlx::query("UPDATE users SET password_hash = ?1 WHERE email = ?2")
        .bind(new_password_hash)
        .bind(email)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Falha ao alterar senha: utilizador '{}' não encontrado.", email);
        Err(AppError::NotFound)
    } else {
        tracing::info!("✅ Senha alterada com sucesso para: {}", email);
        Ok(())
    }
}
