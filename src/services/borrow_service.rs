// src/services/borrow_service.rs
use crate::{
    error::{AppError, AppResult},
    models::borrow::{BorrowForm, BorrowRecord},
};
use sqlx::SqlitePool;
use uuid::Uuid;

const BORROW_COLUMNS: &str =
    "SELECT id, student_name, student_id, year, book_title, borrow_date, status FROM borrowed_books";

pub async fn find_all_borrowed(db_pool: &SqlitePool) -> AppResult<Vec<BorrowRecord>> {
    let records = sqlx::query_as::<_, BorrowRecord>(&format!("{BORROW_COLUMNS} ORDER BY rowid ASC"))
        .fetch_all(db_pool)
        .await?;
    tracing::debug!("Encontrados {} empréstimos.", records.len());
    Ok(records)
}

pub async fn find_borrowed_by_id(db_pool: &SqlitePool, id: &str) -> AppResult<Option<BorrowRecord>> {
    let record = sqlx::query_as::<_, BorrowRecord>(&format!("{BORROW_COLUMNS} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?;
    Ok(record)
}

pub async fn create_borrowed(db_pool: &SqlitePool, form: &BorrowForm) -> AppResult<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO borrowed_books (id, student_name, student_id, year, book_title, borrow_date, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&id)
    .bind(form.student_name.trim())
    .bind(form.student_id.trim())
    .bind(form.year.trim())
    .bind(form.book_title.trim())
    .bind(form.borrow_date.trim())
    .bind(form.status_or_default())
    .execute(db_pool)
    .await?;
    tracing::info!("📖 Empréstimo de '{}' registado para {}", form.book_title, form.student_id);
    Ok(id)
}

pub async fn update_borrowed(db_pool: &SqlitePool, id: &str, form: &BorrowForm) -> AppResult<()> {
    let rows_affected = sqlx::query(
        r#"
        UPDATE borrowed_books
        SET student_name = ?1, student_id = ?2, year = ?3, book_title = ?4, borrow_date = ?5, status = ?6
        WHERE id = ?7
        "#,
    )
    .bind(form.student_name.trim())
    .bind(form.student_id.trim())
    .bind(form.year.trim())
    .bind(form.book_title.trim())
    .bind(form.borrow_date.trim())
    .bind(form.status_or_default())
    .bind(id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Falha ao atualizar empréstimo: '{}' não encontrado.", id);
        return Err(AppError::NotFound);
    }
    tracing::info!("✅ Empréstimo '{}' atualizado.", id);
    Ok(())
}

/// Apaga um empréstimo. Um ID inexistente não é erro.
pub async fn delete_borrowed(db_pool: &SqlitePool, id: &str) -> AppResult<()> {
    let rows_affected = sqlx::query("DELETE FROM borrowed_books WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        tracing::warn!("Empréstimo '{}' já não existia.", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    fn form(status: &str) -> BorrowForm {
        BorrowForm {
            student_name: "Grace Hopper".into(),
            student_id: "S-042".into(),
            year: "2".into(),
            book_title: "Compilers".into(),
            borrow_date: "2026-10-01".into(),
            status: status.into(),
        }
    }

    #[tokio::test]
    async fn blank_status_defaults_to_borrowed() {
        let pool = memory_pool().await;
        let id = create_borrowed(&pool, &form("")).await.unwrap();
        let record = find_borrowed_by_id(&pool, &id).await.unwrap().unwrap();
        assert_eq!(record.status, "borrowed");
        assert_eq!(record.student_id, "S-042");
    }

    #[tokio::test]
    async fn edit_then_delete_record() {
        let pool = memory_pool().await;
        let id = create_borrowed(&pool, &form("borrowed")).await.unwrap();

        update_borrowed(&pool, &id, &form("returned")).await.unwrap();
        let all = find_all_borrowed(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, "returned");

        delete_borrowed(&pool, &id).await.unwrap();
        assert!(find_all_borrowed(&pool).await.unwrap().is_empty());
        assert!(matches!(
            update_borrowed(&pool, &id, &form("returned")).await,
            Err(AppError::NotFound)
        ));
    }
}
