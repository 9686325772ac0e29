// src/services/catalog_service.rs
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookForm, CategoryCount},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

/// Campos de `books` que podem entrar num filtro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Category,
}

impl BookField {
    fn column(&self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Category => "type",
        }
    }

    /// Coluna com a versão em minúsculas, usada nas pesquisas por substring.
    fn folded_column(&self) -> &'static str {
        match self {
            BookField::Title => "title_folded",
            BookField::Author => "author_folded",
            BookField::Category => "type",
        }
    }
}

/// Minúsculas Unicode; o lower() do SQLite só trata ASCII.
fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Substring em qualquer posição, sem distinguir maiúsculas.
    Contains { field: BookField, needle: String },
    Equals { field: BookField, value: String },
    AnyOf(Vec<Condition>),
}

impl Condition {
    fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            // instr() compara o texto literalmente: '%' ou '.' na pesquisa não são curingas
            Condition::Contains { field, needle } => {
                qb.push("instr(")
                    .push(field.folded_column())
                    .push(", ")
                    .push_bind(fold_case(needle))
                    .push(") > 0");
            }
            Condition::Equals { field, value } => {
                qb.push(field.column()).push(" = ").push_bind(value.clone());
            }
            Condition::AnyOf(conditions) => {
                qb.push("(");
                for (i, condition) in conditions.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    condition.push_sql(qb);
                }
                qb.push(")");
            }
        }
    }
}

/// Predicado sobre livros: todas as condições têm de valer (AND).
/// Sem condições, corresponde a todos os livros.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    conditions: Vec<Condition>,
}

impl BookFilter {
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches_everything(&self) -> bool {
        self.conditions.is_empty()
    }

    fn with_category(mut self, category: &str) -> Self {
        let category = category.trim();
        if !category.is_empty() {
            self.conditions.push(Condition::Equals {
                field: BookField::Category,
                value: category.to_string(),
            });
        }
        self
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if self.conditions.is_empty() {
            return;
        }
        qb.push(" WHERE ");
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                qb.push(" AND ");
            }
            condition.push_sql(qb);
        }
    }
}

/// Filtro da vista de admin: texto procura no título OU no autor.
pub fn build_admin_filter(query: &str, category: &str) -> BookFilter {
    let mut filter = BookFilter::default();
    let query = query.trim();
    if !query.is_empty() {
        filter.conditions.push(Condition::AnyOf(vec![
            Condition::Contains {
                field: BookField::Title,
                needle: query.to_string(),
            },
            Condition::Contains {
                field: BookField::Author,
                needle: query.to_string(),
            },
        ]));
    }
    filter.with_category(category)
}

/// Filtro da vista do utilizador: texto procura apenas no título.
pub fn build_user_filter(query: &str, category: &str) -> BookFilter {
    let mut filter = BookFilter::default();
    let query = query.trim();
    if !query.is_empty() {
        filter.conditions.push(Condition::Contains {
            field: BookField::Title,
            needle: query.to_string(),
        });
    }
    filter.with_category(category)
}

const BOOK_COLUMNS: &str = "SELECT id, title, author, type, price, image FROM books";

/// Livros que satisfazem o filtro, pela ordem de inserção.
pub async fn find_books(db_pool: &SqlitePool, filter: &BookFilter) -> AppResult<Vec<Book>> {
    let mut qb = QueryBuilder::<Sqlite>::new(BOOK_COLUMNS);
    if filter.matches_everything() {
        tracing::debug!("Pesquisa de livros sem filtro.");
    } else {
        filter.push_where(&mut qb);
        tracing::debug!("Pesquisa de livros com {} condição(ões).", filter.conditions().len());
    }
    qb.push(" ORDER BY rowid ASC");

    let books = qb.build_query_as::<Book>().fetch_all(db_pool).await?;
    tracing::debug!("Encontrados {} livros.", books.len());
    Ok(books)
}

/// Categorias distintas, pela ordem devolvida pela base de dados.
pub async fn list_categories(db_pool: &SqlitePool) -> AppResult<Vec<String>> {
    let categories = sqlx::query_scalar::<_, String>("SELECT DISTINCT type FROM books")
        .fetch_all(db_pool)
        .await?;
    Ok(categories)
}

/// Contagem de livros por categoria, ordenada pelo nome da categoria.
pub async fn category_counts(db_pool: &SqlitePool) -> AppResult<Vec<CategoryCount>> {
    let counts = sqlx::query_as::<_, CategoryCount>(
        "SELECT type, COUNT(*) AS count FROM books GROUP BY type ORDER BY type ASC",
    )
    .fetch_all(db_pool)
    .await?;
    Ok(counts)
}

pub async fn find_book_by_id(db_pool: &SqlitePool, book_id: &str) -> AppResult<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(&format!("{BOOK_COLUMNS} WHERE id = ?1"))
        .bind(book_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(book)
}

pub async fn create_book(db_pool: &SqlitePool, form: &BookForm) -> AppResult<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO books (id, title, author, type, price, image, title_folded, author_folded)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&id)
    .bind(form.title.trim())
    .bind(form.author.trim())
    .bind(form.category.trim())
    .bind(form.price)
    .bind(form.image.trim())
    .bind(fold_case(form.title.trim()))
    .bind(fold_case(form.author.trim()))
    .execute(db_pool)
    .await?;
    tracing::info!("📚 Livro '{}' adicionado ({})", form.title, id);
    Ok(id)
}

pub async fn update_book(db_pool: &SqlitePool, book_id: &str, form: &BookForm) -> AppResult<()> {
    let rows_affected = sqlx::query(
        r#"
        UPDATE books
        SET title = ?1, author = ?2, type = ?3, price = ?4, image = ?5,
            title_folded = ?6, author_folded = ?7
        WHERE id = ?8
        "#,
    )
    .bind(form.title.trim())
    .bind(form.author.trim())
    .bind(form.category.trim())
    .bind(form.price)
    .bind(form.image.trim())
    .bind(fold_case(form.title.trim()))
    .bind(fold_case(form.author.trim()))
    .bind(book_id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Falha ao atualizar livro: '{}' não encontrado.", book_id);
        return Err(AppError::NotFound);
    }
    tracing::info!("✅ Livro '{}' atualizado.", book_id);
    Ok(())
}

/// Apaga um livro. Um ID inexistente não é erro.
pub async fn delete_book(db_pool: &SqlitePool, book_id: &str) -> AppResult<()> {
    let rows_affected = sqlx::query("DELETE FROM books WHERE id = ?1")
        .bind(book_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        tracing::warn!("Livro '{}' já não existia.", book_id);
    } else {
        tracing::info!("🗑️ Livro '{}' apagado.", book_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    fn book(title: &str, author: &str, category: &str) -> BookForm {
        BookForm {
            title: title.into(),
            author: author.into(),
            category: category.into(),
            price: 9.5,
            image: String::new(),
        }
    }

    async fn seeded_pool() -> SqlitePool {
        let pool = memory_pool().await;
        for form in [
            book("Steppenwolf", "Hermann Hesse", "Fiction"),
            book("The Waves", "Virginia Woolf", "Fiction"),
            book("Never Cry WOLF", "Farley Mowat", "Nature"),
            book("Pack Hunters", "Wolfgang Schmidt", "Nature"),
            book("100% Rust", "Ferris", "Programming"),
            book("Émile ou de l'éducation", "Jean-Jacques Rousseau", "Essays"),
            book("Football Tactics", "Martin Ødegaard", "Sport"),
        ] {
            create_book(&pool, &form).await.unwrap();
        }
        pool
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn empty_inputs_build_match_all_filters() {
        assert!(build_admin_filter("", "").matches_everything());
        assert!(build_user_filter("  ", "").matches_everything());
    }

    #[test]
    fn admin_filter_ors_title_and_author_then_ands_category() {
        let filter = build_admin_filter("wolf", "Fiction");
        assert_eq!(filter.conditions().len(), 2);
        assert!(matches!(&filter.conditions()[0], Condition::AnyOf(parts) if parts.len() == 2));
        assert_eq!(
            filter.conditions()[1],
            Condition::Equals {
                field: BookField::Category,
                value: "Fiction".into()
            }
        );
    }

    #[test]
    fn user_filter_uses_a_single_title_condition() {
        let filter = build_user_filter("wolf", "");
        assert_eq!(
            filter.conditions(),
            &[Condition::Contains {
                field: BookField::Title,
                needle: "wolf".into()
            }]
        );
    }

    #[tokio::test]
    async fn admin_search_matches_title_or_author_case_insensitively() {
        let pool = seeded_pool().await;
        let found = find_books(&pool, &build_admin_filter("wolf", "")).await.unwrap();
        assert_eq!(
            titles(&found),
            vec!["Steppenwolf", "Never Cry WOLF", "Pack Hunters"]
        );

        // Maiúsculas fora do ASCII também são ignoradas
        let found = find_books(&pool, &build_admin_filter("émile", "")).await.unwrap();
        assert_eq!(titles(&found), vec!["Émile ou de l'éducation"]);
        let found = find_books(&pool, &build_admin_filter("ØDEGAARD", "")).await.unwrap();
        assert_eq!(titles(&found), vec!["Football Tactics"]);
        let found = find_books(&pool, &build_user_filter("ÉDUCATION", "")).await.unwrap();
        assert_eq!(titles(&found), vec!["Émile ou de l'éducation"]);
    }

    #[tokio::test]
    async fn edited_book_is_found_by_its_new_title() {
        let pool = memory_pool().await;
        let id = create_book(&pool, &book("Draft", "Anon", "Misc")).await.unwrap();
        update_book(&pool, &id, &book("Ça", "Stephen King", "Horror")).await.unwrap();

        let found = find_books(&pool, &build_user_filter("ça", "")).await.unwrap();
        assert_eq!(titles(&found), vec!["Ça"]);
        let stale = find_books(&pool, &build_user_filter("draft", "")).await.unwrap();
        assert!(stale.is_empty());
    }

    #[tokio::test]
    async fn user_search_ignores_author_only_matches() {
        let pool = seeded_pool().await;
        let found = find_books(&pool, &build_user_filter("wolf", "")).await.unwrap();
        assert_eq!(titles(&found), vec!["Steppenwolf", "Never Cry WOLF"]);
    }

    #[tokio::test]
    async fn category_only_filter_requires_exact_type() {
        let pool = seeded_pool().await;
        let found = find_books(&pool, &build_admin_filter("", "Fiction")).await.unwrap();
        assert_eq!(titles(&found), vec!["Steppenwolf", "The Waves"]);

        let all = find_books(&pool, &build_admin_filter("", "")).await.unwrap();
        assert_eq!(all.len(), 7);

        let both = find_books(&pool, &build_admin_filter("wolf", "Nature")).await.unwrap();
        assert_eq!(titles(&both), vec!["Never Cry WOLF", "Pack Hunters"]);
    }

    #[tokio::test]
    async fn search_text_is_literal() {
        let pool = seeded_pool().await;
        let found = find_books(&pool, &build_user_filter("100%", "")).await.unwrap();
        assert_eq!(titles(&found), vec!["100% Rust"]);
        let none = find_books(&pool, &build_user_filter("%", "Fiction")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn categories_are_distinct_and_counted_in_order() {
        let pool = seeded_pool().await;
        let mut categories = list_categories(&pool).await.unwrap();
        categories.sort();
        assert_eq!(categories, vec!["Essays", "Fiction", "Nature", "Programming", "Sport"]);

        let counts = category_counts(&pool).await.unwrap();
        let pairs: Vec<(&str, i64)> = counts.iter().map(|c| (c.category.as_str(), c.count)).collect();
        assert_eq!(
            pairs,
            vec![("Essays", 1), ("Fiction", 2), ("Nature", 2), ("Programming", 1), ("Sport", 1)]
        );
    }

    #[tokio::test]
    async fn update_and_delete_book() {
        let pool = memory_pool().await;
        let id = create_book(&pool, &book("Draft", "Anon", "Misc")).await.unwrap();

        update_book(&pool, &id, &book("Final", "Anon", "Essays")).await.unwrap();
        let stored = find_book_by_id(&pool, &id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Final");
        assert_eq!(stored.category, "Essays");

        assert!(matches!(
            update_book(&pool, "missing", &book("x", "y", "z")).await,
            Err(AppError::NotFound)
        ));

        delete_book(&pool, &id).await.unwrap();
        assert!(find_book_by_id(&pool, &id).await.unwrap().is_none());
        // Apagar de novo não falha
        delete_book(&pool, &id).await.unwrap();
    }
}
