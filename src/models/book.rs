// src/models/book.rs
use serde::Deserialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    // 'type' é palavra reservada em Rust; a coluna mantém o nome original
    #[sqlx(rename = "type")]
    pub category: String,
    pub price: f64,
    pub image: String,
}

/// Resultado da agregação {type, count} da página de categorias.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CategoryCount {
    #[sqlx(rename = "type")]
    pub category: String,
    pub count: i64,
}

// Campos do formulário de criação/edição de livro
#[derive(Debug, Clone, Deserialize)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    #[serde(rename = "type")]
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
}

/// Parâmetros de pesquisa (?q=...&category=...)
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
}
