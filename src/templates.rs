// src/templates.rs
use crate::models::{
    book::{Book, CategoryCount},
    borrow::BorrowRecord,
    ticket::{SupportTicket, TicketWithOwner},
};
use askama::Template; // Trait necessário para Askama

// Login do utilizador e do admin partilham o mesmo template
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub heading: &'static str,
    pub action: &'static str,
    pub is_admin_surface: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    pub error: Option<String>,
    // Valores a repor no formulário depois de um erro (nunca as senhas)
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub role: String,
}

#[derive(Template)]
#[template(path = "forgot_password.html")]
pub struct ForgotPasswordPage {
    pub message: Option<String>,
}

#[derive(Template)]
#[template(path = "reset_password.html")]
pub struct ResetPasswordPage {
    pub token: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "user_dashboard.html")]
pub struct UserDashboardPage {
    pub user_name: String,
    pub open_tickets: usize,
    pub total_tickets: usize,
}

/// Opção do <select> de categorias.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryOption {
    pub name: String,
    pub selected: bool,
}

pub fn category_options(categories: Vec<String>, selected: &str) -> Vec<CategoryOption> {
    categories
        .into_iter()
        .map(|name| CategoryOption {
            selected: name == selected,
            name,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "user_books.html")]
pub struct UserBooksPage {
    pub books: Vec<Book>,
    pub categories: Vec<CategoryOption>,
    pub query: String,
    pub logged_in: bool,
}

#[derive(Template)]
#[template(path = "support.html")]
pub struct SupportPage {
    pub tickets: Vec<SupportTicket>,
    pub issue_types: &'static [&'static str],
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_books.html")]
pub struct AdminBooksPage {
    pub books: Vec<Book>,
    pub categories: Vec<CategoryOption>,
    pub query: String,
    pub success_message: Option<String>,
}

/// Formulário partilhado por "adicionar" e "editar" livro.
#[derive(Template)]
#[template(path = "book_form.html")]
pub struct BookFormPage {
    pub heading: &'static str,
    pub action: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: String,
    pub image: String,
}

impl BookFormPage {
    pub fn empty() -> Self {
        Self {
            heading: "Add book",
            action: "/admin/add-book".to_string(),
            title: String::new(),
            author: String::new(),
            category: String::new(),
            price: String::new(),
            image: String::new(),
        }
    }

    pub fn for_book(book: Book) -> Self {
        Self {
            heading: "Edit book",
            action: format!("/admin/edit-book/{}", book.id),
            title: book.title,
            author: book.author,
            category: book.category,
            price: book.price.to_string(),
            image: book.image,
        }
    }
}

#[derive(Template)]
#[template(path = "borrowed_books.html")]
pub struct BorrowedBooksPage {
    pub records: Vec<BorrowRecord>,
    pub success_message: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusOption {
    pub value: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "borrow_form.html")]
pub struct BorrowFormPage {
    pub heading: &'static str,
    pub action: String,
    pub student_name: String,
    pub student_id: String,
    pub year: String,
    pub book_title: String,
    pub borrow_date: String,
    pub statuses: Vec<StatusOption>,
}

impl BorrowFormPage {
    fn status_options(current: &str) -> Vec<StatusOption> {
        crate::models::borrow::BORROW_STATUSES
            .iter()
            .map(|&value| StatusOption {
                value,
                selected: value.eq_ignore_ascii_case(current),
            })
            .collect()
    }

    pub fn empty() -> Self {
        Self {
            heading: "Add borrowed book",
            action: "/admin/add-borrowed-book".to_string(),
            student_name: String::new(),
            student_id: String::new(),
            year: String::new(),
            book_title: String::new(),
            borrow_date: String::new(),
            statuses: Self::status_options(crate::models::borrow::DEFAULT_BORROW_STATUS),
        }
    }

    pub fn for_record(record: BorrowRecord) -> Self {
        Self {
            heading: "Edit borrowed book",
            action: format!("/admin/edit-borrowed-book/{}", record.id),
            statuses: Self::status_options(&record.status),
            student_name: record.student_name,
            student_id: record.student_id,
            year: record.year,
            book_title: record.book_title,
            borrow_date: record.borrow_date,
        }
    }
}

#[derive(Template)]
#[template(path = "categories.html")]
pub struct CategoriesPage {
    pub categories: Vec<CategoryCount>,
}

#[derive(Template)]
#[template(path = "admin_tickets.html")]
pub struct AdminTicketsPage {
    pub tickets: Vec<TicketWithOwner>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}
