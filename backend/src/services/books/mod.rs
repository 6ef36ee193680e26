//! # Book Catalog Service Module
//!
//! CRUD and listing over the book record store. Every handler follows the
//! same shape: a thin Actix `process`/`form` function that resolves the
//! session where required, delegates to an inner `Result`-returning
//! function, and converts the outcome into a page or a redirect.
//!
//! The provided routes are:
//! - `GET /explore/`: the catalog partitioned into the three fixed
//!   category buckets (Education, Fiction, Science). Records with any
//!   other stored category appear in no bucket.
//! - `GET/POST /addBook/{user_id}/`: the upload form and its submission.
//!   The new record's `author`/`author_id` always come from the session
//!   identity, never from the form or the path.
//! - `GET /contri/{user_id}/`: all records owned by the given user id, in
//!   insertion order. Any logged-in caller may supply any id.
//! - `GET/POST /editBook/{book_id}/`: the edit form, pre-filled from the
//!   stored record, and its submission. Ownership fields are never
//!   rewritten.
//! - `GET /deleteBook/{book_id}/`: removes the record unconditionally.
//! - `GET /viewBook/{book_id}/`: the public detail page; summary line
//!   breaks are rendered as `<br/>` tags.
//!
//! Edit and delete require a session but deliberately no ownership match;
//! see DESIGN.md for the reasoning behind that choice.

use std::collections::HashMap;
use std::path::Path;

use actix_web::web::{self, get, post};
use actix_web::HttpResponse;
use rusqlite::{params, Connection, Row};
use thiserror::Error;

use crate::pages;
use crate::session::state::SessionUser;
use common::model::book::Book;
use common::requests::{BookInput, FieldError};

pub mod add;
pub mod contri;
pub mod delete;
pub mod edit;
pub mod explore;
pub mod view;

/// Catalog failures. `NotFound` becomes the generic 404 page and
/// `Validation` re-renders the originating form; both are handled at the
/// route, never propagated.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("book {0} not found")]
    NotFound(i64),

    #[error("invalid book submission")]
    Validation(Vec<FieldError>),

    #[error("upload error: {0}")]
    Upload(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registers all catalog routes on the application.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/explore/", get().to(explore::process))
        .route("/addBook/{user_id}/", get().to(add::form))
        .route("/addBook/{user_id}/", post().to(add::process))
        .route("/contri/{user_id}/", get().to(contri::process))
        .route("/editBook/{book_id}/", get().to(edit::form))
        .route("/editBook/{book_id}/", post().to(edit::process))
        .route("/deleteBook/{book_id}/", get().to(delete::process))
        .route("/viewBook/{book_id}/", get().to(view::process));
}

pub(crate) fn book_from_row(row: &Row) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        pages: row.get(3)?,
        document: row.get(4)?,
        author: row.get(5)?,
        author_id: row.get(6)?,
        category: row.get(7)?,
    })
}

pub(crate) const BOOK_COLUMNS: &str =
    "id, title, summary, pages, document, author, author_id, category";

/// Fetches a single record or fails with `NotFound`.
pub fn get_book(db: &Path, id: i64) -> Result<Book, CatalogError> {
    let conn = Connection::open(db)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM books WHERE id = ?1",
        BOOK_COLUMNS
    ))?;

    match stmt.query_row(params![id], book_from_row) {
        Ok(book) => Ok(book),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(CatalogError::NotFound(id)),
        Err(e) => Err(e.into()),
    }
}

/// Renders the shared add/edit form page with the submitted values
/// pre-filled and per-field error annotations in place.
pub(crate) fn render_book_form(
    heading: &str,
    action: &str,
    input: &BookInput,
    errors: &[FieldError],
    user: &SessionUser,
) -> HttpResponse {
    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("nav", pages::nav_links(Some(user)));
    vars.insert("heading", heading.to_string());
    vars.insert("action", action.to_string());
    vars.insert("title", pages::escape(&input.title));
    vars.insert("summary", pages::escape(&input.summary));
    vars.insert("pages", pages::escape(&input.pages));
    vars.insert("category_options", pages::category_options(&input.category));

    for error in errors {
        // error placeholders are named `<field>_error` in the template
        let slot = match error.field {
            "title" => "title_error",
            "summary" => "summary_error",
            "pages" => "pages_error",
            "document" => "document_error",
            "category" => "category_error",
            _ => continue,
        };
        vars.insert(
            slot,
            format!("<span class=\"field-error\">{}</span>", error.message),
        );
    }

    pages::page("book_form.html", &vars)
}

/// Maps a catalog failure to its response once validation has already
/// been handled by the caller.
pub(crate) fn error_response(err: CatalogError) -> HttpResponse {
    match err {
        CatalogError::NotFound(_) => pages::not_found(),
        other => {
            log::error!("Catalog operation failed: {}", other);
            HttpResponse::InternalServerError().body(format!("Error: {}", other))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::{init_storage, AppConfig};

    pub fn test_config(dir: &tempfile::TempDir) -> AppConfig {
        let config = AppConfig {
            db_path: dir.path().join("test.sqlite"),
            media_dir: dir.path().join("media"),
            bind: "127.0.0.1".to_string(),
            port: 0,
        };
        init_storage(&config).unwrap();
        config
    }

    pub fn ann() -> SessionUser {
        SessionUser {
            user_id: 7,
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
        }
    }

    /// Inserts a row directly, bypassing validation, the way seeded or
    /// legacy data may have entered the store.
    pub fn seed_book(db: &Path, title: &str, category: &str, author_id: i64) -> i64 {
        let conn = Connection::open(db).unwrap();
        conn.execute(
            "INSERT INTO books (title, summary, pages, document, author, author_id, category)
             VALUES (?1, 'Summary', '100', 'pdfs/seed.pdf', 'Seed Author', ?2, ?3)",
            params![title, author_id, category],
        )
        .unwrap();
        conn.last_insert_rowid()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{seed_book, test_config};
    use super::*;

    #[test]
    fn get_book_returns_the_stored_record() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let id = seed_book(&config.db_path, "T", "Fiction", 7);

        let book = get_book(&config.db_path, id).unwrap();
        assert_eq!(book.title, "T");
        assert_eq!(book.author_id, 7);
    }

    #[test]
    fn get_book_on_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);

        assert!(matches!(
            get_book(&config.db_path, 999),
            Err(CatalogError::NotFound(999))
        ));
    }
}
