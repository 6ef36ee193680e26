use std::path::Path;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::info;
use rusqlite::{params, Connection};

use crate::config::AppConfig;
use crate::services::books::add::{discard_upload, read_book_form};
use crate::services::books::{error_response, get_book, render_book_form, CatalogError};
use crate::session::state::{require_session, SessionsState};
use common::requests::BookInput;

/// Renders the edit form pre-filled from the stored record.
pub async fn form(
    config: web::Data<AppConfig>,
    sessions: web::Data<SessionsState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    let user = match require_session(&req, &sessions).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let book_id = path.into_inner();

    let book = match get_book(&config.db_path, book_id) {
        Ok(book) => book,
        Err(e) => return error_response(e),
    };

    let input = BookInput {
        title: book.title,
        summary: book.summary,
        pages: book.pages,
        document: Some(book.document),
        category: book.category,
    };
    render_book_form(
        "Edit Book",
        &format!("/editBook/{}/", book_id),
        &input,
        &[],
        &user,
    )
}

/// Handles the edit submission. The same validation as create applies, a
/// replacement document included; ownership fields are never rewritten.
/// Success returns the caller to their own contribution list.
pub async fn process(
    config: web::Data<AppConfig>,
    sessions: web::Data<SessionsState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> impl Responder {
    let user = match require_session(&req, &sessions).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let book_id = path.into_inner();

    if let Err(e) = get_book(&config.db_path, book_id) {
        return error_response(e);
    }

    let input = match read_book_form(payload, &config).await {
        Ok(input) => input,
        Err(e) => return error_response(e),
    };

    match update_book(&config.db_path, book_id, &input) {
        Ok(()) => {
            info!("Book {} updated by user {}", book_id, user.user_id);
            // navigate to the acting session's list, not the record owner's
            HttpResponse::Found()
                .insert_header((header::LOCATION, format!("/contri/{}/", user.user_id)))
                .finish()
        }
        Err(CatalogError::Validation(errors)) => {
            discard_upload(&config, &input);
            render_book_form(
                "Edit Book",
                &format!("/editBook/{}/", book_id),
                &input,
                &errors,
                &user,
            )
        }
        Err(e) => error_response(e),
    }
}

/// Validates the input and rewrites every field of the record except
/// `author` and `author_id`, which stay as they were set at creation.
pub fn update_book(db: &Path, id: i64, input: &BookInput) -> Result<(), CatalogError> {
    input.validate().map_err(CatalogError::Validation)?;
    let document = input.document.as_deref().unwrap_or_default();

    let conn = Connection::open(db)?;
    let changed = conn.execute(
        "UPDATE books SET title = ?1, summary = ?2, pages = ?3, document = ?4, category = ?5
         WHERE id = ?6",
        params![
            input.title,
            input.summary,
            input.pages,
            document,
            input.category,
            id,
        ],
    )?;

    if changed == 0 {
        return Err(CatalogError::NotFound(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::books::test_support::{seed_book, test_config};

    fn replacement() -> BookInput {
        BookInput {
            title: "New title".to_string(),
            summary: "New summary".to_string(),
            pages: "500".to_string(),
            document: Some("pdfs/new.pdf".to_string()),
            category: "Science".to_string(),
        }
    }

    #[test]
    fn update_rewrites_fields_but_never_ownership() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let id = seed_book(&config.db_path, "Old title", "Fiction", 7);

        update_book(&config.db_path, id, &replacement()).unwrap();

        let book = get_book(&config.db_path, id).unwrap();
        assert_eq!(book.title, "New title");
        assert_eq!(book.category, "Science");
        assert_eq!(book.document, "pdfs/new.pdf");
        // ownership is immutable post-creation
        assert_eq!(book.author, "Seed Author");
        assert_eq!(book.author_id, 7);
    }

    #[test]
    fn update_of_a_missing_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);

        assert!(matches!(
            update_book(&config.db_path, 42, &replacement()),
            Err(CatalogError::NotFound(42))
        ));
    }

    #[test]
    fn invalid_input_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let id = seed_book(&config.db_path, "Old title", "Fiction", 7);

        let mut input = replacement();
        input.summary.clear();
        assert!(matches!(
            update_book(&config.db_path, id, &input),
            Err(CatalogError::Validation(_))
        ));

        let book = get_book(&config.db_path, id).unwrap();
        assert_eq!(book.title, "Old title");
    }
}
