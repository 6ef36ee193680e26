use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures_util::StreamExt;
use log::info;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::services::books::{error_response, render_book_form, CatalogError};
use crate::session::state::{require_session, SessionUser, SessionsState};
use common::requests::BookInput;

/// Renders the empty upload form.
pub async fn form(
    sessions: web::Data<SessionsState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    let user = match require_session(&req, &sessions).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    render_book_form(
        "Add Book",
        &format!("/addBook/{}/", path.into_inner()),
        &BookInput::default(),
        &[],
        &user,
    )
}

/// Handles the upload submission. On success the record is persisted with
/// the session identity as its owner and the caller lands back on the
/// catalog home; a validation failure re-renders the form with the
/// submitted values and discards the already-streamed file.
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
    let user_id = path.into_inner();

    let input = match read_book_form(payload, &config).await {
        Ok(input) => input,
        Err(e) => return error_response(e),
    };

    match save_book(&config.db_path, &user, &input) {
        Ok(book_id) => {
            info!("Book {} added by user {}", book_id, user.user_id);
            HttpResponse::Found()
                .insert_header((header::LOCATION, "/"))
                .finish()
        }
        Err(CatalogError::Validation(errors)) => {
            discard_upload(&config, &input);
            render_book_form(
                "Add Book",
                &format!("/addBook/{}/", user_id),
                &input,
                &errors,
                &user,
            )
        }
        Err(e) => error_response(e),
    }
}

/// Collects the book form from a multipart body. Text parts fill the
/// input fields; the `document` part is streamed to the media directory
/// under a random prefix and recorded as a media-relative path. A missing
/// or nameless file part leaves `document` unset for validation to
/// reject.
pub(crate) async fn read_book_form(
    mut payload: Multipart,
    config: &AppConfig,
) -> Result<BookInput, CatalogError> {
    let mut input = BookInput::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| CatalogError::Upload(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("document") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                if filename.is_empty() {
                    // drain the part so the stream stays consistent
                    while let Some(chunk) = field.next().await {
                        chunk.map_err(|e| CatalogError::Upload(e.to_string()))?;
                    }
                    continue;
                }

                let stored_name = format!("{}_{}", Uuid::new_v4(), base_name(&filename));
                let target = config.pdfs_dir().join(&stored_name);
                let mut writer = BufWriter::new(File::create(&target)?);
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| CatalogError::Upload(e.to_string()))?;
                    writer.write_all(&chunk)?;
                }
                writer.flush()?;

                input.document = Some(format!("pdfs/{}", stored_name));
            }
            Some(text_field @ ("title" | "summary" | "pages" | "category")) => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| CatalogError::Upload(e.to_string()))?;
                    bytes.extend_from_slice(&chunk);
                }
                let value = String::from_utf8(bytes)
                    .map_err(|_| CatalogError::Upload("Form field is not valid UTF-8".into()))?;
                match text_field {
                    "title" => input.title = value,
                    "summary" => input.summary = value,
                    "pages" => input.pages = value,
                    _ => input.category = value,
                }
            }
            _ => {}
        }
    }

    Ok(input)
}

/// Strips any client-supplied directory components from an uploaded
/// filename.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

/// Removes a streamed upload again after its form failed validation, so
/// a rejected submission leaves nothing behind.
pub(crate) fn discard_upload(config: &AppConfig, input: &BookInput) {
    if let Some(relative) = &input.document {
        let _ = std::fs::remove_file(config.media_dir.join(relative));
    }
}

/// Validates the input and persists a new record owned by `actor`. The
/// stored `author`/`author_id` always come from the acting session, never
/// from anything the client submitted.
pub fn save_book(db: &Path, actor: &SessionUser, input: &BookInput) -> Result<i64, CatalogError> {
    input.validate().map_err(CatalogError::Validation)?;
    let document = input.document.as_deref().unwrap_or_default();

    let conn = Connection::open(db)?;
    conn.execute(
        "INSERT INTO books (title, summary, pages, document, author, author_id, category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            input.title,
            input.summary,
            input.pages,
            document,
            actor.full_name(),
            actor.user_id,
            input.category,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::books::test_support::{ann, test_config};
    use crate::services::books::get_book;

    fn filled() -> BookInput {
        BookInput {
            title: "T".to_string(),
            summary: "S".to_string(),
            pages: "10".to_string(),
            document: Some("pdfs/t.pdf".to_string()),
            category: "Fiction".to_string(),
        }
    }

    #[test]
    fn save_book_owns_the_record_by_the_acting_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);

        let id = save_book(&config.db_path, &ann(), &filled()).unwrap();
        let book = get_book(&config.db_path, id).unwrap();
        assert_eq!(book.title, "T");
        assert_eq!(book.author, "Ann Lee");
        assert_eq!(book.author_id, 7);
    }

    #[test]
    fn invalid_input_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);

        let mut input = filled();
        input.title.clear();
        input.document = None;
        let errors = match save_book(&config.db_path, &ann(), &input) {
            Err(CatalogError::Validation(errors)) => errors,
            other => panic!("expected validation failure, got {:?}", other),
        };
        assert!(errors.iter().any(|e| e.field == "title"));
        assert!(errors.iter().any(|e| e.field == "document"));

        let conn = Connection::open(&config.db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn discard_upload_removes_the_streamed_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);

        let target = config.pdfs_dir().join("x_test.pdf");
        std::fs::write(&target, b"content").unwrap();
        let input = BookInput {
            document: Some("pdfs/x_test.pdf".to_string()),
            ..BookInput::default()
        };

        discard_upload(&config, &input);
        assert!(!target.exists());
    }

    #[test]
    fn base_name_strips_directories() {
        assert_eq!(base_name("book.pdf"), "book.pdf");
        assert_eq!(base_name("../../etc/book.pdf"), "book.pdf");
        assert_eq!(base_name("c:\\files\\book.pdf"), "book.pdf");
    }
}
