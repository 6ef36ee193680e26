use std::path::Path;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::info;
use rusqlite::{params, Connection};

use crate::config::AppConfig;
use crate::services::books::{error_response, CatalogError};
use crate::session::state::{require_session, SessionsState};

/// Removes the record and returns the caller to the catalog home. The
/// removal is unconditional and irreversible for any logged-in caller.
pub async fn process(
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

    match delete_book(&config.db_path, book_id) {
        Ok(()) => {
            info!("Book {} deleted by user {}", book_id, user.user_id);
            HttpResponse::Found()
                .insert_header((header::LOCATION, "/"))
                .finish()
        }
        Err(e) => error_response(e),
    }
}

/// Deletes the record, failing with `NotFound` if the id is unknown. The
/// uploaded document file stays in the media directory.
pub fn delete_book(db: &Path, id: i64) -> Result<(), CatalogError> {
    let conn = Connection::open(db)?;
    let removed = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;

    if removed == 0 {
        return Err(CatalogError::NotFound(id));
    }
    Ok(())
}
