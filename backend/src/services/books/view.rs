use std::collections::HashMap;
use std::path::Path;

use actix_web::{web, HttpRequest, Responder};

use crate::config::AppConfig;
use crate::pages;
use crate::services::books::{error_response, get_book, CatalogError};
use crate::session::state::{current_user, SessionsState};
use common::model::book::Book;

/// Renders the public detail page for one record.
pub async fn process(
    config: web::Data<AppConfig>,
    sessions: web::Data<SessionsState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    let user = current_user(&req, &sessions).await;

    let book = match render_detail(&config.db_path, path.into_inner()) {
        Ok(book) => book,
        Err(e) => return error_response(e),
    };

    let mut vars = HashMap::new();
    vars.insert("nav", pages::nav_links(user.as_ref()));
    vars.insert("title", pages::escape(&book.title));
    // already display-ready, including the <br/> tags
    vars.insert("summary", book.summary.clone());
    vars.insert("pages", pages::escape(&book.pages));
    vars.insert("author", pages::escape(&book.author));
    vars.insert("category", pages::escape(&book.category));
    vars.insert("document_url", format!("/media/{}", book.document));
    pages::page("view_book.html", &vars)
}

/// Fetches the record and produces a display-ready copy: the summary is
/// HTML-escaped and every line feed becomes a `<br/>` tag. The stored row
/// is not mutated.
pub fn render_detail(db: &Path, id: i64) -> Result<Book, CatalogError> {
    let mut book = get_book(db, id)?;
    book.summary = pages::escape(&book.summary).replace('\n', "<br/>");
    Ok(book)
}
