use std::collections::HashMap;
use std::path::Path;

use actix_web::{web, HttpRequest, Responder};
use rusqlite::{params, Connection};

use crate::config::AppConfig;
use crate::pages;
use crate::services::books::{book_from_row, error_response, CatalogError, BOOK_COLUMNS};
use crate::session::state::{require_session, SessionsState};
use common::model::book::Book;

/// Renders the contribution list for the user id in the path. Requires a
/// session, but any logged-in caller may view any owner's list.
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
    let owner_id = path.into_inner();

    let books = match list_by_owner(&config.db_path, owner_id) {
        Ok(books) => books,
        Err(e) => return error_response(e),
    };

    let mut vars = HashMap::new();
    vars.insert("nav", pages::nav_links(Some(&user)));
    vars.insert("books", contribution_rows(&books));
    pages::page("contri.html", &vars)
}

/// All records owned by `owner_id`, in insertion order.
pub fn list_by_owner(db: &Path, owner_id: i64) -> Result<Vec<Book>, CatalogError> {
    let conn = Connection::open(db)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM books WHERE author_id = ?1",
        BOOK_COLUMNS
    ))?;
    let books = stmt
        .query_map(params![owner_id], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}

fn contribution_rows(books: &[Book]) -> String {
    if books.is_empty() {
        return "<p class=\"empty\">No contributions yet.</p>".to_string();
    }

    let mut out = String::new();
    for book in books {
        let mut vars = HashMap::new();
        vars.insert("id", book.id.to_string());
        vars.insert("title", pages::escape(&book.title));
        vars.insert("category", pages::escape(&book.category));
        if let Ok(row) = pages::render_template("contri_row.html", &vars) {
            out.push_str(&row);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::books::test_support::{seed_book, test_config};

    #[test]
    fn only_the_owners_records_are_listed_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        seed_book(&config.db_path, "Mine 1", "Fiction", 7);
        seed_book(&config.db_path, "Theirs", "Fiction", 8);
        seed_book(&config.db_path, "Mine 2", "Science", 7);

        let books = list_by_owner(&config.db_path, 7).unwrap();
        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Mine 1", "Mine 2"]);
    }

    #[test]
    fn unknown_owner_yields_an_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        seed_book(&config.db_path, "T", "Fiction", 7);

        assert!(list_by_owner(&config.db_path, 99).unwrap().is_empty());
    }
}
