use std::collections::HashMap;
use std::path::Path;

use actix_web::{web, HttpRequest, Responder};
use rusqlite::{params, Connection};

use crate::config::AppConfig;
use crate::pages;
use crate::services::books::{book_from_row, error_response, CatalogError, BOOK_COLUMNS};
use crate::session::state::{current_user, SessionsState};
use common::model::book::Book;

/// The explore page's fixed partition of the catalog. A record whose
/// stored category matches none of the three buckets is in none of them.
#[derive(Debug, Default)]
pub struct CategoryBuckets {
    pub education: Vec<Book>,
    pub fiction: Vec<Book>,
    pub science: Vec<Book>,
}

/// Renders the explore page with the catalog split into its category
/// buckets.
pub async fn process(
    config: web::Data<AppConfig>,
    sessions: web::Data<SessionsState>,
    req: HttpRequest,
) -> impl Responder {
    let user = current_user(&req, &sessions).await;

    let buckets = match list_by_category(&config.db_path) {
        Ok(buckets) => buckets,
        Err(e) => return error_response(e),
    };

    let mut vars = HashMap::new();
    vars.insert("nav", pages::nav_links(user.as_ref()));
    vars.insert("education_books", book_cards(&buckets.education));
    vars.insert("fiction_books", book_cards(&buckets.fiction));
    vars.insert("science_books", book_cards(&buckets.science));
    pages::page("explore.html", &vars)
}

/// Partitions the store into the three fixed buckets by exact category
/// match, one query per bucket.
pub fn list_by_category(db: &Path) -> Result<CategoryBuckets, CatalogError> {
    Ok(CategoryBuckets {
        education: books_in_category(db, "Education")?,
        fiction: books_in_category(db, "Fiction")?,
        science: books_in_category(db, "Science")?,
    })
}

fn books_in_category(db: &Path, category: &str) -> Result<Vec<Book>, CatalogError> {
    let conn = Connection::open(db)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM books WHERE category = ?1",
        BOOK_COLUMNS
    ))?;
    let books = stmt
        .query_map(params![category], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}

/// Concatenated card fragments for one bucket, or a placeholder note for
/// an empty one.
fn book_cards(books: &[Book]) -> String {
    if books.is_empty() {
        return "<p class=\"empty\">No books in this category yet.</p>".to_string();
    }

    let mut out = String::new();
    for book in books {
        let mut vars = HashMap::new();
        vars.insert("id", book.id.to_string());
        vars.insert("title", pages::escape(&book.title));
        vars.insert("author", pages::escape(&book.author));
        if let Ok(card) = pages::render_template("book_card.html", &vars) {
            out.push_str(&card);
        }
    }
    out
}
