use serde::{Deserialize, Serialize};

/// The categories offered on the book form. The store itself keeps
/// `category` as plain text, so rows with other values can exist; they
/// are simply absent from the explore page buckets.
pub const CATEGORIES: [&str; 3] = ["Education", "Fiction", "Science"];

/// One uploaded book and its metadata, as stored in the `books` table.
///
/// `author` and `author_id` are derived from the uploading user's identity
/// when the record is created and are never changed afterwards. `document`
/// is the path of the uploaded file relative to the media directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub pages: String,
    pub document: String,
    pub author: String,
    pub author_id: i64,
    pub category: String,
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}
