//! Runtime configuration and storage bootstrap.
//!
//! Settings are read once from the environment at startup and shared with
//! every handler as Actix application state. `init_storage` prepares the
//! SQLite schema and the media directory before the server starts
//! accepting requests.

use std::env;
use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;

/// Application settings, resolved from environment variables with local
/// defaults so the server runs out of the box.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the SQLite database file (`ELIBRARY_DB`).
    pub db_path: PathBuf,
    /// Root directory for uploaded documents (`ELIBRARY_MEDIA_DIR`).
    /// Book files are stored under `<media_dir>/pdfs/`.
    pub media_dir: PathBuf,
    /// Address the HTTP server binds to (`ELIBRARY_BIND`).
    pub bind: String,
    /// Port the HTTP server binds to (`ELIBRARY_PORT`).
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let db_path = env::var("ELIBRARY_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("elibrary.sqlite"));
        let media_dir = env::var("ELIBRARY_MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));
        let bind = env::var("ELIBRARY_BIND").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("ELIBRARY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        AppConfig {
            db_path,
            media_dir,
            bind,
            port,
        }
    }

    /// Directory uploaded book documents are written to.
    pub fn pdfs_dir(&self) -> PathBuf {
        self.media_dir.join("pdfs")
    }
}

/// Creates the database tables and the media directory if they do not
/// exist yet. Called once from `main` before the server is started.
pub fn init_storage(config: &AppConfig) -> Result<(), String> {
    let conn = Connection::open(&config.db_path).map_err(|e| e.to_string())?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
             id            INTEGER PRIMARY KEY AUTOINCREMENT,
             email         TEXT NOT NULL UNIQUE,
             password_hash TEXT NOT NULL,
             first_name    TEXT NOT NULL,
             last_name     TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS books (
             id        INTEGER PRIMARY KEY AUTOINCREMENT,
             title     TEXT NOT NULL,
             summary   TEXT NOT NULL,
             pages     TEXT NOT NULL,
             document  TEXT NOT NULL,
             author    TEXT NOT NULL,
             author_id INTEGER NOT NULL DEFAULT 0,
             category  TEXT NOT NULL
         );",
    )
    .map_err(|e| e.to_string())?;

    fs::create_dir_all(config.pdfs_dir()).map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_storage_creates_tables_and_media_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            db_path: dir.path().join("test.sqlite"),
            media_dir: dir.path().join("media"),
            bind: "127.0.0.1".to_string(),
            port: 0,
        };

        init_storage(&config).unwrap();
        assert!(config.pdfs_dir().is_dir());

        let conn = Connection::open(&config.db_path).unwrap();
        // both tables accept rows after bootstrap
        conn.execute(
            "INSERT INTO users (email, password_hash, first_name, last_name)
             VALUES ('a@x.com', 'h', 'Ann', 'Lee')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO books (title, summary, pages, document, author, category)
             VALUES ('T', 'S', '10', 'pdfs/t.pdf', 'Ann Lee', 'Fiction')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn init_storage_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            db_path: dir.path().join("test.sqlite"),
            media_dir: dir.path().join("media"),
            bind: "127.0.0.1".to_string(),
            port: 0,
        };

        init_storage(&config).unwrap();
        init_storage(&config).unwrap();
    }
}
