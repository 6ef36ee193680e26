//! # Authentication Service Module
//!
//! Registration, login and logout for the library. Registration and login
//! are open pages; everything that mutates the catalog goes through the
//! session gate in `crate::session::state` afterwards.
//!
//! The provided routes are:
//! - `GET /register/` renders the registration form, `POST /register/`
//!   creates the account. A duplicate email re-renders the form with an
//!   inline conflict message instead of creating a second account.
//! - `GET /login/` renders the login form, `POST /login/` verifies the
//!   credentials against the stored Argon2 hash. Success establishes a
//!   session (cookie + server-side map entry) and redirects home; failure
//!   re-renders the form with an inline error and leaves no session.
//! - `GET /logout/` destroys the caller's session unconditionally and
//!   redirects home.

use std::path::Path;

use actix_web::web::{self, get, post};
use rusqlite::{params, Connection};
use thiserror::Error;

use common::model::user::User;

mod login;
mod logout;
mod register;

/// Auth failures. `Conflict` and `InvalidCredentials` are expected
/// outcomes surfaced inline on the originating form; the rest are
/// infrastructure faults reported as a server error.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user is already registered")]
    Conflict,

    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Registers all authentication routes on the application.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/register/", get().to(register::form))
        .route("/register/", post().to(register::process))
        .route("/login/", get().to(login::form))
        .route("/login/", post().to(login::process))
        .route("/logout/", get().to(logout::process));
}

/// Looks a user up by login handle.
pub(crate) fn find_user_by_email(db: &Path, email: &str) -> Result<Option<User>, AuthError> {
    let conn = Connection::open(db)?;
    let mut stmt = conn.prepare(
        "SELECT id, email, password_hash, first_name, last_name FROM users WHERE email = ?1",
    )?;
    let mut rows = stmt.query_map(params![email], |row| {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
        })
    })?;

    match rows.next() {
        Some(user) => Ok(Some(user?)),
        None => Ok(None),
    }
}

/// Hashes a password with Argon2id and a fresh random salt, producing a
/// PHC string for storage.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
    use argon2::Argon2;

    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .to_string())
}

/// Verifies a password against a stored PHC string. An unparsable stored
/// hash counts as a mismatch.
pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};
    use argon2::Argon2;

    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
