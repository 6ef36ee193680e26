use std::collections::HashMap;
use std::path::Path;

use actix_web::http::header;
use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use rusqlite::{params, Connection};

use crate::config::AppConfig;
use crate::pages;
use crate::services::auth::{find_user_by_email, hash_password, AuthError};
use common::requests::RegisterRequest;

/// Renders the empty registration form.
pub async fn form() -> impl Responder {
    render_form("")
}

/// Handles the registration submission. A duplicate email re-renders the
/// form with an inline message; success redirects to the login page.
pub async fn process(
    config: web::Data<AppConfig>,
    payload: web::Form<RegisterRequest>,
) -> impl Responder {
    match register_user(&config.db_path, &payload) {
        Ok(user_id) => {
            info!("Registered user {} ({})", payload.email, user_id);
            HttpResponse::Found()
                .insert_header((header::LOCATION, "/login/"))
                .finish()
        }
        Err(AuthError::Conflict) => render_form("The user is already registered in the library"),
        Err(e) => {
            error!("Registration failed for {}: {}", payload.email, e);
            HttpResponse::InternalServerError().body(format!("Error registering user: {}", e))
        }
    }
}

fn render_form(message: &str) -> HttpResponse {
    let mut vars = HashMap::new();
    vars.insert("nav", pages::nav_links(None));
    if !message.is_empty() {
        vars.insert(
            "message",
            format!("<p class=\"message\">{}</p>", pages::escape(message)),
        );
    }
    pages::page("register.html", &vars)
}

/// Creates the user identity, failing with `Conflict` if the login handle
/// is taken. Returns the new user's id.
pub fn register_user(db: &Path, input: &RegisterRequest) -> Result<i64, AuthError> {
    if find_user_by_email(db, &input.email)?.is_some() {
        return Err(AuthError::Conflict);
    }

    let password_hash = hash_password(&input.password)?;
    let conn = Connection::open(db)?;
    conn.execute(
        "INSERT INTO users (email, password_hash, first_name, last_name)
         VALUES (?1, ?2, ?3, ?4)",
        params![input.email, password_hash, input.first_name, input.last_name],
    )?;

    Ok(conn.last_insert_rowid())
}
