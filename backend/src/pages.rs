//! Server-side page rendering.
//!
//! All HTML pages are embedded into the binary at compile time from
//! `backend/static/` and rendered by substituting `{{name}}` placeholders
//! with request-specific values. A placeholder with no supplied value
//! renders as an empty string, which is how optional slots such as inline
//! error messages disappear from a clean form.

use std::collections::HashMap;

use actix_web::HttpResponse;
use include_dir::{include_dir, Dir};
use log::error;
use regex::Regex;

use crate::session::state::SessionUser;
use common::model::book::CATEGORIES;

/// Embedded page templates and assets, bundled at compile time.
static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static");

/// Renders the named template from `static/pages/`, replacing every
/// `{{key}}` placeholder with its value from `vars`.
pub fn render_template(name: &str, vars: &HashMap<&str, String>) -> Result<String, String> {
    let file = STATIC_DIR
        .get_file(format!("pages/{}", name))
        .ok_or_else(|| format!("Unknown page template: {}", name))?;
    let template = file
        .contents_utf8()
        .ok_or_else(|| format!("Page template is not UTF-8: {}", name))?;

    let re = Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").map_err(|e| e.to_string())?;
    let rendered = re.replace_all(template, |caps: &regex::Captures| {
        vars.get(&caps[1]).cloned().unwrap_or_default()
    });

    Ok(rendered.into_owned())
}

/// Renders a full page to a `200 OK` HTML response.
pub fn page(name: &str, vars: &HashMap<&str, String>) -> HttpResponse {
    match render_template(name, vars) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => {
            error!("Failed to render {}: {}", name, e);
            HttpResponse::InternalServerError().body(format!("Error rendering page: {}", e))
        }
    }
}

/// Serves an embedded asset from `static/assets/` with its guessed MIME
/// type, or the not-found page when no such asset is bundled.
pub fn asset_response(path: &str) -> HttpResponse {
    match STATIC_DIR.get_file(format!("assets/{}", path)) {
        Some(file) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => not_found(),
    }
}

/// The generic not-found response used whenever a book id resolves to
/// nothing.
pub fn not_found() -> HttpResponse {
    match render_template("not_found.html", &HashMap::new()) {
        Ok(body) => HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(_) => HttpResponse::NotFound().body("Not Found"),
    }
}

/// Escapes text for interpolation into HTML. Applied to every
/// user-supplied value before it reaches a template.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Navigation fragment for the page header. Logged-in visitors get their
/// own add/contributions/logout links; everyone else gets login/register.
pub fn nav_links(user: Option<&SessionUser>) -> String {
    match user {
        Some(user) => format!(
            "<a href=\"/\">Home</a> <a href=\"/explore/\">Explore</a> \
             <a href=\"/addBook/{id}/\">Add Book</a> \
             <a href=\"/contri/{id}/\">My Contributions</a> \
             <a href=\"/logout/\">Logout ({name})</a>",
            id = user.user_id,
            name = escape(&user.full_name()),
        ),
        None => "<a href=\"/\">Home</a> <a href=\"/explore/\">Explore</a> \
                 <a href=\"/login/\">Login</a> <a href=\"/register/\">Register</a>"
            .to_string(),
    }
}

/// `<option>` list for the category select, with `selected` marked when it
/// matches one of the offered categories.
pub fn category_options(selected: &str) -> String {
    let mut out = String::new();
    for category in CATEGORIES {
        if category == selected {
            out.push_str(&format!(
                "<option value=\"{0}\" selected>{0}</option>",
                category
            ));
        } else {
            out.push_str(&format!("<option value=\"{0}\">{0}</option>", category));
        }
    }
    out
}
