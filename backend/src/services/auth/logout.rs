use actix_web::cookie::{time::Duration, Cookie};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::session::state::{SessionsState, SESSION_COOKIE};

/// Destroys the caller's session, expires the cookie and redirects home.
/// Succeeds whether or not a session existed.
pub async fn process(req: HttpRequest, sessions: web::Data<SessionsState>) -> impl Responder {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        sessions.destroy(cookie.value()).await;
    }

    let expired = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .max_age(Duration::ZERO)
        .finish();

    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(expired)
        .finish()
}
