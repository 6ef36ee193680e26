//! Manages the server-side login sessions.
//!
//! A session associates an opaque token, carried by the browser in the
//! `session` cookie, with the authenticated user's identity. Tokens are
//! random UUIDs and the mapping lives in process memory, so all sessions
//! end when the server stops.
//!
//! The main components are:
//! - `SessionsState`: a clonable, thread-safe map of active sessions.
//!   It is injected into the Actix application state in `main.rs`.
//! - `SessionUser`: the identity snapshot stored per session, used to
//!   derive `author`/`author_id` on newly uploaded books.
//! - `require_session`: the gate every mutating route goes through before
//!   any business logic runs.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the cookie that carries the session token.
pub const SESSION_COOKIE: &str = "session";

/// The identity bound to a session at login time.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl SessionUser {
    /// The display name recorded as `author` on uploads made during this
    /// session.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A thread-safe, shareable container for all active sessions.
///
/// This struct is created in `main.rs` and shared across the Actix
/// application as `web::Data`. It allows concurrent reads (every gated
/// request resolves its cookie here) and exclusive writes (login and
/// logout).
#[derive(Clone, Default)]
pub struct SessionsState {
    /// Map from session token to the logged-in identity. The single
    /// source of truth for who is logged in.
    pub sessions: Arc<RwLock<HashMap<String, SessionUser>>>,
}

impl SessionsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establishes a new session for `user` and returns its token.
    pub async fn create(&self, user: SessionUser) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), user);
        token
    }

    /// Destroys the session for `token`. Succeeds whether or not the
    /// token was known.
    pub async fn destroy(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    /// Resolves a token to its identity, if the session is still alive.
    pub async fn resolve(&self, token: &str) -> Option<SessionUser> {
        self.sessions.read().await.get(token).cloned()
    }
}

/// Returns the identity behind the request's session cookie, if any.
/// Used by ungated pages that still adapt to a logged-in visitor.
pub async fn current_user(req: &HttpRequest, state: &SessionsState) -> Option<SessionUser> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    state.resolve(cookie.value()).await
}

/// Session gate for mutating routes: yields the acting identity or the
/// redirect that sends an unauthenticated caller to the login page. The
/// caller short-circuits with the redirect before touching any business
/// logic.
pub async fn require_session(
    req: &HttpRequest,
    state: &SessionsState,
) -> Result<SessionUser, HttpResponse> {
    match current_user(req, state).await {
        Some(user) => Ok(user),
        None => Err(HttpResponse::Found()
            .insert_header((header::LOCATION, "/login/"))
            .finish()),
    }
}
