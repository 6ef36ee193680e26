use std::collections::HashMap;
use std::path::Path;

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{web, HttpResponse, Responder};
use log::{error, info};

use crate::config::AppConfig;
use crate::pages;
use crate::services::auth::{find_user_by_email, verify_password, AuthError};
use crate::session::state::{SessionUser, SessionsState, SESSION_COOKIE};
use common::requests::LoginRequest;

/// Renders the empty login form.
pub async fn form() -> impl Responder {
    render_form("")
}

/// Handles the login submission. Correct credentials establish a session
/// and redirect home; anything else re-renders the form with an inline
/// error and no session side effect.
pub async fn process(
    config: web::Data<AppConfig>,
    sessions: web::Data<SessionsState>,
    payload: web::Form<LoginRequest>,
) -> impl Responder {
    match authenticate_user(&config.db_path, &payload.email, &payload.password) {
        Ok(user) => {
            let token = sessions.create(user.clone()).await;
            info!("User {} logged in", user.user_id);
            HttpResponse::Found()
                .insert_header((header::LOCATION, "/"))
                .cookie(
                    Cookie::build(SESSION_COOKIE, token)
                        .path("/")
                        .http_only(true)
                        .finish(),
                )
                .finish()
        }
        Err(AuthError::InvalidCredentials) => render_form("Invalid login credentials"),
        Err(e) => {
            error!("Login failed for {}: {}", payload.email, e);
            HttpResponse::InternalServerError().body(format!("Error logging in: {}", e))
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
    pages::page("login.html", &vars)
}

/// Checks the credentials against the user directory. An unknown email
/// and a wrong password are indistinguishable to the caller.
pub fn authenticate_user(db: &Path, email: &str, password: &str) -> Result<SessionUser, AuthError> {
    let user = find_user_by_email(db, email)?.ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(SessionUser {
        user_id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::init_storage;
    use crate::services::auth::register::register_user;
    use actix_web::test::{call_service, init_service, TestRequest};
    use actix_web::App;
    use common::requests::RegisterRequest;

    fn test_config(dir: &tempfile::TempDir) -> AppConfig {
        let config = AppConfig {
            db_path: dir.path().join("test.sqlite"),
            media_dir: dir.path().join("media"),
            bind: "127.0.0.1".to_string(),
            port: 0,
        };
        init_storage(&config).unwrap();
        config
    }

    fn register_ann(config: &AppConfig) -> i64 {
        register_user(
            &config.db_path,
            &RegisterRequest {
                email: "a@x.com".to_string(),
                password: "pw123456".to_string(),
                first_name: "Ann".to_string(),
                last_name: "Lee".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn correct_credentials_yield_the_identity() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let id = register_ann(&config);

        let user = authenticate_user(&config.db_path, "a@x.com", "pw123456").unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.full_name(), "Ann Lee");
    }

    #[test]
    fn wrong_password_and_unknown_email_both_fail() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        register_ann(&config);

        assert!(matches!(
            authenticate_user(&config.db_path, "a@x.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate_user(&config.db_path, "nobody@x.com", "pw123456"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[actix_web::test]
    async fn successful_login_sets_the_session_cookie_and_redirects_home() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        register_ann(&config);
        let sessions = SessionsState::new();

        let app = init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .app_data(web::Data::new(sessions.clone()))
                .configure(crate::services::auth::configure_routes),
        )
        .await;

        let resp = call_service(
            &app,
            TestRequest::post()
                .uri("/login/")
                .set_form([("email", "a@x.com"), ("password", "pw123456")])
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");

        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .expect("session cookie is set");
        assert!(sessions.resolve(cookie.value()).await.is_some());
    }

    #[actix_web::test]
    async fn failed_login_re_renders_the_form_without_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        register_ann(&config);
        let sessions = SessionsState::new();

        let app = init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .app_data(web::Data::new(sessions.clone()))
                .configure(crate::services::auth::configure_routes),
        )
        .await;

        let resp = call_service(
            &app,
            TestRequest::post()
                .uri("/login/")
                .set_form([("email", "a@x.com"), ("password", "wrong")])
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        assert!(sessions.sessions.read().await.is_empty());

        let body = actix_web::test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("Invalid login credentials"));
    }
}
