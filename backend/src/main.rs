mod config;
mod pages;
mod services;
mod session;

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use actix_files::Files;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use env_logger::Env;
use log::info;

use crate::config::AppConfig;
use crate::session::state::{current_user, SessionsState};

/// Renders the catalog home page.
async fn home(sessions: web::Data<SessionsState>, req: HttpRequest) -> impl Responder {
    let user = current_user(&req, &sessions).await;
    let mut vars = HashMap::new();
    vars.insert("nav", pages::nav_links(user.as_ref()));
    pages::page("home.html", &vars)
}

/// Fallback handler: serves embedded assets under `/static/`, everything
/// else is the not-found page.
async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    match path.strip_prefix("static/") {
        Some(asset) => pages::asset_response(asset),
        None => pages::not_found(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let app_config = AppConfig::from_env();
    config::init_storage(&app_config).map_err(std::io::Error::other)?;

    let bind_addr = (app_config.bind.clone(), app_config.port);
    let url = format!("http://{}:{}", app_config.bind, app_config.port);

    {
        let _url_clone = url.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(500));
            let _ = webbrowser::open(&_url_clone);
        });
    }

    let media_dir = app_config.media_dir.clone();
    let config_data = web::Data::new(app_config);
    let sessions_data = web::Data::new(SessionsState::new());

    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(sessions_data.clone())
            .route("/", web::get().to(home))
            .service(Files::new("/media", media_dir.clone()))
            .configure(services::auth::configure_routes)
            .configure(services::books::configure_routes)
            .default_service(web::route().to(serve_embedded))
    })
    .bind(bind_addr)?
    .run()
    .await
}
