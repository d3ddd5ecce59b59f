use actix_files as fs;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::warn;
use std::path::Path;

use crate::models::AppState;

/// HTTP handler for the index page
pub async fn index(req: HttpRequest, app_state: web::Data<AppState>) -> impl Responder {
    let page = Path::new(&app_state.config.static_dir).join("index.html");
    match fs::NamedFile::open_async(&page).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            warn!("No index page at {}: {}", page.display(), e);
            HttpResponse::Ok().body(format!(
                "Chess board server, {} active sessions",
                app_state.session_count()
            ))
        }
    }
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: &str) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(fs::Files::new("/static", static_dir));
}
