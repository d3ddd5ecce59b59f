use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;

use chess_board_app::config::Config;
use chess_board_app::models::AppState;
use chess_board_app::routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::parse();
    let bind_address = (config.host.clone(), config.port);
    let static_dir = config.static_dir.clone();
    info!("Starting chess board server at http://{}:{}", config.host, config.port);
    info!("Engine: {}, time control {}", config.engine, config.time_preset);

    // Create shared application state
    let app_state = web::Data::new(AppState::new(config));

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(|cfg| configure_routes(cfg, &static_dir))
    })
    .bind(bind_address)?
    .run()
    .await
}
