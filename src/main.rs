use actix_web::{web, App, HttpServer};
use log::{info, log, warn};
use std::io;

use location_registry::api;
use location_registry::app_state::AppState;
use location_registry::config::AppConfig;

/// log4rs from the configured file, env_logger if that file is unusable
fn init_logging(config: &AppConfig) {
    match log4rs::init_file(&config.logging.config_file, Default::default()) {
        Ok(()) => info!("Logging configured from {}", config.logging.config_file),
        Err(e) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
            warn!("Could not load {} ({}), logging to stderr", config.logging.config_file, e);
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let (config, notices) =
        AppConfig::load().map_err(|e| io::Error::other(format!("Failed to load configuration: {}", e)))?;
    init_logging(&config);
    for notice in &notices {
        log!(notice.level, "{}", notice.message);
    }

    let app_state = AppState::from_config(config.clone()).map_err(io::Error::other)?;
    let data = web::Data::new(app_state);

    info!("Starting server on {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(data.clone())
            .configure(api::configure)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
