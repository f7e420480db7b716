use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info, warn};
use std::io;

mod api;
mod config;
mod errors;
mod models;
mod services;

use services::relay_service::TransferRelay;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Missing keys or addresses stop the process here, never per request.
    let config = config::Config::from_env().map_err(fatal)?;
    let relay = TransferRelay::from_config(&config).await.map_err(fatal)?;

    for status in relay.statuses() {
        info!(
            "{} relay ready: {} -> {}",
            status.chain, status.sender, status.recipient
        );
    }
    warn!("transfers are not idempotent: every accepted request is a new on-chain transfer");

    let relay = web::Data::new(relay);
    info!("Backend running at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .max_age(3600);
        App::new()
            .app_data(relay.clone())
            .configure(api::config)
            .wrap(cors)
            .wrap(Logger::default())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn fatal(e: errors::CustomError) -> io::Error {
    error!("startup failed: {}", e);
    io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
}
