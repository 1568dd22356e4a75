use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tokio::signal;

mod api_error;
mod config;
mod db;
mod http;
mod middleware;
mod models;
mod service;
mod store;
mod telemetry;

use crate::config::Config;
use crate::db::create_pool;
use crate::http::AppState;
use crate::middleware::cors_middleware;
use crate::service::{BracketService, TournamentService};
use crate::store::{MatchStore, PgMatchStore};
use crate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> io::Result<()> {
    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    // Initialize telemetry
    init_telemetry();

    // Create database pool
    let db_pool = create_pool(&config)
        .await
        .expect("Failed to create database pool");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let match_store: Arc<dyn MatchStore> = Arc::new(PgMatchStore::new(db_pool.clone()));
    let tournament_service = Arc::new(TournamentService::new(match_store.clone()));
    let bracket_service = Arc::new(BracketService::new(match_store));

    tracing::info!(
        "Starting lounge backend server on {}:{}",
        config.server.host,
        config.server.port
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(AppState {
                tournament_service: tournament_service.clone(),
                bracket_service: bracket_service.clone(),
            }))
            .wrap(cors_middleware())
            .wrap(actix_web::middleware::Logger::default())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(http::health::health_check))
                    .route(
                        "/tournaments",
                        web::post().to(http::tournament_handler::create_tournament),
                    )
                    .route(
                        "/tournaments/{id}",
                        web::get().to(http::tournament_handler::get_tournament),
                    )
                    .route(
                        "/tournaments/{id}/status",
                        web::post().to(http::tournament_handler::update_status),
                    )
                    .route(
                        "/tournaments/{id}/bracket",
                        web::get().to(http::bracket_handler::get_bracket),
                    )
                    .route(
                        "/tournaments/{id}/bracket/seed",
                        web::post().to(http::bracket_handler::seed_bracket),
                    )
                    .route(
                        "/tournaments/{id}/matches/{match_id}/winner",
                        web::post().to(http::bracket_handler::record_winner),
                    ),
            )
    })
    .bind((config.server.host.clone(), config.server.port))?
    .run();

    // Graceful shutdown
    let server_handle = server.handle();
    tokio::spawn(async move {
        signal::ctrl_c()
            .await
            .expect("Failed to listen for shutdown signal");
        tracing::info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    server.await
}
