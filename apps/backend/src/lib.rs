pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kaizen_core::ProgressionEngine;

use crate::config::AppConfig;
use crate::db::Database;
use crate::services::rollover::RolloverService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub engine: Arc<ProgressionEngine>,
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let db = Arc::new(db);
    let engine = Arc::new(ProgressionEngine::new(config.game.clone()));

    // Daily rollover fires on the configured cron schedule
    let rollover = Arc::new(RolloverService::new(
        db.clone(),
        engine.clone(),
        config.rollover_concurrency,
    ));
    services::scheduler::spawn(rollover, &config.rollover_cron)?;

    let state = AppState { db, engine };

    // Build router with protected routes
    let protected_routes = Router::new()
        // Auth routes
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        // Task routes
        .route("/api/tasks", get(routes::tasks::list))
        .route("/api/tasks", post(routes::tasks::create))
        .route("/api/tasks/{id}", get(routes::tasks::get_task))
        .route("/api/tasks/{id}", put(routes::tasks::update_task))
        .route("/api/tasks/{id}", delete(routes::tasks::delete_task))
        .route("/api/tasks/{id}/complete", post(routes::tasks::complete))
        .route("/api/tasks/{id}/fail", post(routes::tasks::fail))
        // Stats routes
        .route("/api/stats", get(routes::stats::get_all))
        .route("/api/stats/streak", get(routes::stats::streak))
        .route("/api/stats/counts", get(routes::stats::counts))
        .route("/api/stats/heatmap", get(routes::stats::heatmap))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    // Build full router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
