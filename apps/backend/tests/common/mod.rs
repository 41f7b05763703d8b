//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for creating test users and tasks
//! - Authentication helpers
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

pub mod fixtures;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use uuid::Uuid;

use kaizen_backend::db::Database;
use kaizen_backend::models::UserStats;
use kaizen_backend::routes;
use kaizen_backend::AppState;
use kaizen_core::{GameConfig, ProgressionEngine};

/// Test context containing database connection and test server.
///
/// Use this to set up integration tests with a real database connection.
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    pub engine: Arc<ProgressionEngine>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);
        let engine = Arc::new(ProgressionEngine::new(GameConfig::default()));

        let state = AppState {
            db: db.clone(),
            engine: engine.clone(),
        };

        let app = build_test_router(state);

        Self { db, engine, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test user with its stats row and return its ID and token.
    pub async fn create_test_user(&self, email: &str) -> (Uuid, String) {
        let password_hash =
            routes::auth::hash_password("hunter42-test").expect("Failed to hash test password");

        let user = self
            .db
            .create_user("Test User", email, &password_hash)
            .await
            .expect("Failed to create test user");

        self.db
            .get_or_create_stats(user.id, &self.engine.initial_stats())
            .await
            .expect("Failed to create test stats");

        let session = self
            .db
            .create_session(user.id)
            .await
            .expect("Failed to create test session");

        (user.id, session.token)
    }

    /// Overwrite a user's stats record, retrying past concurrent writers.
    pub async fn set_user_stats(&self, user_id: Uuid, stats: &UserStats) {
        for _ in 0..10 {
            let row = self
                .db
                .get_or_create_stats(user_id, &self.engine.initial_stats())
                .await
                .expect("Failed to load stats row");

            let saved = self
                .db
                .save_stats(user_id, stats, row.version)
                .await
                .expect("Failed to save stats row");

            if saved {
                return;
            }
        }

        panic!("Gave up overwriting stats for user {}", user_id);
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Clean up test data for a user.
    ///
    /// Call this after tests to remove test data.
    pub async fn cleanup_user(&self, user_id: Uuid) {
        // Delete in order due to foreign keys
        let _ = sqlx::query("DELETE FROM activity_logs WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM user_stats WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;

        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;
    }
}

/// Build the test router with all routes.
fn build_test_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/tasks", get(routes::tasks::list))
        .route("/api/tasks", post(routes::tasks::create))
        .route("/api/tasks/{id}", get(routes::tasks::get_task))
        .route("/api/tasks/{id}", put(routes::tasks::update_task))
        .route("/api/tasks/{id}", delete(routes::tasks::delete_task))
        .route("/api/tasks/{id}/complete", post(routes::tasks::complete))
        .route("/api/tasks/{id}/fail", post(routes::tasks::fail))
        .route("/api/stats", get(routes::stats::get_all))
        .route("/api/stats/streak", get(routes::stats::streak))
        .route("/api/stats/counts", get(routes::stats::counts))
        .route("/api/stats/heatmap", get(routes::stats::heatmap))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .merge(protected_routes)
        .with_state(state)
}
