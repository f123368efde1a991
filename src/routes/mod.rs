use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::db::QuizStore;
use crate::services::catalog::CatalogClient;

pub mod media;
pub mod quiz;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    pub catalog: Arc<dyn CatalogClient>,
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
}

/// API routes under /api/v1
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/quiz/submit", post(quiz::submit))
        .route("/quiz/:id/results", get(quiz::results))
        .route("/media/:kind/:id", get(media::details))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
