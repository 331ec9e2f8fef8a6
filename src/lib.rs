pub mod captions;
pub mod config;
pub mod error;
pub mod gemini;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod openai;
pub mod relay;
pub mod sse;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{caption_handler, chat_handler, health_handler, metrics_handler};
use crate::state::AppState;

/// Build the router with all routes.
pub fn app(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/generate-caption", post(caption_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
