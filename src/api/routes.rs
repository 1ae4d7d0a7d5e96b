//! Axum router wiring: one `/ws` upgrade plus a `/health` liveness probe,
//! matching the teacher's `main.rs` route table shape.

use crate::api::state::AppState;
use crate::api::ws::websocket_handler;
use crate::middleware::request_logging;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

async fn health_check() -> &'static str {
    "cartpilot-backend operational"
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket_handler))
        .layer(axum::middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
