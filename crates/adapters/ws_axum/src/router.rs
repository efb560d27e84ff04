//! Axum router assembly.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the WebSocket endpoint at `/wss/` (with `/ws` as an alias) and the
/// health check at `/health`. Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/wss/", get(crate::ws::upgrade))
        .route("/ws", get(crate::ws::upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    devices: usize,
    connections: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        devices: state.hub.registry().len(),
        connections: state.hub.clients().len(),
    })
}
