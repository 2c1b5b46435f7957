//! # beacon-server
//!
//! The Beacon relay server: a chat namespace and a WebRTC signaling
//! namespace served as two WebSocket endpoints on one listener, plus a
//! health endpoint and an optional Prometheus exporter.
//!
//! Each namespace runs its own [`beacon_core::Relay`], so registrations and
//! rooms never leak across endpoints. Connections are verified once during
//! the handshake and handled by a per-connection actor from then on.

pub mod auth;
pub mod chat;
pub mod config;
pub mod connection;
pub mod metrics;
pub mod signaling;
pub mod state;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// Assemble the HTTP surface: both relay endpoints plus health.
pub fn app(state: AppState) -> Router {
    let chat_path = state.config.transport.chat_path.clone();
    let video_path = state.config.transport.video_path.clone();
    Router::new()
        .route(&chat_path, get(chat::ws_handler))
        .route(&video_path, get(signaling::ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

/// Liveness plus per-namespace table counters.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "chat": state.chat.stats(),
        "video": state.signal.stats(),
    }))
}
