//! HTTP ingest surface.
//!
//! Thin adapters over the hub: validation and JSON shapes live here, the
//! pipeline semantics live in [`crate::PolarHub`].
//!
//! - `POST /beats` — real-time beats from the relay
//! - `POST /beats/batch` — retroactive upload from the mobile client
//! - `POST /posture` — posture transition pass-through
//! - `POST /status` — relay lifecycle events
//! - `GET /events` — SSE stream of status snapshots
//! - `GET /health` — liveness and device count

pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

pub use error::{ApiError, ApiResult};

use crate::hub::PolarHub;

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<PolarHub>,
}

pub fn create_router(hub: Arc<PolarHub>) -> Router {
    Router::new()
        .route("/beats", post(handlers::ingest_beats))
        .route("/beats/batch", post(handlers::ingest_batch))
        .route("/posture", post(handlers::ingest_posture))
        .route("/status", post(handlers::ingest_status))
        .route("/events", get(handlers::events))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(AppState { hub })
}
