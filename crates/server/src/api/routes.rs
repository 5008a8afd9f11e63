use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{audit, handlers, ingest, signs, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/config/reload", post(handlers::reload_config))
        // Upload intake
        .route("/ingest", post(ingest::ingest))
        // Signs
        .route("/signs", get(signs::list_signs))
        .route("/signs/{id}", get(signs::get_sign))
        .route("/signs/{id}/complete", post(signs::complete_playback))
        .route("/signs/{id}/render", get(ws::render_stream))
        // Audit
        .route("/audit", get(audit::query_audit));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
