use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use marquee_core::SanitizedConfig;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

/// Error body shared by the API handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub revision: u64,
    pub signs: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        revision: state.config().snapshot().revision(),
        signs: state.fleet().sign_ids().count(),
    })
}

/// Active configuration with its revision metadata.
#[derive(Serialize)]
pub struct ConfigResponse {
    pub revision: u64,
    pub config_hash: String,
    pub loaded_at: DateTime<Utc>,
    pub config: SanitizedConfig,
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let snapshot = state.config().snapshot();
    Json(ConfigResponse {
        revision: snapshot.revision(),
        config_hash: snapshot.config_hash().to_string(),
        loaded_at: snapshot.loaded_at(),
        config: SanitizedConfig::from(snapshot.config()),
    })
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub revision: u64,
    pub config_hash: String,
}

/// Re-read the configuration file. 422 leaves the previous revision active.
pub async fn reload_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.reload_config("api").await {
        Ok(snapshot) => Ok(Json(ReloadResponse {
            revision: snapshot.revision(),
            config_hash: snapshot.config_hash().to_string(),
        })),
        Err(e) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
