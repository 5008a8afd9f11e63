use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use marquee_core::{SignError, SignStatus};

use super::handlers::ErrorResponse;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn sign_error(e: SignError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        SignError::NotFound(_) => StatusCode::NOT_FOUND,
        SignError::Stopped(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// List every sign with its current state.
pub async fn list_signs(State(state): State<Arc<AppState>>) -> Json<Vec<SignStatus>> {
    Json(state.fleet().statuses().await)
}

pub async fn get_sign(
    State(state): State<Arc<AppState>>,
    Path(sign_id): Path<String>,
) -> ApiResult<SignStatus> {
    state
        .fleet()
        .status(&sign_id)
        .await
        .map(Json)
        .map_err(sign_error)
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub cue: u64,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    /// False when the cue no longer refers to the video on screen.
    pub advanced: bool,
}

/// Report that a sign's renderer finished a video.
pub async fn complete_playback(
    State(state): State<Arc<AppState>>,
    Path(sign_id): Path<String>,
    Json(request): Json<CompleteRequest>,
) -> ApiResult<CompleteResponse> {
    let advanced = state
        .fleet()
        .playback_complete(&sign_id, request.cue)
        .await
        .map_err(sign_error)?;
    Ok(Json(CompleteResponse { advanced }))
}
