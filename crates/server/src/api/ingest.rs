use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use std::sync::Arc;

use marquee_core::{AuthError, IngestError, IngestReceipt, ParseError};

use super::handlers::ErrorResponse;
use super::middleware::UploadClient;
use crate::state::AppState;

/// Receive a show upload from the point-of-sale system.
///
/// The body is the raw upload; credentials travel in `Authorization: Bearer`
/// or `X-Upload-Password`.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    UploadClient(session): UploadClient,
    body: Bytes,
) -> Result<(StatusCode, Json<IngestReceipt>), (StatusCode, Json<ErrorResponse>)> {
    match state.gateway().ingest(&session, &body).await {
        Ok(receipt) => Ok((StatusCode::ACCEPTED, Json(receipt))),
        Err(e) => Err((
            status_for(&e),
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

fn status_for(error: &IngestError) -> StatusCode {
    match error {
        IngestError::Rejected(AuthError::ChannelDisabled) => StatusCode::FORBIDDEN,
        IngestError::Rejected(_) => StatusCode::UNAUTHORIZED,
        IngestError::Parse(ParseError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        IngestError::Parse(_) => StatusCode::BAD_REQUEST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_errors() {
        assert_eq!(
            status_for(&IngestError::Rejected(AuthError::NotAuthenticated)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&IngestError::Rejected(AuthError::InvalidCredentials(
                "wrong password".to_string()
            ))),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&IngestError::Rejected(AuthError::ChannelDisabled)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&IngestError::Parse(ParseError::TooLarge {
                size: 10,
                limit: 5
            })),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&IngestError::Parse(ParseError::Empty)),
            StatusCode::BAD_REQUEST
        );
    }
}
