use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::parser::ParseError;
use crate::auth::AuthError;

/// Notification that a show is about to start.
///
/// Consumed once by each sign it is delivered to; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowEvent {
    pub raw_name: String,
    pub received_at: DateTime<Utc>,
    /// Auditorium the upload addressed; None means every sign.
    pub auditorium: Option<String>,
}

impl ShowEvent {
    pub fn new(raw_name: impl Into<String>, auditorium: Option<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            received_at: Utc::now(),
            auditorium,
        }
    }
}

/// Result of an accepted upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub upload_id: String,
    pub raw_name: String,
    pub auditorium: Option<String>,
    /// Signs the event was queued for. Empty when the auditorium has no sign.
    pub delivered_to: Vec<String>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Upload rejected: {0}")]
    Rejected(#[from] AuthError),

    #[error("Upload could not be parsed: {0}")]
    Parse(#[from] ParseError),
}
