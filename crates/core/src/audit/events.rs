use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operator-facing audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Upload intake
    UploadAccepted {
        upload_id: String,
        /// Show name as extracted from the upload
        raw_name: String,
        auditorium: Option<String>,
        /// Signs the show event was queued for
        delivered_to: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_ip: Option<String>,
    },
    /// Session refused before any content was parsed.
    UploadRejected {
        upload_id: String,
        /// "unauthenticated", "invalid_credentials" or "disabled"
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_ip: Option<String>,
    },
    UploadParseFailed {
        upload_id: String,
        error: String,
        size_bytes: usize,
    },
    /// Auditorium hint that addresses no configured sign.
    ShowUnrouted {
        upload_id: String,
        raw_name: String,
        auditorium: String,
    },

    // Configuration
    ConfigReloaded {
        revision: u64,
        config_hash: String,
        /// "api" or "signal"
        trigger: String,
    },
    ConfigReloadRejected {
        active_revision: u64,
        error: String,
        trigger: String,
    },

    // Sign rotation
    SignTransition {
        sign_id: String,
        auditorium: Option<String>,
        /// "started", "switched" or "stopped"
        kind: String,
        raw_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        profile_id: Option<String>,
        /// Configuration revision the sign resolved against
        revision: u64,
    },
}

impl AuditEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::UploadAccepted { .. } => "upload_accepted",
            Self::UploadRejected { .. } => "upload_rejected",
            Self::UploadParseFailed { .. } => "upload_parse_failed",
            Self::ShowUnrouted { .. } => "show_unrouted",
            Self::ConfigReloaded { .. } => "config_reloaded",
            Self::ConfigReloadRejected { .. } => "config_reload_rejected",
            Self::SignTransition { .. } => "sign_transition",
        }
    }

    /// Sign the event concerns, if it is about a single sign.
    pub fn sign_id(&self) -> Option<&str> {
        match self {
            Self::SignTransition { sign_id, .. } => Some(sign_id),
            _ => None,
        }
    }

    /// Auditorium the event concerns, if any.
    pub fn auditorium(&self) -> Option<&str> {
        match self {
            Self::UploadAccepted { auditorium, .. } | Self::SignTransition { auditorium, .. } => {
                auditorium.as_deref()
            }
            Self::ShowUnrouted { auditorium, .. } => Some(auditorium),
            _ => None,
        }
    }
}

/// Stored audit record (as persisted in the database)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub sign_id: Option<String>,
    pub auditorium: Option<String>,
    pub data: AuditEvent,
}
