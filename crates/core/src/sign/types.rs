use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::ProfileId;
use crate::rotation::{RenderDirective, RotationState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignError {
    #[error("Sign not found: {0}")]
    NotFound(String),

    #[error("Sign controller is not running: {0}")]
    Stopped(String),
}

/// What a show event or reload did to a sign's rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same profile as before (or still nothing); rotation continues.
    Unchanged,
    /// Idle sign picked up a profile.
    Started,
    /// A different profile replaced the previous one.
    Switched,
    /// The sign went idle.
    Stopped,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Started => "started",
            Self::Switched => "switched",
            Self::Stopped => "stopped",
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// A sign's show state, as owned by its controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveShowState {
    /// Last show name received, kept so reloads can re-resolve it.
    pub raw_name: Option<String>,
    pub matched_profile: Option<ProfileId>,
    pub pattern: Option<String>,
    pub rotation: RotationState,
    pub cue: u64,
}

/// Snapshot of one sign for operators.
#[derive(Debug, Clone, Serialize)]
pub struct SignStatus {
    pub sign_id: String,
    pub auditorium: Option<String>,
    /// Configuration revision the sign last resolved against.
    pub revision: u64,
    pub state: ActiveShowState,
    pub directive: RenderDirective,
    pub last_event_at: Option<DateTime<Utc>>,
}
