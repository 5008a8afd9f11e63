use async_trait::async_trait;
use thiserror::Error;

use super::types::{UploadSession, Uploader};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Upload password required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Upload channel is disabled (no password configured)")]
    ChannelDisabled,
}

impl AuthError {
    /// Label used for metrics and audit records.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "unauthenticated",
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::ChannelDisabled => "disabled",
        }
    }
}

#[async_trait]
pub trait UploadAuthenticator: Send + Sync {
    /// Authenticate an upload session before any of its content is read.
    async fn authenticate(&self, session: &UploadSession) -> Result<Uploader, AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}
