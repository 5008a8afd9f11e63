use async_trait::async_trait;

use super::{AuthError, UploadAuthenticator, UploadSession, Uploader};

/// Authenticator for a channel with no password configured.
/// Every session is refused, whatever credentials it presents.
#[derive(Debug, Default)]
pub struct DisabledAuthenticator;

impl DisabledAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UploadAuthenticator for DisabledAuthenticator {
    async fn authenticate(&self, _session: &UploadSession) -> Result<Uploader, AuthError> {
        Err(AuthError::ChannelDisabled)
    }

    fn method_name(&self) -> &'static str {
        "disabled"
    }
}
