//! Shared-password authentication for the upload channel.

use async_trait::async_trait;

use super::{AuthError, UploadAuthenticator, UploadSession, Uploader};

/// Header carrying the password when `Authorization` is not used.
pub const PASSWORD_HEADER: &str = "x-upload-password";

/// Authenticator that checks uploads against the single configured password.
///
/// Accepts the password in either:
/// - `Authorization: Bearer <password>` header
/// - `X-Upload-Password: <password>` header
pub struct SharedSecretAuthenticator {
    expected: String,
}

impl SharedSecretAuthenticator {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            expected: password.into(),
        }
    }

    fn extract_password<'a>(&self, session: &'a UploadSession) -> Option<&'a str> {
        if let Some(auth_header) = session.header("authorization") {
            if let Some(password) = auth_header
                .strip_prefix("Bearer ")
                .or_else(|| auth_header.strip_prefix("bearer "))
            {
                return Some(password);
            }
        }

        session.header(PASSWORD_HEADER)
    }
}

#[async_trait]
impl UploadAuthenticator for SharedSecretAuthenticator {
    async fn authenticate(&self, session: &UploadSession) -> Result<Uploader, AuthError> {
        let provided = self
            .extract_password(session)
            .ok_or(AuthError::NotAuthenticated)?;

        if constant_time_eq(provided.as_bytes(), self.expected.as_bytes()) {
            Ok(Uploader {
                method: self.method_name().to_string(),
                source_ip: session.source_ip,
            })
        } else {
            Err(AuthError::InvalidCredentials(
                "upload password mismatch".to_string(),
            ))
        }
    }

    fn method_name(&self) -> &'static str {
        "shared_secret"
    }
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
