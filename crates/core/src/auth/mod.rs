mod disabled;
mod shared_secret;
mod traits;
mod types;

pub use disabled::*;
pub use shared_secret::*;
pub use traits::*;
pub use types::*;

use crate::config::IngestConfig;

/// Build the authenticator for the upload channel.
///
/// An empty or missing password disables the channel rather than opening it.
pub fn create_authenticator(config: &IngestConfig) -> Box<dyn UploadAuthenticator> {
    match config.active_password() {
        Some(password) => Box::new(SharedSecretAuthenticator::new(password)),
        None => Box::new(DisabledAuthenticator::new()),
    }
}
