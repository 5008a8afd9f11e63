//! Test doubles and fixtures for exercising signs without a display or an
//! upload transport.
//!
//! ```rust,ignore
//! use marquee_core::testing::{fixtures, RecordingRenderSink};
//!
//! let store = ConfigStore::load(fixtures::config_from_toml(TOML))?;
//! let sink = Arc::new(RecordingRenderSink::new());
//! let fleet = SignFleet::start(store, sink.clone(), None);
//! ```

mod recording_router;
mod recording_sink;

pub use recording_router::RecordingRouter;
pub use recording_sink::RecordingRenderSink;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::time::Duration;

    use crate::catalog::{AssetSpec, MovieProfile};
    use crate::config::{load_config_from_str, Config};

    /// Build a profile, panicking on an invalid pattern.
    pub fn profile(pattern: &str, assets: Vec<AssetSpec>) -> MovieProfile {
        MovieProfile::new(pattern, assets).expect("fixture pattern must be valid")
    }

    /// An image asset shown for `secs` seconds.
    pub fn image(media: &str, secs: u64) -> AssetSpec {
        AssetSpec::image(media, Duration::from_secs(secs))
    }

    pub fn video(media: &str) -> AssetSpec {
        AssetSpec::video(media)
    }

    /// Parse a TOML configuration, panicking on malformed input.
    pub fn config_from_toml(toml: &str) -> Config {
        load_config_from_str(toml).expect("fixture config must parse")
    }
}
