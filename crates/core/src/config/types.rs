use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::catalog::MediaKind;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Physical displays, one rotation each.
    #[serde(default)]
    pub signs: Vec<SignConfig>,
    /// Movie profiles in priority order (earlier wins specificity ties).
    #[serde(default)]
    pub movies: Vec<MovieConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration (operator audit log)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("marquee.db")
}

/// Upload intake configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Shared upload password. Empty or absent disables the channel entirely.
    #[serde(default)]
    pub password: Option<String>,
    /// Uploads larger than this are rejected before parsing.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            password: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl IngestConfig {
    /// The configured password, if the channel is enabled.
    pub fn active_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

fn default_max_upload_bytes() -> usize {
    64 * 1024
}

/// Rotation timing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// How often each sign advances its rotation (milliseconds).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Display time for images that don't set `duration_secs`.
    #[serde(default = "default_image_duration")]
    pub default_image_duration_secs: f64,

    /// Asset shown while a sign has nothing to play. None = blank screen.
    #[serde(default)]
    pub idle_media: Option<String>,

    /// Capacity of each sign's command queue.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_tick_interval() -> u64 {
    250
}

fn default_image_duration() -> f64 {
    10.0
}

fn default_command_buffer() -> usize {
    64
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            default_image_duration_secs: default_image_duration(),
            idle_media: None,
            command_buffer: default_command_buffer(),
        }
    }
}

/// A physical display and the auditorium it belongs to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SignConfig {
    pub id: String,
    #[serde(default)]
    pub auditorium: Option<String>,
}

/// A movie profile as written by the operator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MovieConfig {
    /// Show-name pattern; `*` matches any run of characters.
    pub pattern: String,
    /// Restrict this profile to signs in these auditoriums (empty = all).
    #[serde(default)]
    pub auditoriums: Vec<String>,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

/// One entry of a movie's rotation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetConfig {
    pub media: String,
    /// Inferred from the media file extension when absent.
    #[serde(default)]
    pub kind: Option<MediaKind>,
    /// Images only; videos play to completion.
    #[serde(default)]
    pub duration_secs: Option<f64>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ingest: SanitizedIngestConfig,
    pub scheduler: SchedulerConfig,
    pub signs: Vec<SignConfig>,
    pub movies: Vec<MovieConfig>,
}

/// Sanitized ingest config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIngestConfig {
    pub enabled: bool,
    pub password_configured: bool,
    pub max_upload_bytes: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let password_configured = config.ingest.active_password().is_some();
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            ingest: SanitizedIngestConfig {
                enabled: password_configured,
                password_configured,
                max_upload_bytes: config.ingest.max_upload_bytes,
            },
            scheduler: config.scheduler.clone(),
            signs: config.signs.clone(),
            movies: config.movies.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "marquee.db");
        assert!(config.ingest.active_password().is_none());
        assert_eq!(config.ingest.max_upload_bytes, 65536);
        assert_eq!(config.scheduler.tick_interval_ms, 250);
        assert!(config.signs.is_empty());
        assert!(config.movies.is_empty());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[ingest]
password = "popcorn"

[scheduler]
tick_interval_ms = 100
default_image_duration_secs = 8.5
idle_media = "house-logo.png"

[[signs]]
id = "lobby-left"
auditorium = "1"

[[signs]]
id = "lobby-right"

[[movies]]
pattern = "X MEN*"
auditoriums = ["1"]

[[movies.assets]]
media = "xmen-poster.jpg"
duration_secs = 12

[[movies.assets]]
media = "xmen-trailer.mp4"
kind = "video"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.ingest.active_password(), Some("popcorn"));
        assert_eq!(config.scheduler.default_image_duration_secs, 8.5);
        assert_eq!(config.scheduler.idle_media.as_deref(), Some("house-logo.png"));
        assert_eq!(config.signs.len(), 2);
        assert_eq!(config.signs[0].auditorium.as_deref(), Some("1"));
        assert!(config.signs[1].auditorium.is_none());

        let movie = &config.movies[0];
        assert_eq!(movie.pattern, "X MEN*");
        assert_eq!(movie.auditoriums, vec!["1".to_string()]);
        assert_eq!(movie.assets.len(), 2);
        assert_eq!(movie.assets[0].duration_secs, Some(12.0));
        assert!(movie.assets[0].kind.is_none());
        assert_eq!(movie.assets[1].kind, Some(MediaKind::Video));
    }

    #[test]
    fn test_empty_password_disables_channel() {
        let config: Config = toml::from_str("[ingest]\npassword = \"\"\n").unwrap();
        assert!(config.ingest.active_password().is_none());
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let config: Config = toml::from_str("[ingest]\npassword = \"secret\"\n").unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.ingest.enabled);
        assert!(sanitized.ingest.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }
}
