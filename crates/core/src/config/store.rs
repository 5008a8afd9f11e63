//! Hot-reloadable configuration snapshots.
//!
//! Readers always hold a complete, validated `ConfigSnapshot`. A reload builds
//! and validates the next snapshot off to the side and only then swaps it in,
//! so a bad reload leaves the running configuration untouched.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::{info, warn};

use super::{types::Config, validate_config, ConfigError, SignConfig};
use crate::catalog::ProfileCatalog;
use crate::metrics::CONFIG_RELOADS;

/// One validated configuration revision with its compiled profiles.
#[derive(Debug)]
pub struct ConfigSnapshot {
    revision: u64,
    config_hash: String,
    loaded_at: DateTime<Utc>,
    config: Config,
    catalog: ProfileCatalog,
}

impl ConfigSnapshot {
    fn build(config: Config, revision: u64) -> Result<Self, ConfigError> {
        validate_config(&config)?;
        let catalog = ProfileCatalog::compile(&config.movies, &config.scheduler)?;

        Ok(Self {
            revision,
            config_hash: config_hash(&config),
            loaded_at: Utc::now(),
            config,
            catalog,
        })
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    pub fn sign(&self, sign_id: &str) -> Option<&SignConfig> {
        self.config.signs.iter().find(|s| s.id.trim() == sign_id)
    }

    /// Auditorium a sign is currently assigned to.
    pub fn auditorium_of(&self, sign_id: &str) -> Option<&str> {
        self.sign(sign_id)
            .and_then(|s| s.auditorium.as_deref())
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

/// Short SHA-256 of the serialized configuration.
pub fn config_hash(config: &Config) -> String {
    let config_json = serde_json::to_string(config).unwrap_or_default();
    let digest = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    digest[..16].to_string()
}

/// Process-wide holder of the active configuration.
///
/// Cheap to clone; all clones share the same snapshot.
#[derive(Clone)]
pub struct ConfigStore {
    tx: Arc<watch::Sender<Arc<ConfigSnapshot>>>,
    reload_lock: Arc<Mutex<()>>,
}

impl ConfigStore {
    /// Validate and install the initial configuration as revision 1.
    pub fn load(config: Config) -> Result<Self, ConfigError> {
        let snapshot = ConfigSnapshot::build(config, 1)?;
        info!(
            revision = snapshot.revision,
            config_hash = %snapshot.config_hash,
            profiles = snapshot.catalog.len(),
            signs = snapshot.config.signs.len(),
            "Configuration loaded"
        );
        let (tx, _) = watch::channel(Arc::new(snapshot));
        Ok(Self {
            tx: Arc::new(tx),
            reload_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Replace the active configuration.
    ///
    /// On error the previous snapshot remains active.
    pub fn reload(&self, config: Config) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        let _guard = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());
        let next_revision = self.tx.borrow().revision + 1;

        match ConfigSnapshot::build(config, next_revision) {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.tx.send_replace(Arc::clone(&snapshot));
                CONFIG_RELOADS.with_label_values(&["accepted"]).inc();
                info!(
                    revision = snapshot.revision,
                    config_hash = %snapshot.config_hash,
                    profiles = snapshot.catalog.len(),
                    "Configuration reloaded"
                );
                Ok(snapshot)
            }
            Err(e) => {
                CONFIG_RELOADS.with_label_values(&["rejected"]).inc();
                warn!(
                    active_revision = next_revision - 1,
                    "Configuration reload rejected: {}", e
                );
                Err(e)
            }
        }
    }

    /// The active snapshot.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver notified on every accepted reload.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ConfigSnapshot>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn config(pattern: &str) -> Config {
        load_config_from_str(&format!(
            r#"
[[signs]]
id = "left"
auditorium = " 7 "

[[signs]]
id = "right"

[[movies]]
pattern = "{}"

[[movies.assets]]
media = "poster.jpg"
"#,
            pattern
        ))
        .unwrap()
    }

    #[test]
    fn test_load_starts_at_revision_one() {
        let store = ConfigStore::load(config("Alien*")).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision(), 1);
        assert_eq!(snapshot.catalog().len(), 1);
        assert_eq!(snapshot.config_hash().len(), 16);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let result = ConfigStore::load(config(""));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_auditorium_assignment() {
        let store = ConfigStore::load(config("Alien*")).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.auditorium_of("left"), Some("7"));
        assert_eq!(snapshot.auditorium_of("right"), None);
        assert_eq!(snapshot.auditorium_of("ghost"), None);
    }

    #[test]
    fn test_reload_swaps_snapshot_and_bumps_revision() {
        let store = ConfigStore::load(config("Alien*")).unwrap();
        let before = store.snapshot();

        let after = store.reload(config("Aliens*")).unwrap();
        assert_eq!(after.revision(), 2);
        assert_ne!(after.config_hash(), before.config_hash());
        assert_eq!(store.snapshot().revision(), 2);

        // The old snapshot is still intact for whoever holds it.
        assert_eq!(before.catalog().profiles()[0].pattern().as_str(), "Alien*");
    }

    #[test]
    fn test_rejected_reload_keeps_previous_snapshot() {
        let store = ConfigStore::load(config("Alien*")).unwrap();
        let result = store.reload(config("   "));
        assert!(result.is_err());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision(), 1);
        assert_eq!(snapshot.catalog().profiles()[0].pattern().as_str(), "Alien*");
    }

    #[test]
    fn test_reload_with_unrepresentable_duration_is_rejected() {
        let store = ConfigStore::load(config("Alien*")).unwrap();
        let mut next = config("Heat");
        next.movies[0].assets[0].duration_secs = Some(1e20);

        let result = store.reload(next);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        assert_eq!(store.snapshot().revision(), 1);

        let mut next = config("Heat");
        next.scheduler.default_image_duration_secs = 1e20;
        assert!(store.reload(next).is_err());
        assert_eq!(store.snapshot().revision(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_observe_reload() {
        let store = ConfigStore::load(config("Alien*")).unwrap();
        let mut rx = store.subscribe();

        store.reload(config("Heat")).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().revision(), 2);
    }

    #[test]
    fn test_config_hash_is_stable() {
        assert_eq!(config_hash(&config("A")), config_hash(&config("A")));
        assert_ne!(config_hash(&config("A")), config_hash(&config("B")));
    }
}
