use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use marquee_core::{
    load_config, AuditEvent, AuditHandle, AuditStore, ConfigError, ConfigSnapshot, ConfigStore,
    IngestGateway, SanitizedConfig, SignFleet,
};
use marquee_core::metrics::CONFIG_RELOADS;

use crate::api::RenderBroadcaster;

/// Shared application state
pub struct AppState {
    config_path: PathBuf,
    config: ConfigStore,
    fleet: Arc<SignFleet>,
    gateway: IngestGateway,
    audit_handle: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
    renderers: RenderBroadcaster,
}

impl AppState {
    pub fn new(
        config_path: PathBuf,
        config: ConfigStore,
        fleet: Arc<SignFleet>,
        gateway: IngestGateway,
        audit_handle: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        renderers: RenderBroadcaster,
    ) -> Self {
        Self {
            config_path,
            config,
            fleet,
            gateway,
            audit_handle,
            audit_store,
            renderers,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(self.config.snapshot().config())
    }

    pub fn fleet(&self) -> &SignFleet {
        &self.fleet
    }

    pub fn gateway(&self) -> &IngestGateway {
        &self.gateway
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn renderers(&self) -> &RenderBroadcaster {
        &self.renderers
    }

    /// Re-read the configuration file and swap it in.
    ///
    /// `trigger` names what asked for the reload ("api", "sighup") and is
    /// recorded in the audit log. On any error the active configuration
    /// stays in place.
    pub async fn reload_config(&self, trigger: &str) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        let active_revision = self.config.snapshot().revision();

        let result = match load_config(&self.config_path) {
            Ok(config) => self.config.reload(config),
            Err(e) => {
                CONFIG_RELOADS.with_label_values(&["rejected"]).inc();
                warn!(
                    path = %self.config_path.display(),
                    trigger,
                    "Configuration reload failed: {}", e
                );
                Err(e)
            }
        };

        let event = match &result {
            Ok(snapshot) => AuditEvent::ConfigReloaded {
                revision: snapshot.revision(),
                config_hash: snapshot.config_hash().to_string(),
                trigger: trigger.to_string(),
            },
            Err(e) => AuditEvent::ConfigReloadRejected {
                active_revision,
                error: e.to_string(),
                trigger: trigger.to_string(),
            },
        };
        self.audit_handle.emit(event).await;

        result
    }
}
