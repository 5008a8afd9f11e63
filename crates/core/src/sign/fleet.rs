//! All sign actors of the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::actor::SignActor;
use super::controller::SignController;
use super::handle::SignHandle;
use super::sink::RenderSink;
use super::types::{SignError, SignStatus};
use crate::audit::AuditHandle;
use crate::catalog::same_auditorium;
use crate::config::ConfigStore;
use crate::ingest::{Routing, ShowEvent, ShowRouter};

/// One actor per configured sign, plus routing of show events to them.
///
/// The set of signs is taken from the configuration at start; reloads may
/// move signs between auditoriums but do not add or remove signs.
pub struct SignFleet {
    config: ConfigStore,
    handles: Vec<SignHandle>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SignFleet {
    /// Spawn an actor for every sign in the active configuration.
    pub fn start(
        config: ConfigStore,
        sink: Arc<dyn RenderSink>,
        audit: Option<AuditHandle>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut handles = Vec::new();
        let mut tasks = Vec::new();

        let snapshot = config.snapshot();
        let buffer = snapshot.config().scheduler.command_buffer.max(1);

        for sign in &snapshot.config().signs {
            let sign_id = sign.id.trim().to_string();
            let config_rx = config.subscribe();
            // Start from whatever the receiver considers current so no reload
            // is missed between snapshot() and subscribe().
            let current = Arc::clone(&config_rx.borrow());
            let (tx, rx) = mpsc::channel(buffer);

            let actor = SignActor::new(
                SignController::new(sign_id.clone(), current),
                rx,
                config_rx,
                shutdown_tx.subscribe(),
                Arc::clone(&sink),
                audit.clone(),
            );
            tasks.push(tokio::spawn(actor.run()));
            handles.push(SignHandle::new(sign_id, tx));
        }

        info!(
            signs = handles.len(),
            revision = snapshot.revision(),
            "Sign fleet started"
        );

        Self {
            config,
            handles,
            running: Arc::new(AtomicBool::new(true)),
            shutdown_tx,
            tasks: Mutex::new(tasks),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn sign_ids(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().map(SignHandle::sign_id)
    }

    pub fn handle(&self, sign_id: &str) -> Result<&SignHandle, SignError> {
        self.handles
            .iter()
            .find(|h| h.sign_id() == sign_id)
            .ok_or_else(|| SignError::NotFound(sign_id.to_string()))
    }

    pub async fn status(&self, sign_id: &str) -> Result<SignStatus, SignError> {
        self.handle(sign_id)?.status().await
    }

    /// Status of every running sign, in configuration order.
    pub async fn statuses(&self) -> Vec<SignStatus> {
        let mut statuses = Vec::with_capacity(self.handles.len());
        for handle in &self.handles {
            match handle.status().await {
                Ok(status) => statuses.push(status),
                Err(e) => warn!(sign_id = %handle.sign_id(), "Status unavailable: {}", e),
            }
        }
        statuses
    }

    pub async fn playback_complete(&self, sign_id: &str, cue: u64) -> Result<bool, SignError> {
        self.handle(sign_id)?.playback_complete(cue).await
    }

    /// Signs addressed by an auditorium hint under the current assignment.
    fn targets(&self, auditorium: Option<&str>) -> Vec<&SignHandle> {
        let Some(auditorium) = auditorium else {
            return self.handles.iter().collect();
        };
        let snapshot = self.config.snapshot();
        self.handles
            .iter()
            .filter(|h| {
                snapshot
                    .auditorium_of(h.sign_id())
                    .is_some_and(|a| same_auditorium(a, auditorium))
            })
            .collect()
    }

    /// Stop every actor and wait for them to finish.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Sign fleet not running");
            return;
        }

        info!("Stopping sign fleet");
        let _ = self.shutdown_tx.send(());

        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!("Sign actor ended abnormally: {}", e);
            }
        }
        info!("Sign fleet stopped");
    }
}

#[async_trait]
impl ShowRouter for SignFleet {
    async fn route(&self, event: ShowEvent) -> Routing {
        let mut routing = Routing::default();
        for handle in self.targets(event.auditorium.as_deref()) {
            match handle.deliver(event.clone()).await {
                Ok(()) => routing.delivered_to.push(handle.sign_id().to_string()),
                Err(_) => routing.dropped.push(handle.sign_id().to_string()),
            }
        }
        routing
    }
}
