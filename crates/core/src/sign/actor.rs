//! Task that owns one sign controller.
//!
//! Show events, completion signals, status queries, reloads and ticks are all
//! handled on this one task, so they never interleave for a given sign.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::controller::SignController;
use super::handle::SignCommand;
use super::sink::RenderSink;
use super::types::Transition;
use crate::audit::{AuditEvent, AuditHandle};
use crate::config::ConfigSnapshot;
use crate::metrics::SIGN_TRANSITIONS;
use crate::rotation::RenderDirective;

pub struct SignActor {
    controller: SignController,
    commands: mpsc::Receiver<SignCommand>,
    config_rx: watch::Receiver<Arc<ConfigSnapshot>>,
    shutdown_rx: broadcast::Receiver<()>,
    sink: Arc<dyn RenderSink>,
    audit: Option<AuditHandle>,
    last_published: Option<RenderDirective>,
}

impl SignActor {
    pub fn new(
        controller: SignController,
        commands: mpsc::Receiver<SignCommand>,
        config_rx: watch::Receiver<Arc<ConfigSnapshot>>,
        shutdown_rx: broadcast::Receiver<()>,
        sink: Arc<dyn RenderSink>,
        audit: Option<AuditHandle>,
    ) -> Self {
        Self {
            controller,
            commands,
            config_rx,
            shutdown_rx,
            sink,
            audit,
            last_published: None,
        }
    }

    pub async fn run(mut self) {
        let sign_id = self.controller.sign_id().to_string();
        info!(sign_id = %sign_id, auditorium = ?self.controller.auditorium(), "Sign actor started");

        let mut tick_ms = self.tick_interval_ms();
        let mut ticker = tick_timer(tick_ms);
        let mut watching_config = true;

        self.publish();

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    debug!(sign_id = %sign_id, "Sign actor received shutdown signal");
                    break;
                }
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
                changed = self.config_rx.changed(), if watching_config => {
                    if changed.is_err() {
                        warn!(sign_id = %sign_id, "Configuration store dropped; keeping current configuration");
                        watching_config = false;
                        continue;
                    }
                    let snapshot = Arc::clone(&self.config_rx.borrow_and_update());
                    let revision = snapshot.revision();
                    let transition = self.controller.on_config_reload(snapshot, Instant::now());
                    self.record(transition);

                    if self.tick_interval_ms() != tick_ms {
                        tick_ms = self.tick_interval_ms();
                        ticker = tick_timer(tick_ms);
                    }
                    debug!(sign_id = %sign_id, revision, transition = transition.as_str(), "Configuration applied");
                }
                _ = ticker.tick() => {
                    self.controller.tick(Instant::now());
                }
            }

            self.publish();
        }

        info!(sign_id = %sign_id, "Sign actor stopped");
    }

    fn handle_command(&mut self, command: SignCommand) {
        match command {
            SignCommand::Show(event) => {
                let transition = self.controller.on_show_event(&event, Instant::now());
                self.record(transition);
            }
            SignCommand::PlaybackComplete { cue, reply } => {
                let advanced = self.controller.on_playback_complete(cue, Instant::now());
                if !advanced {
                    debug!(sign_id = %self.controller.sign_id(), cue, "Stale playback completion ignored");
                }
                let _ = reply.send(advanced);
            }
            SignCommand::Status(reply) => {
                let _ = reply.send(self.controller.status());
            }
        }
    }

    fn record(&self, transition: Transition) {
        if !transition.is_change() {
            return;
        }
        SIGN_TRANSITIONS
            .with_label_values(&[transition.as_str()])
            .inc();

        let state = self.controller.state();
        info!(
            sign_id = %self.controller.sign_id(),
            transition = transition.as_str(),
            raw_name = ?state.raw_name,
            pattern = ?state.pattern,
            cue = state.cue,
            "Sign rotation changed"
        );

        if let Some(ref audit) = self.audit {
            audit.try_emit(AuditEvent::SignTransition {
                sign_id: self.controller.sign_id().to_string(),
                auditorium: self.controller.auditorium().map(str::to_string),
                kind: transition.as_str().to_string(),
                raw_name: state.raw_name,
                pattern: state.pattern,
                profile_id: state.matched_profile.map(|id| id.to_string()),
                revision: self.controller.revision(),
            });
        }
    }

    /// Send the current directive to the sink if it changed.
    fn publish(&mut self) {
        let directive = self.controller.directive();
        if self.last_published.as_ref() != Some(&directive) {
            self.sink.publish(&directive);
            self.last_published = Some(directive);
        }
    }

    fn tick_interval_ms(&self) -> u64 {
        self.config_rx.borrow().config().scheduler.tick_interval_ms
    }
}

fn tick_timer(period_ms: u64) -> Interval {
    let mut interval = time::interval(Duration::from_millis(period_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
