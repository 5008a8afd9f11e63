//! Per-sign show state.
//!
//! The controller is plain synchronous state; the actor in `actor.rs` is its
//! only caller, which gives every sign exactly one writer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::debug;

use super::types::{ActiveShowState, SignStatus, Transition};
use crate::catalog::AssetSpec;
use crate::config::ConfigSnapshot;
use crate::ingest::ShowEvent;
use crate::rotation::{RenderDirective, RotationScheduler};

pub struct SignController {
    sign_id: String,
    snapshot: Arc<ConfigSnapshot>,
    raw_name: Option<String>,
    last_event_at: Option<DateTime<Utc>>,
    scheduler: RotationScheduler,
}

impl SignController {
    pub fn new(sign_id: impl Into<String>, snapshot: Arc<ConfigSnapshot>) -> Self {
        Self {
            sign_id: sign_id.into(),
            snapshot,
            raw_name: None,
            last_event_at: None,
            scheduler: RotationScheduler::new(),
        }
    }

    pub fn sign_id(&self) -> &str {
        &self.sign_id
    }

    /// Auditorium this sign belongs to under the current configuration.
    pub fn auditorium(&self) -> Option<&str> {
        self.snapshot.auditorium_of(&self.sign_id)
    }

    pub fn revision(&self) -> u64 {
        self.snapshot.revision()
    }

    /// Resolve a newly announced show.
    ///
    /// Duplicate uploads, and names resolving to the profile already playing,
    /// leave the rotation where it is.
    pub fn on_show_event(&mut self, event: &ShowEvent, now: Instant) -> Transition {
        self.raw_name = Some(event.raw_name.clone());
        self.last_event_at = Some(event.received_at);
        self.resolve(now)
    }

    /// Adopt a new configuration and re-resolve the held show name against it.
    pub fn on_config_reload(&mut self, snapshot: Arc<ConfigSnapshot>, now: Instant) -> Transition {
        self.snapshot = snapshot;
        self.resolve(now)
    }

    /// Advance the rotation; returns the asset to display, or None when idle.
    pub fn tick(&mut self, now: Instant) -> Option<&AssetSpec> {
        self.scheduler.tick(now);
        self.scheduler.current_asset()
    }

    /// Video finished on the renderer. Returns false if the cue was stale.
    pub fn on_playback_complete(&mut self, cue: u64, now: Instant) -> bool {
        self.scheduler.playback_complete(cue, now)
    }

    pub fn current_asset(&self) -> Option<&AssetSpec> {
        self.scheduler.current_asset()
    }

    fn resolve(&mut self, now: Instant) -> Transition {
        let auditorium = self.snapshot.auditorium_of(&self.sign_id);
        let next = self
            .raw_name
            .as_deref()
            .and_then(|name| self.snapshot.catalog().resolve(name, auditorium))
            .filter(|p| p.is_playable())
            .cloned();

        let transition = match (self.scheduler.profile(), &next) {
            (None, None) => Transition::Unchanged,
            (Some(current), Some(next)) if current.id() == next.id() => Transition::Unchanged,
            (None, Some(_)) => Transition::Started,
            (Some(_), Some(_)) => Transition::Switched,
            (Some(_), None) => Transition::Stopped,
        };

        if transition.is_change() {
            debug!(
                sign_id = %self.sign_id,
                transition = transition.as_str(),
                pattern = next.as_ref().map(|p| p.pattern().as_str()),
                "Rotation reset"
            );
            self.scheduler.load(next, now);
        }
        transition
    }

    pub fn state(&self) -> ActiveShowState {
        let profile = self.scheduler.profile();
        ActiveShowState {
            raw_name: self.raw_name.clone(),
            matched_profile: profile.map(|p| p.id().clone()),
            pattern: profile.map(|p| p.pattern().as_str().to_string()),
            rotation: self.scheduler.state(),
            cue: self.scheduler.cue(),
        }
    }

    pub fn directive(&self) -> RenderDirective {
        self.scheduler.directive(
            &self.sign_id,
            self.snapshot.config().scheduler.idle_media.as_deref(),
        )
    }

    pub fn status(&self) -> SignStatus {
        SignStatus {
            sign_id: self.sign_id.clone(),
            auditorium: self.auditorium().map(str::to_string),
            revision: self.revision(),
            state: self.state(),
            directive: self.directive(),
            last_event_at: self.last_event_at,
        }
    }
}
