//! Per-sign rotation state machine.
//!
//! ```text
//!            load(playable)                 tick: image elapsed >= duration
//!   Idle ─────────────────────▶ Playing(0,0) ◀──────┐  or completion(cue) on video
//!     ▲                            │    │           │
//!     │    load(None | no assets)  │    └───────────┘  index = (index + 1) % len
//!     └────────────────────────────┘
//! ```
//!
//! Every load is a hard reset; nothing carries over from the previous profile.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::trace;

use super::types::{DisplayMode, RenderDirective, RotationState};
use crate::catalog::{AssetSpec, MovieProfile};
use crate::metrics::{ASSET_ADVANCES, STALE_COMPLETIONS};

/// Drives one sign through a profile's asset list.
#[derive(Debug, Default)]
pub struct RotationScheduler {
    profile: Option<Arc<MovieProfile>>,
    state: RotationState,
    /// Incremented every time an asset starts showing.
    cue: u64,
    last_tick: Option<Instant>,
}

impl RotationScheduler {
    /// A scheduler in the `Idle` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `profile` from its first asset at `now`, or go idle.
    ///
    /// A profile without assets is treated like no profile at all.
    pub fn load(&mut self, profile: Option<Arc<MovieProfile>>, now: Instant) {
        match profile.filter(|p| p.is_playable()) {
            Some(profile) => {
                self.profile = Some(profile);
                self.state = RotationState::Playing {
                    asset_index: 0,
                    elapsed: std::time::Duration::ZERO,
                };
                self.cue += 1;
                self.last_tick = Some(now);
            }
            None => {
                self.profile = None;
                self.state = RotationState::Idle;
            }
        }
    }

    /// Advance by the time since the previous tick.
    ///
    /// Returns true when a new asset started.
    pub fn tick(&mut self, now: Instant) -> bool {
        let delta = match self.last_tick.replace(now) {
            Some(prev) => now.saturating_duration_since(prev),
            None => std::time::Duration::ZERO,
        };

        let RotationState::Playing {
            asset_index,
            elapsed,
        } = &mut self.state
        else {
            return false;
        };
        let Some(profile) = &self.profile else {
            return false;
        };

        match &profile.assets()[*asset_index] {
            AssetSpec::Image { duration, .. } => {
                *elapsed += delta;
                if *elapsed >= *duration {
                    self.advance(now);
                    ASSET_ADVANCES.with_label_values(&["timer"]).inc();
                    return true;
                }
                false
            }
            AssetSpec::Video { .. } => false,
        }
    }

    /// The renderer finished playing the video shown under `cue` at `now`.
    ///
    /// Ignored (returns false) unless `cue` is the current showing and the
    /// current asset is a video.
    pub fn playback_complete(&mut self, cue: u64, now: Instant) -> bool {
        let is_video = matches!(self.current_asset(), Some(AssetSpec::Video { .. }));
        if !is_video || cue != self.cue {
            trace!(cue, current_cue = self.cue, "Ignoring stale completion");
            STALE_COMPLETIONS.inc();
            return false;
        }
        self.advance(now);
        ASSET_ADVANCES.with_label_values(&["completion"]).inc();
        true
    }

    /// Move to the next asset; its display time is counted from `now`.
    fn advance(&mut self, now: Instant) {
        let Some(len) = self.profile.as_ref().map(|p| p.assets().len()) else {
            return;
        };
        if let RotationState::Playing { asset_index, .. } = self.state {
            self.state = RotationState::Playing {
                asset_index: (asset_index + 1) % len,
                elapsed: std::time::Duration::ZERO,
            };
            self.cue += 1;
            self.last_tick = Some(now);
        }
    }

    /// The asset that should be on screen, if any.
    pub fn current_asset(&self) -> Option<&AssetSpec> {
        let index = self.state.asset_index()?;
        self.profile.as_ref()?.assets().get(index)
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn profile(&self) -> Option<&Arc<MovieProfile>> {
        self.profile.as_ref()
    }

    pub fn cue(&self) -> u64 {
        self.cue
    }

    /// Render directive for the current state.
    pub fn directive(&self, sign_id: &str, idle_media: Option<&str>) -> RenderDirective {
        match self.current_asset() {
            Some(asset) => RenderDirective::Show {
                sign_id: sign_id.to_string(),
                cue: self.cue,
                media: asset.media().to_string(),
                mode: DisplayMode::for_asset(asset),
            },
            None => RenderDirective::Idle {
                sign_id: sign_id.to_string(),
                fallback: idle_media.map(str::to_string),
            },
        }
    }
}
