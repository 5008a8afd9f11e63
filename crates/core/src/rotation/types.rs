//! Types shared by the rotation scheduler and its consumers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::AssetSpec;

/// Rotation state of one sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RotationState {
    /// Nothing to play.
    #[default]
    Idle,
    /// Showing `assets[asset_index]`; `elapsed` only grows for images.
    Playing {
        asset_index: usize,
        #[serde(with = "millis")]
        elapsed: Duration,
    },
}

impl RotationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn asset_index(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Playing { asset_index, .. } => Some(*asset_index),
        }
    }
}

/// How the renderer should present an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DisplayMode {
    /// Show for a fixed time (images).
    Fixed { duration_secs: f64 },
    /// Play to the end and report completion with the cue (videos).
    PlayToCompletion,
}

impl DisplayMode {
    pub fn for_asset(asset: &AssetSpec) -> Self {
        match asset {
            AssetSpec::Image { duration, .. } => Self::Fixed {
                duration_secs: duration.as_secs_f64(),
            },
            AssetSpec::Video { .. } => Self::PlayToCompletion,
        }
    }
}

/// What a sign's renderer should be showing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderDirective {
    /// Present `media`. `cue` identifies this particular showing.
    Show {
        sign_id: String,
        cue: u64,
        media: String,
        #[serde(flatten)]
        mode: DisplayMode,
    },
    /// Nothing matched; show the fallback asset if one is configured.
    Idle {
        sign_id: String,
        fallback: Option<String>,
    },
}

impl RenderDirective {
    pub fn sign_id(&self) -> &str {
        match self {
            Self::Show { sign_id, .. } | Self::Idle { sign_id, .. } => sign_id,
        }
    }

    pub fn cue(&self) -> Option<u64> {
        match self {
            Self::Show { cue, .. } => Some(*cue),
            Self::Idle { .. } => None,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_state_accessors() {
        assert!(RotationState::default().is_idle());
        let playing = RotationState::Playing {
            asset_index: 2,
            elapsed: Duration::from_millis(1500),
        };
        assert!(!playing.is_idle());
        assert_eq!(playing.asset_index(), Some(2));

        let json = serde_json::to_value(playing).unwrap();
        assert_eq!(json["state"], "playing");
        assert_eq!(json["elapsed"], 1500);
    }

    #[test]
    fn test_show_directive_wire_format() {
        let directive = RenderDirective::Show {
            sign_id: "foyer".to_string(),
            cue: 3,
            media: "poster.jpg".to_string(),
            mode: DisplayMode::for_asset(&AssetSpec::image("poster.jpg", Duration::from_secs(8))),
        };
        let json = serde_json::to_value(&directive).unwrap();
        assert_eq!(json["type"], "show");
        assert_eq!(json["cue"], 3);
        assert_eq!(json["mode"], "fixed");
        assert_eq!(json["duration_secs"], 8.0);

        let back: RenderDirective = serde_json::from_value(json).unwrap();
        assert_eq!(back, directive);
    }

    #[test]
    fn test_video_directive_plays_to_completion() {
        let mode = DisplayMode::for_asset(&AssetSpec::video("trailer.mp4"));
        assert_eq!(mode, DisplayMode::PlayToCompletion);
    }

    #[test]
    fn test_idle_directive() {
        let directive = RenderDirective::Idle {
            sign_id: "foyer".to_string(),
            fallback: Some("logo.png".to_string()),
        };
        assert_eq!(directive.sign_id(), "foyer");
        assert_eq!(directive.cue(), None);
        let json = serde_json::to_value(&directive).unwrap();
        assert_eq!(json["type"], "idle");
        assert_eq!(json["fallback"], "logo.png");
    }
}
