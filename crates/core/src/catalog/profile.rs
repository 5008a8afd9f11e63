use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::AssetConfig;
use crate::matcher::{PatternError, WildcardPattern};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "mkv", "webm", "avi", "ts", "mpg", "mpeg"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"];

/// Kind of media an asset refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Guess the kind from a media reference's file extension.
    pub fn infer(media: &str) -> Option<Self> {
        let (_, ext) = media.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AssetError {
    #[error("media reference is empty")]
    EmptyMedia,

    #[error("cannot infer media kind of '{0}', set kind = \"image\" or \"video\"")]
    UnknownKind(String),

    #[error("image duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),
}

/// One displayable unit of a rotation.
///
/// Images are shown for a fixed time; videos play until the renderer reports
/// completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetSpec {
    Image {
        media: String,
        #[serde(with = "duration_secs")]
        duration: Duration,
    },
    Video {
        media: String,
    },
}

impl AssetSpec {
    pub fn image(media: impl Into<String>, duration: Duration) -> Self {
        Self::Image {
            media: media.into(),
            duration,
        }
    }

    pub fn video(media: impl Into<String>) -> Self {
        Self::Video {
            media: media.into(),
        }
    }

    /// Build an asset from its configured form.
    pub fn from_config(config: &AssetConfig, default_duration_secs: f64) -> Result<Self, AssetError> {
        let media = config.media.trim();
        if media.is_empty() {
            return Err(AssetError::EmptyMedia);
        }

        let kind = match config.kind {
            Some(kind) => kind,
            None => MediaKind::infer(media).ok_or_else(|| AssetError::UnknownKind(media.to_string()))?,
        };

        match kind {
            MediaKind::Video => Ok(Self::video(media)),
            MediaKind::Image => {
                let secs = config.duration_secs.unwrap_or(default_duration_secs);
                Ok(Self::image(media, image_duration(secs)?))
            }
        }
    }

    pub fn media(&self) -> &str {
        match self {
            Self::Image { media, .. } | Self::Video { media } => media,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Image { .. } => MediaKind::Image,
            Self::Video { .. } => MediaKind::Video,
        }
    }
}

/// Convert a configured image duration, rejecting values a `Duration` cannot hold.
pub fn image_duration(secs: f64) -> Result<Duration, AssetError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(AssetError::InvalidDuration(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| AssetError::InvalidDuration(secs))
}

/// Content fingerprint of a movie profile.
///
/// Two profiles with the same pattern and asset list share an id, so a reload
/// that leaves a profile untouched does not restart its rotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    fn fingerprint(pattern: &WildcardPattern, assets: &[AssetSpec]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(pattern.as_str().as_bytes());
        for asset in assets {
            hasher.update([0u8]);
            hasher.update(asset.kind().as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update(asset.media().as_bytes());
            if let AssetSpec::Image { duration, .. } = asset {
                hasher.update(duration.as_nanos().to_le_bytes());
            }
        }
        let digest = format!("{:x}", hasher.finalize());
        Self(digest[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A matchable show pattern and the rotation to play for it.
///
/// Immutable once built; a configuration reload replaces profiles wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieProfile {
    id: ProfileId,
    pattern: WildcardPattern,
    assets: Vec<AssetSpec>,
    auditoriums: Vec<String>,
}

impl MovieProfile {
    pub fn new(pattern: &str, assets: Vec<AssetSpec>) -> Result<Self, PatternError> {
        let pattern = WildcardPattern::compile(pattern)?;
        Ok(Self {
            id: ProfileId::fingerprint(&pattern, &assets),
            pattern,
            assets,
            auditoriums: Vec::new(),
        })
    }

    /// Limit the profile to signs in the given auditoriums.
    pub fn with_auditoriums<I, S>(mut self, auditoriums: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auditoriums = auditoriums
            .into_iter()
            .map(Into::into)
            .map(|a: String| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        self
    }

    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    pub fn pattern(&self) -> &WildcardPattern {
        &self.pattern
    }

    pub fn assets(&self) -> &[AssetSpec] {
        &self.assets
    }

    pub fn auditoriums(&self) -> &[String] {
        &self.auditoriums
    }

    /// A profile with no assets behaves as a non-match for display.
    pub fn is_playable(&self) -> bool {
        !self.assets.is_empty()
    }

    /// Whether a sign in `auditorium` may use this profile.
    pub fn applies_to(&self, auditorium: Option<&str>) -> bool {
        if self.auditoriums.is_empty() {
            return true;
        }
        match auditorium {
            Some(aud) => self.auditoriums.iter().any(|a| same_auditorium(a, aud)),
            None => false,
        }
    }
}

/// Auditorium labels compare trimmed and case-insensitively.
pub fn same_auditorium(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
