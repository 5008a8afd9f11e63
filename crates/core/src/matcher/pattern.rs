//! Compiled show-name patterns.
//!
//! A pattern is split once, at construction, into the literal segments that
//! sit between `*` wildcards. Matching then walks those segments in order:
//! the first segment is anchored at the start of the name, the last at the
//! end, and every segment in between is found left to right in what remains.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Wildcard character accepted in patterns.
pub const WILDCARD: char = '*';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
}

/// A case-insensitive, fully anchored wildcard pattern.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct WildcardPattern {
    /// Pattern as configured (trimmed).
    source: String,
    /// Lowercased literal runs; `segments.len() - 1` wildcard gaps between them.
    segments: Vec<String>,
    /// Number of literal characters, used to rank competing matches.
    specificity: usize,
}

impl WildcardPattern {
    /// Compile a pattern string.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let source = pattern.trim();
        if source.is_empty() {
            return Err(PatternError::Empty);
        }

        let segments: Vec<String> = source.split(WILDCARD).map(str::to_lowercase).collect();
        let specificity = source.chars().filter(|c| *c != WILDCARD).count();

        Ok(Self {
            source: source.to_string(),
            segments,
            specificity,
        })
    }

    /// The pattern as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Count of literal (non-wildcard) characters.
    pub fn specificity(&self) -> usize {
        self.specificity
    }

    /// Whether the pattern contains at least one wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.segments.len() > 1
    }

    /// Test a show name against the pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.matches_folded(&name.trim().to_lowercase())
    }

    /// Test an already trimmed and lowercased name.
    pub(crate) fn matches_folded(&self, name: &str) -> bool {
        let (first, rest) = match self.segments.split_first() {
            Some(split) => split,
            None => return false,
        };
        let Some((last, middle)) = rest.split_last() else {
            return name == first;
        };

        if name.len() < first.len() + last.len()
            || !name.starts_with(first.as_str())
            || !name.ends_with(last.as_str())
        {
            return false;
        }

        let mut window = &name[first.len()..name.len() - last.len()];
        for segment in middle.iter().filter(|s| !s.is_empty()) {
            match window.find(segment.as_str()) {
                Some(pos) => window = &window[pos + segment.len()..],
                None => return false,
            }
        }
        true
    }
}

impl fmt::Debug for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WildcardPattern({:?})", self.source)
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for WildcardPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for WildcardPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::compile(&source).map_err(serde::de::Error::custom)
    }
}
