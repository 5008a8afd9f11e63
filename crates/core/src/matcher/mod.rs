//! Show-name to movie-profile resolution.
//!
//! Resolution is pure: the same name and the same profile list always pick the
//! same profile. When several patterns match, the one with the most literal
//! characters wins; ties go to the profile listed first.

mod pattern;

pub use pattern::{PatternError, WildcardPattern, WILDCARD};

use std::sync::Arc;

use crate::catalog::MovieProfile;

/// Resolve a raw show name against an ordered list of profiles.
///
/// Returns `None` when no pattern matches.
pub fn resolve<'a, I>(raw_name: &str, profiles: I) -> Option<&'a Arc<MovieProfile>>
where
    I: IntoIterator<Item = &'a Arc<MovieProfile>>,
{
    let folded = raw_name.trim().to_lowercase();
    let mut best: Option<&'a Arc<MovieProfile>> = None;

    for profile in profiles {
        if !profile.pattern().matches_folded(&folded) {
            continue;
        }
        let better = match best {
            Some(current) => profile.pattern().specificity() > current.pattern().specificity(),
            None => true,
        };
        if better {
            best = Some(profile);
        }
    }

    best
}
