//! Movie profiles compiled from configuration.

mod profile;

pub use profile::*;

use std::sync::Arc;

use crate::config::{ConfigError, MovieConfig, SchedulerConfig};
use crate::matcher;

/// The ordered, compiled profile list of one configuration revision.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: Vec<Arc<MovieProfile>>,
}

impl ProfileCatalog {
    /// Compile configured movies, keeping their order.
    pub fn compile(movies: &[MovieConfig], scheduler: &SchedulerConfig) -> Result<Self, ConfigError> {
        let mut profiles = Vec::with_capacity(movies.len());

        for (idx, movie) in movies.iter().enumerate() {
            let assets = movie
                .assets
                .iter()
                .enumerate()
                .map(|(asset_idx, asset)| {
                    AssetSpec::from_config(asset, scheduler.default_image_duration_secs).map_err(
                        |e| {
                            ConfigError::ValidationError(format!(
                                "movies[{}].assets[{}]: {}",
                                idx, asset_idx, e
                            ))
                        },
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;

            let profile = MovieProfile::new(&movie.pattern, assets)
                .map_err(|e| ConfigError::ValidationError(format!("movies[{}]: {}", idx, e)))?
                .with_auditoriums(movie.auditoriums.iter().cloned());

            profiles.push(Arc::new(profile));
        }

        Ok(Self { profiles })
    }

    pub fn from_profiles(profiles: Vec<MovieProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn profiles(&self) -> &[Arc<MovieProfile>] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Resolve a show name for a sign in `auditorium`.
    ///
    /// Only profiles scoped to that auditorium (or unscoped) take part.
    pub fn resolve(&self, raw_name: &str, auditorium: Option<&str>) -> Option<&Arc<MovieProfile>> {
        matcher::resolve(
            raw_name,
            self.profiles.iter().filter(|p| p.applies_to(auditorium)),
        )
    }
}
