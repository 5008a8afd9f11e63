use std::collections::HashSet;

use super::{types::Config, ConfigError};
use crate::catalog::{image_duration, AssetSpec};
use crate::matcher::WildcardPattern;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upload size limit and tick interval are non-zero
/// - Default image duration is a positive number
/// - Sign ids are non-empty and unique
/// - Movie patterns are non-empty and every asset is displayable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.ingest.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.max_upload_bytes cannot be 0".to_string(),
        ));
    }

    if config.scheduler.tick_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.tick_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.scheduler.command_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.command_buffer cannot be 0".to_string(),
        ));
    }

    let default_duration = config.scheduler.default_image_duration_secs;
    image_duration(default_duration).map_err(|e| {
        ConfigError::ValidationError(format!("scheduler.default_image_duration_secs: {}", e))
    })?;

    let mut seen = HashSet::new();
    for (idx, sign) in config.signs.iter().enumerate() {
        let id = sign.id.trim();
        if id.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "signs[{}].id cannot be empty",
                idx
            )));
        }
        if !seen.insert(id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate sign id '{}'",
                id
            )));
        }
    }

    for (idx, movie) in config.movies.iter().enumerate() {
        WildcardPattern::compile(&movie.pattern).map_err(|e| {
            ConfigError::ValidationError(format!("movies[{}].pattern: {}", idx, e))
        })?;

        for (asset_idx, asset) in movie.assets.iter().enumerate() {
            AssetSpec::from_config(asset, default_duration).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "movies[{}].assets[{}]: {}",
                    idx, asset_idx, e
                ))
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[[signs]]
id = "left"
auditorium = "1"

[[signs]]
id = "right"
auditorium = "2"

[[movies]]
pattern = "X MEN*"

[[movies.assets]]
media = "xmen.jpg"

[[movies.assets]]
media = "xmen.mp4"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_tick_interval_fails() {
        let mut config = valid_config();
        config.scheduler.tick_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_bad_default_duration_fails() {
        let mut config = valid_config();
        config.scheduler.default_image_duration_secs = -1.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_oversized_durations_fail() {
        let mut config = valid_config();
        config.scheduler.default_image_duration_secs = 1e20;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("scheduler.default_image_duration_secs"));

        let mut config = valid_config();
        config.movies[0].assets[0].duration_secs = Some(1e20);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("movies[0].assets[0]"));
    }

    #[test]
    fn test_validate_duplicate_sign_ids_fail() {
        let mut config = valid_config();
        config.signs[1].id = " left ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate sign id 'left'"));
    }

    #[test]
    fn test_validate_empty_sign_id_fails() {
        let mut config = valid_config();
        config.signs[0].id = "".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_pattern_fails() {
        let mut config = valid_config();
        config.movies[0].pattern = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("movies[0].pattern"));
    }

    #[test]
    fn test_validate_unknown_asset_kind_fails() {
        let mut config = valid_config();
        config.movies[0].assets[1].media = "xmen.bin".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("movies[0].assets[1]"));
    }

    #[test]
    fn test_validate_allows_profile_without_assets() {
        let mut config = valid_config();
        config.movies[0].assets.clear();
        assert!(validate_config(&config).is_ok());
    }
}
