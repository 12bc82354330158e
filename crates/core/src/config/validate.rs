use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Queue retry and buffer sizes are non-zero
/// - The office UTC offset is a real-world timezone offset
/// - Sector IDs and codes are unique and non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.queue.claim_retries == 0 {
        return Err(ConfigError::ValidationError(
            "queue.claim_retries must be at least 1".to_string(),
        ));
    }

    if config.queue.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "queue.event_buffer must be at least 1".to_string(),
        ));
    }

    // Real-world offsets fall within UTC-12:00..UTC+14:00.
    if !(-12 * 60..=14 * 60).contains(&config.queue.utc_offset_minutes) {
        return Err(ConfigError::ValidationError(format!(
            "queue.utc_offset_minutes out of range: {}",
            config.queue.utc_offset_minutes
        )));
    }

    let mut ids = HashSet::new();
    let mut codes = HashSet::new();
    for sector in &config.sectors {
        if sector.id.is_empty() || sector.code.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "sector '{}' has an empty id or code",
                sector.name
            )));
        }
        if !ids.insert(&sector.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate sector id: {}",
                sector.id
            )));
        }
        if !codes.insert(&sector.code) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate sector code: {}",
                sector.code
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SectorSeed, ServerConfig};
    use std::net::IpAddr;

    fn seed(id: &str, code: &str) -> SectorSeed {
        SectorSeed {
            id: id.to_string(),
            code: code.to_string(),
            name: code.to_string(),
            active: true,
            max_capacity: None,
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config {
            sectors: vec![seed("mesa", "MESA"), seed("caja", "CAJA")],
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_retries_fails() {
        let mut config = Config::default();
        config.queue.claim_retries = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_utc_offset_range() {
        let mut config = Config::default();
        config.queue.utc_offset_minutes = -180;
        assert!(validate_config(&config).is_ok());

        config.queue.utc_offset_minutes = 15 * 60;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_duplicate_sector_id_fails() {
        let config = Config {
            sectors: vec![seed("mesa", "MESA"), seed("mesa", "CAJA")],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_duplicate_sector_code_fails() {
        let config = Config {
            sectors: vec![seed("mesa", "MESA"), seed("mesa2", "MESA")],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_empty_code_fails() {
        let config = Config {
            sectors: vec![seed("mesa", "")],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
