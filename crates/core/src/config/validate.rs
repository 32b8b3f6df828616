use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Import batch size stays within the remote's 1..=100 range
/// - Rollover threshold sits below the offset ceiling
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.import.batch_size == 0 || config.import.batch_size > 100 {
        return Err(ConfigError::ValidationError(format!(
            "import.batch_size must be between 1 and 100, got {}",
            config.import.batch_size
        )));
    }

    if config.import.rollover_threshold >= config.import.offset_ceiling {
        return Err(ConfigError::ValidationError(format!(
            "import.rollover_threshold ({}) must be below import.offset_ceiling ({})",
            config.import.rollover_threshold, config.import.offset_ceiling
        )));
    }

    if config.import.max_retries == 0 {
        return Err(ConfigError::ValidationError(
            "import.max_retries must be at least 1".to_string(),
        ));
    }

    Ok(())
}
