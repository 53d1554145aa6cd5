use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Session and converter timeouts are positive
/// - At least one conversion may run at a time
/// - The CORS hostname is usable as an origin header
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.session.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "session.timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.converter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.converter.max_parallel_conversions == 0 {
        return Err(ConfigError::ValidationError(
            "converter.max_parallel_conversions must be greater than 0".to_string(),
        ));
    }

    if config.upload.max_body_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "upload.max_body_bytes must be greater than 0".to_string(),
        ));
    }

    if let Some(origin) = config.cors.allowed_origin() {
        if origin
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || !c.is_ascii())
        {
            return Err(ConfigError::ValidationError(format!(
                "cors.hostname produces an invalid origin: {:?}",
                origin
            )));
        }
    }

    Ok(())
}
