use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Catalog base URL and username are set
/// - Retry policy makes at least one attempt
/// - Keep-alive interval is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let base_url = config.catalog.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.base_url is required".to_string(),
        ));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "catalog.base_url must be an http(s) URL, got '{}'",
            base_url
        )));
    }

    if config.catalog.username.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.username is required".to_string(),
        ));
    }

    if config.catalog.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.progress.keep_alive_secs == 0 {
        return Err(ConfigError::ValidationError(
            "progress.keep_alive_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CacheConfig, CatalogConfig, DownloadsConfig, ProgressConfig, RetryConfig, ServerConfig,
    };

    fn valid_config() -> Config {
        Config {
            catalog: CatalogConfig {
                base_url: "http://provider.example".to_string(),
                username: "alice".to_string(),
                password: "secret".to_string(),
                connect_timeout_secs: 5,
                request_timeout_secs: 15,
                user_agent: "test".to_string(),
                retry: RetryConfig::default(),
            },
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            downloads: DownloadsConfig::default(),
            progress: ProgressConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let mut config = valid_config();
        config.catalog.base_url = "provider.example".to_string();
        assert!(validate_config(&config).is_err());

        config.catalog.base_url = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_missing_username() {
        let mut config = valid_config();
        config.catalog.username = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_attempts_fails() {
        let mut config = valid_config();
        config.catalog.retry.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_keep_alive_fails() {
        let mut config = valid_config();
        config.progress.keep_alive_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
