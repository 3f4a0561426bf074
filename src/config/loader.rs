//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, ProxyConfig::default());
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = parse_config(
            r#"
            backends = ["10.0.0.1:8080", "10.0.0.2:8080"]

            [listener]
            http_address = "127.0.0.1:8080"

            [transport]
            max_idle_per_host = 64

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.backends.0, vec!["10.0.0.1:8080", "10.0.0.2:8080"]);
        assert_eq!(config.listener.http_address, "127.0.0.1:8080");
        assert_eq!(config.listener.https_address, "0.0.0.0:443");
        assert_eq!(config.transport.max_idle_per_host, 64);
        assert_eq!(config.transport.connect_timeout_secs, 30);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn syntax_error_is_parse_error() {
        let err = parse_config("backends = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn semantic_error_is_validation_error() {
        let err = parse_config("backends = []").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors[0].field, "backends"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/rr-proxy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
