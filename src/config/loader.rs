//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `listener.bind_address`.
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";
/// Environment variable overriding `security.base_url`.
pub const ENV_SECURITY_URL: &str = "SECURITY_SERVER_URL";
/// Environment variable overriding `observability.log_level`.
pub const ENV_LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";
/// Environment variable overriding `observability.log_format`.
pub const ENV_LOG_FORMAT: &str = "GATEWAY_LOG_FORMAT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

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

/// Parse a TOML file into a configuration, without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides on top of `config`.
///
/// `lookup` is usually `|k| std::env::var(k).ok()`; tests pass a map.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(url) = lookup(ENV_SECURITY_URL) {
        config.security.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup(ENV_LOG_FORMAT) {
        config.observability.log_format = format.parse().map_err(|reason| ConfigError::Env {
            var: ENV_LOG_FORMAT,
            reason,
        })?;
    }
    Ok(())
}

/// Build the effective configuration: defaults, then the optional file,
/// then the process environment, then `overrides` (command-line flags).
/// The result is validated.
pub fn load_config<F>(path: Option<&Path>, overrides: F) -> Result<GatewayConfig, ConfigError>
where
    F: FnOnce(&mut GatewayConfig),
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [security]
            base_url = "http://security.internal:3001"
            scan_timeout_secs = 20

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.security.base_url, "http://security.internal:3001");
        assert_eq!(config.security.scan_timeout_secs, 20);
        assert_eq!(config.security.validate_timeout_secs, 5);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BIND_ADDRESS, "127.0.0.1:9000"),
            (ENV_SECURITY_URL, "https://guard.example.com/"),
            (ENV_LOG_FORMAT, "JSON"),
        ]);

        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.security.base_url, "https://guard.example.com");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn bad_env_log_format_is_rejected() {
        let mut config = GatewayConfig::default();
        let err = apply_env_overrides(&mut config, |k| {
            (k == ENV_LOG_FORMAT).then(|| "xml".to_string())
        })
        .unwrap_err();

        assert!(matches!(err, ConfigError::Env { var: ENV_LOG_FORMAT, .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_config(Path::new("/definitely/not/here/gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn flag_overrides_are_validated() {
        let err = load_config(None, |config| {
            config.listener.bind_address = "nonsense".into();
        })
        .unwrap_err();
        let errors = match err {
            ConfigError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other}"),
        };
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidAddress { field: "listener.bind_address", .. }
        )));
    }

    #[test]
    fn validation_error_lists_all_problems() {
        let err = ConfigError::Validation(vec![
            ValidationError::Zero { field: "timeouts.request_secs" },
            ValidationError::LogLevel("loud".into()),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: timeouts.request_secs must be greater than zero, unknown observability.log_level 'loud'"
        );
    }
}
