//! Configuration management
//!
//! Values come from a TOML file, then environment variables, then whatever the
//! binary overrides from its command line.

use crate::error::{ErrorContext, GatehouseError, GatehouseResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatehouseConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener and cookie settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Name of the cookie carrying the session token
    pub cookie_name: String,
    /// Mark the session cookie `Secure` (requires HTTPS in front)
    pub secure_cookie: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cookie_name: "gatehouse_session".to_string(),
            secure_cookie: false,
        }
    }
}

/// Credential store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://gatehouse.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://gatehouse.db".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

/// Session lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions idle for longer than this resolve as anonymous; unset = never
    pub idle_timeout_secs: Option<u64>,
    /// How often the server sweeps idle sessions
    pub purge_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: None,
            purge_interval_secs: 3600,
        }
    }
}

/// Upper bound for session durations, so timestamp arithmetic stays in range
pub const MAX_SESSION_INTERVAL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

impl GatehouseConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GatehouseResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GatehouseError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_metadata("path", &path.display().to_string())
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: GatehouseConfig = toml::from_str(&content).map_err(|e| GatehouseError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_metadata("path", &path.display().to_string())
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GatehouseResult<()> {
        let path = path.as_ref();
        let content = self.to_toml()?;

        std::fs::write(path, content).map_err(|e| GatehouseError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_metadata("path", &path.display().to_string())
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    pub fn to_toml(&self) -> GatehouseResult<String> {
        toml::to_string_pretty(self).map_err(|e| GatehouseError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })
    }

    /// Apply `GATEHOUSE_*` / `DATABASE_URL` overrides, reading `.env` first
    pub fn with_env_overrides(mut self) -> GatehouseResult<Self> {
        dotenvy::dotenv().ok();
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_env<F>(&mut self, lookup: F) -> GatehouseResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GATEHOUSE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("GATEHOUSE_PORT") {
            self.server.port = parse_env("GATEHOUSE_PORT", &port)?;
        }
        if let Some(name) = lookup("GATEHOUSE_COOKIE_NAME") {
            self.server.cookie_name = name;
        }
        if let Some(secure) = lookup("GATEHOUSE_SECURE_COOKIE") {
            self.server.secure_cookie = parse_env("GATEHOUSE_SECURE_COOKIE", &secure)?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(timeout) = lookup("GATEHOUSE_SESSION_IDLE_TIMEOUT") {
            self.session.idle_timeout_secs =
                Some(parse_env("GATEHOUSE_SESSION_IDLE_TIMEOUT", &timeout)?);
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> GatehouseResult<()> {
        let invalid = |message: &str, suggestion: &str| GatehouseError::Config {
            message: message.to_string(),
            source: None,
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion(suggestion),
        };

        if self.server.port == 0 {
            return Err(invalid(
                "Server port must be greater than 0",
                "Set server.port to a free TCP port",
            ));
        }

        if self.server.cookie_name.trim().is_empty() {
            return Err(invalid(
                "Session cookie name must not be empty",
                "Set server.cookie_name, e.g. \"gatehouse_session\"",
            ));
        }

        if self.database.url.trim().is_empty() {
            return Err(invalid(
                "Database URL must not be empty",
                "Set database.url or the DATABASE_URL environment variable",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(invalid(
                "Database max_connections must be greater than 0",
                "Set database.max_connections to a positive value",
            ));
        }

        if self.session.purge_interval_secs == 0 {
            return Err(invalid(
                "Session purge interval must be greater than 0",
                "Set session.purge_interval_secs to a positive value",
            ));
        }

        if self.session.purge_interval_secs > MAX_SESSION_INTERVAL_SECS {
            return Err(invalid(
                "Session purge interval must not exceed ten years",
                "Lower session.purge_interval_secs",
            ));
        }

        match self.session.idle_timeout_secs {
            Some(0) => {
                return Err(invalid(
                    "Session idle timeout must be greater than 0 when set",
                    "Remove session.idle_timeout_secs to disable expiry",
                ));
            }
            Some(secs) if secs > MAX_SESSION_INTERVAL_SECS => {
                return Err(invalid(
                    "Session idle timeout must not exceed ten years",
                    "Remove session.idle_timeout_secs to disable expiry",
                ));
            }
            _ => {}
        }

        Ok(())
    }

    /// `host:port` for the listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> GatehouseResult<T> {
    value.parse().map_err(|_| GatehouseError::Config {
        message: format!("Invalid value for {}: {}", key, value),
        source: None,
        context: ErrorContext::new("config")
            .with_operation("apply_env")
            .with_metadata("variable", key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = GatehouseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert!(config.session.idle_timeout_secs.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatehouseConfig::default();
        config
            .apply_env(lookup_from(&[
                ("GATEHOUSE_PORT", "9000"),
                ("DATABASE_URL", "sqlite::memory:"),
                ("GATEHOUSE_SESSION_IDLE_TIMEOUT", "600"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(config.database.is_in_memory());
        assert_eq!(config.session.idle_timeout_secs, Some(600));
    }

    #[test]
    fn test_bad_env_value_is_a_config_error() {
        let mut config = GatehouseConfig::default();
        let err = config
            .apply_env(lookup_from(&[("GATEHOUSE_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, GatehouseError::Config { .. }));
        let context = err.context().unwrap();
        assert_eq!(
            context.metadata.get("variable").map(String::as_str),
            Some("GATEHOUSE_PORT")
        );
    }

    #[test]
    fn test_missing_file_error_names_the_path() {
        let err = GatehouseConfig::from_file("/nonexistent/gatehouse.toml").unwrap_err();
        let context = err.context().unwrap();
        assert_eq!(context.operation.as_deref(), Some("read_file"));
        assert_eq!(
            context.metadata.get("path").map(String::as_str),
            Some("/nonexistent/gatehouse.toml")
        );
    }

    #[test]
    fn test_validation_rejects_out_of_range_durations() {
        for secs in [u64::MAX, 10_000_000_000_000, MAX_SESSION_INTERVAL_SECS + 1] {
            let mut config = GatehouseConfig::default();
            config.session.idle_timeout_secs = Some(secs);
            assert!(config.validate().is_err(), "idle timeout {secs} accepted");

            let mut config = GatehouseConfig::default();
            config.session.purge_interval_secs = secs;
            assert!(config.validate().is_err(), "purge interval {secs} accepted");
        }

        let mut config = GatehouseConfig::default();
        config.session.idle_timeout_secs = Some(MAX_SESSION_INTERVAL_SECS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = GatehouseConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = GatehouseConfig::default();
        config.session.idle_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = GatehouseConfig::default();
        config.server.cookie_name = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
