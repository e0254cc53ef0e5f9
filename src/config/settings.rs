//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// obs-websocket endpoint settings.
    #[serde(default)]
    pub obs: ObsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.obs.host.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "obs.host cannot be empty".to_string(),
            });
        }

        if self.obs.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "obs.port must be between 1 and 65535".to_string(),
            });
        }

        if self.obs.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "obs.request_timeout_secs must be greater than zero".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ),
            });
        }

        Ok(())
    }
}

/// obs-websocket endpoint configuration.
///
/// Read once when the first connection is made; there is no hot-reload.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObsConfig {
    /// Host name or IP address of the machine running OBS.
    #[serde(default = "default_host")]
    pub host: String,

    /// obs-websocket server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// obs-websocket server password. `None` when authentication is disabled.
    #[serde(default)]
    pub password: Option<String>,

    /// Upper bound for connecting and for each request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ObsConfig {
    /// Returns the `host:port` endpoint string.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the `ws://` URL for this endpoint.
    ///
    /// IPv6 literals are bracketed.
    #[must_use]
    pub fn url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("ws://[{}]:{}", self.host, self.port)
        } else {
            format!("ws://{}:{}", self.host, self.port)
        }
    }

    /// Returns the request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// The password must never reach a log line.
impl fmt::Debug for ObsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObsConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_port() -> u16 {
    4455
}

const fn default_request_timeout() -> u64 {
    10
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.obs.endpoint(), "localhost:4455");
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "obs": {
                "host": "192.168.1.20",
                "port": 4456,
                "password": "hunter2",
                "request_timeout_secs": 3
            },
            "logging": {
                "level": "debug",
                "file": "/tmp/obs-mcp.log"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.obs.host, "192.168.1.20");
        assert_eq!(config.obs.port, 4456);
        assert_eq!(config.obs.password.as_deref(), Some("hunter2"));
        assert_eq!(config.obs.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.obs.url(), "ws://192.168.1.20:4456");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/obs-mcp.log")));
    }

    #[test]
    fn obs_config_defaults() {
        let config = ObsConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 4455);
        assert!(config.password.is_none());
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn url_brackets_ipv6_hosts() {
        let v6 = ObsConfig {
            host: "::1".to_string(),
            ..ObsConfig::default()
        };
        assert_eq!(v6.url(), "ws://[::1]:4455");

        let bracketed = ObsConfig {
            host: "[fe80::1]".to_string(),
            port: 4460,
            ..ObsConfig::default()
        };
        assert_eq!(bracketed.url(), "ws://[fe80::1]:4460");

        assert_eq!(ObsConfig::default().url(), "ws://localhost:4455");
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
        assert!(config.file.is_none());
    }

    #[test]
    fn debug_redacts_password() {
        let config = ObsConfig {
            password: Some("hunter2".to_string()),
            ..ObsConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn reject_zero_port() {
        let json = r#"{ "obs": { "port": 0 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_empty_host() {
        let json = r#"{ "obs": { "host": "  " } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_zero_timeout() {
        let json = r#"{ "obs": { "request_timeout_secs": 0 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_invalid_log_level() {
        let json = r#"{ "logging": { "level": "loud" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
