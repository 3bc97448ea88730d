use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

use crate::preferences::Theme;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be true or false, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },

    #[error("invalid HOST {0:?}")]
    InvalidHost(String),

    #[error("unknown theme {0:?}")]
    InvalidTheme(String),
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Simulated service latencies. Each stands in for a call to a real backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    pub document_processing: Duration,
    pub lookup: Duration,
    pub refresh: Duration,
    pub submission: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            document_processing: Duration::from_millis(2000),
            lookup: Duration::from_millis(1500),
            refresh: Duration::from_millis(1000),
            submission: Duration::from_millis(3000),
        }
    }
}

impl Timings {
    /// All delays zero; handy for tests and demos.
    pub fn instant() -> Self {
        Self {
            document_processing: Duration::ZERO,
            lookup: Duration::ZERO,
            refresh: Duration::ZERO,
            submission: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub max_recording_secs: u32,
    /// Whether the built-in synthetic camera grants access.
    pub camera_available: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_recording_secs: 30,
            camera_available: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub storage_key: String,
    pub default_theme: Theme,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: "sc-ui-theme".to_string(),
            default_theme: Theme::System,
        }
    }
}

/// Identity of the signed-in applicant, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserConfig {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub timings: Timings,
    pub capture: CaptureConfig,
    pub theme: ThemeConfig,
    pub user: Option<UserConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_format: LogFormat::Json,
            timings: Timings::default(),
            capture: CaptureConfig::default(),
            theme: ThemeConfig::default(),
            user: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(port) = var("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidNumber {
                key: "PORT",
                value: port,
            })?;
        }
        if let Some(format) = var("LOG_FORMAT") {
            config.log_format = match format.as_str() {
                "pretty" => LogFormat::Pretty,
                _ => LogFormat::Json,
            };
        }

        let millis = |key: &'static str, current: Duration| -> Result<Duration, ConfigError> {
            match var(key) {
                Some(value) => value
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| ConfigError::InvalidNumber { key, value }),
                None => Ok(current),
            }
        };
        config.timings.document_processing =
            millis("DOCUMENT_PROCESSING_MS", config.timings.document_processing)?;
        config.timings.lookup = millis("LOOKUP_DELAY_MS", config.timings.lookup)?;
        config.timings.refresh = millis("REFRESH_DELAY_MS", config.timings.refresh)?;
        config.timings.submission = millis("SUBMISSION_DELAY_MS", config.timings.submission)?;

        if let Some(secs) = var("MAX_RECORDING_SECS") {
            config.capture.max_recording_secs =
                secs.parse().map_err(|_| ConfigError::InvalidNumber {
                    key: "MAX_RECORDING_SECS",
                    value: secs,
                })?;
        }
        if let Some(flag) = var("CAMERA_AVAILABLE") {
            config.capture.camera_available = match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidFlag {
                        key: "CAMERA_AVAILABLE",
                        value: flag,
                    });
                }
            };
        }

        if let Some(key) = var("THEME_STORAGE_KEY") {
            config.theme.storage_key = key;
        }
        if let Some(theme) = var("DEFAULT_THEME") {
            config.theme.default_theme =
                Theme::parse(&theme).ok_or(ConfigError::InvalidTheme(theme))?;
        }

        config.user = var("LOAN_CONDUCTOR_USER")
            .filter(|id| !id.trim().is_empty())
            .map(|id| UserConfig {
                id,
                email: var("LOAN_CONDUCTOR_USER_EMAIL"),
            });

        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_simulated_latencies() {
        let config = AppConfig::from_vars(vars(&[])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.timings.document_processing, Duration::from_millis(2000));
        assert_eq!(config.timings.lookup, Duration::from_millis(1500));
        assert_eq!(config.timings.submission, Duration::from_millis(3000));
        assert_eq!(config.capture.max_recording_secs, 30);
        assert_eq!(config.theme.storage_key, "sc-ui-theme");
        assert_eq!(config.theme.default_theme, Theme::System);
        assert!(config.user.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_vars(vars(&[
            ("PORT", "8080"),
            ("LOOKUP_DELAY_MS", "10"),
            ("CAMERA_AVAILABLE", "false"),
            ("DEFAULT_THEME", "dark"),
            ("LOAN_CONDUCTOR_USER", "user-42"),
            ("LOG_FORMAT", "pretty"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.timings.lookup, Duration::from_millis(10));
        assert!(!config.capture.camera_available);
        assert_eq!(config.theme.default_theme, Theme::Dark);
        assert_eq!(config.user.unwrap().id, "user-42");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_vars(vars(&[("PORT", "eighty")])),
            Err(ConfigError::InvalidNumber { key: "PORT", .. })
        ));
        assert!(matches!(
            AppConfig::from_vars(vars(&[("DEFAULT_THEME", "sepia")])),
            Err(ConfigError::InvalidTheme(_))
        ));
    }

    #[test]
    fn localhost_resolves_to_loopback() {
        let config = AppConfig {
            host: "localhost".to_string(),
            port: 4000,
            ..AppConfig::default()
        };
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:4000");
    }
}
