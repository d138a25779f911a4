//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::game::{HitWindowConfig, MismatchPolicy, SessionConfig};
use crate::relay::RelayServerConfig;
use crate::util::rate_limit::RELAY_RATE_LIMIT;
use crate::util::time::{
    ACCEPT_POLL_MS, CONTROLLER_TIMEOUT_MS, EVALUATION_TIMEOUT_MS, HIT_POLL_MS, HIT_WINDOW_MS,
};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Relay ingest binding address
    pub relay_addr: SocketAddr,
    /// Status HTTP binding address
    pub status_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,

    pub hit_window: Duration,
    pub hit_poll: Duration,
    pub mismatch_policy: MismatchPolicy,

    pub controller_timeout: Duration,
    pub evaluation_timeout: Duration,

    pub accept_poll: Duration,
    /// Relay frames accepted per second per connection
    pub relay_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // PORT wins over STATUS_ADDR so hosted deployments work unchanged
        let status_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port.trim()),
            None => lookup("STATUS_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };
        let relay_addr = lookup("RELAY_ADDR").unwrap_or_else(|| "0.0.0.0:8888".to_string());

        let policy = match lookup("SHOT_MISMATCH_POLICY") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "SHOT_MISMATCH_POLICY",
                value: raw,
            })?,
            None => MismatchPolicy::default(),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => false,
            Some("json") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            relay_addr: parse_addr("RELAY_ADDR", relay_addr)?,
            status_addr: parse_addr("STATUS_ADDR", status_addr)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: log_format,

            hit_window: millis(&lookup, "HIT_WINDOW_MS", HIT_WINDOW_MS)?,
            hit_poll: millis(&lookup, "HIT_POLL_MS", HIT_POLL_MS)?,
            mismatch_policy: policy,

            controller_timeout: millis(&lookup, "CONTROLLER_TIMEOUT_MS", CONTROLLER_TIMEOUT_MS)?,
            evaluation_timeout: millis(&lookup, "EVALUATION_TIMEOUT_MS", EVALUATION_TIMEOUT_MS)?,

            accept_poll: millis(&lookup, "ACCEPT_POLL_MS", ACCEPT_POLL_MS)?,
            relay_rate_limit: number(&lookup, "RELAY_RATE_LIMIT", RELAY_RATE_LIMIT)?,
        })
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            controller_timeout: self.controller_timeout,
            evaluation_timeout: self.evaluation_timeout,
            hit_window: HitWindowConfig::new(self.hit_window, self.hit_poll, self.mismatch_policy),
        }
    }

    pub fn relay(&self) -> RelayServerConfig {
        RelayServerConfig {
            accept_poll: self.accept_poll,
            rate_limit: self.relay_rate_limit,
        }
    }
}

fn parse_addr(key: &'static str, value: String) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidAddress { key, value })
}

fn number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn millis<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ms: u64 = number(lookup, key, default)?;
    if ms == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid address for {key}: {value:?}")]
    InvalidAddress { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.relay_addr, "0.0.0.0:8888".parse().unwrap());
        assert_eq!(config.status_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.hit_window, Duration::from_secs(1));
        assert_eq!(config.hit_poll, Duration::from_millis(50));
        assert_eq!(config.mismatch_policy, MismatchPolicy::Retain);
        assert_eq!(config.controller_timeout, Duration::from_secs(30));
        assert_eq!(config.evaluation_timeout, Duration::from_secs(30));
        assert_eq!(config.relay_rate_limit, 200);
        assert_eq!(config.session().hit_window.retention, Duration::from_secs(2));
    }

    #[test]
    fn port_overrides_status_addr() {
        let config = load(&[("PORT", "9000"), ("STATUS_ADDR", "127.0.0.1:1")]).unwrap();
        assert_eq!(config.status_addr, "0.0.0.0:9000".parse().unwrap());
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("RELAY_ADDR", "127.0.0.1:7000"),
            ("HIT_WINDOW_MS", "250"),
            ("SHOT_MISMATCH_POLICY", "drop"),
            ("RELAY_RATE_LIMIT", "20"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.relay_addr.port(), 7000);
        assert_eq!(config.hit_window, Duration::from_millis(250));
        assert_eq!(config.mismatch_policy, MismatchPolicy::Drop);
        assert_eq!(config.relay().rate_limit, 20);
        assert!(config.log_json);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            load(&[("HIT_WINDOW_MS", "soon")]),
            Err(ConfigError::Invalid { key: "HIT_WINDOW_MS", .. })
        ));
        assert!(matches!(
            load(&[("ACCEPT_POLL_MS", "0")]),
            Err(ConfigError::Invalid { key: "ACCEPT_POLL_MS", .. })
        ));
        assert!(matches!(
            load(&[("SHOT_MISMATCH_POLICY", "requeue")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            load(&[("RELAY_ADDR", "nowhere")]),
            Err(ConfigError::InvalidAddress { key: "RELAY_ADDR", .. })
        ));
    }
}
