//! Service configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::state::AssignmentPolicy;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid GROUP_STAGE_BIND_ADDR {value:?}: {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("invalid GROUP_STAGE_ALLOW_WAITLIST_TO_SLOT {0:?}: expected true or false")]
    InvalidFlag(String),
}

/// Configuration for the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,

    /// Directory for session files. `None` keeps sessions in memory only.
    pub state_dir: Option<PathBuf>,

    /// Assignment policy applied to every session.
    pub policy: AssignmentPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceConfig {
    /// Creates a config with default values: listen on port 3000, in-memory
    /// sessions, default policy.
    pub fn new() -> Self {
        ServiceConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            state_dir: None,
            policy: AssignmentPolicy::default(),
        }
    }

    /// Reads configuration from environment variables.
    ///
    /// - `GROUP_STAGE_BIND_ADDR` (default `0.0.0.0:3000`)
    /// - `GROUP_STAGE_STATE_DIR` (optional; enables file-backed sessions)
    /// - `GROUP_STAGE_ALLOW_WAITLIST_TO_SLOT` (default `false`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(value) = lookup("GROUP_STAGE_BIND_ADDR") {
            config.bind_addr = value
                .parse()
                .map_err(|source| ConfigError::InvalidBindAddr {
                    value: value.clone(),
                    source,
                })?;
        }

        config.state_dir = lookup("GROUP_STAGE_STATE_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if let Some(value) = lookup("GROUP_STAGE_ALLOW_WAITLIST_TO_SLOT") {
            config.policy.allow_waitlist_to_slot = match value.trim() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(ConfigError::InvalidFlag(value)),
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServiceConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ServiceConfig::new());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
    }

    #[test]
    fn reads_all_variables() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("GROUP_STAGE_BIND_ADDR", "127.0.0.1:8080"),
            ("GROUP_STAGE_STATE_DIR", "/var/lib/group-stage"),
            ("GROUP_STAGE_ALLOW_WAITLIST_TO_SLOT", "true"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.state_dir, Some(PathBuf::from("/var/lib/group-stage")));
        assert!(config.policy.allow_waitlist_to_slot);
    }

    #[test]
    fn blank_state_dir_means_memory_only() {
        let config =
            ServiceConfig::from_lookup(lookup_from(&[("GROUP_STAGE_STATE_DIR", "  ")])).unwrap();
        assert_eq!(config.state_dir, None);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            ServiceConfig::from_lookup(lookup_from(&[("GROUP_STAGE_BIND_ADDR", "nope")])),
            Err(ConfigError::InvalidBindAddr { .. })
        ));
        assert!(matches!(
            ServiceConfig::from_lookup(lookup_from(&[(
                "GROUP_STAGE_ALLOW_WAITLIST_TO_SLOT",
                "maybe"
            )])),
            Err(ConfigError::InvalidFlag(_))
        ));
    }
}
