//! Manager and runtime configuration
//!
//! [`ManagerConfig`] is the immutable creation-time description of one
//! manager instance. [`RuntimeConfig`] governs the process hosting managers
//! (log filter, default delay, clock source) and follows the usual layering:
//! defaults, then a TOML file, then `ROLMANAGER_*` environment variables,
//! then validation.

use crate::errors::{ManagerError, Result};
use crate::identifiers::{Address, RoleId};
use crate::time::{whole_seconds, Clock, SimulatedClock, SystemClock, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "ROLMANAGER_";

/// Creation-time configuration of a manager instance
///
/// `roles` and `principals` are parallel sequences: the i-th role is granted
/// to the i-th principal. The minimum delay never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Minimum delay between proposal and execution, in seconds
    pub min_delay_secs: u64,
    /// Display name
    pub name: String,
    /// Principal granted ADMIN before any bootstrap pair
    pub admin: Address,
    /// Bootstrap roles, parallel to `principals`
    #[serde(default)]
    pub roles: Vec<RoleId>,
    /// Bootstrap principals, parallel to `roles`
    #[serde(default)]
    pub principals: Vec<Address>,
}

impl ManagerConfig {
    /// Create a configuration
    ///
    /// Fails with `FractionalDelay` if `min_delay` has a sub-second part.
    pub fn new(
        min_delay: Duration,
        name: impl Into<String>,
        admin: Address,
        roles: Vec<RoleId>,
        principals: Vec<Address>,
    ) -> Result<Self> {
        Ok(Self {
            min_delay_secs: whole_seconds(min_delay)?.as_secs(),
            name: name.into(),
            admin,
            roles,
            principals,
        })
    }

    /// Minimum delay as a duration
    pub fn min_delay(&self) -> Duration {
        Duration::from_secs(self.min_delay_secs)
    }

    /// Reject unequal bootstrap sequences
    pub fn validate(&self) -> Result<()> {
        if self.roles.len() != self.principals.len() {
            return Err(ManagerError::LengthMismatch {
                roles: self.roles.len(),
                principals: self.principals.len(),
            });
        }
        Ok(())
    }

    /// Bootstrap pairs in grant order
    pub fn bootstrap_pairs(&self) -> impl Iterator<Item = (RoleId, Address)> + '_ {
        self.roles
            .iter()
            .copied()
            .zip(self.principals.iter().copied())
    }
}

/// Clock source selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClockConfig {
    /// Wall clock
    System,
    /// Simulated clock starting at `start_secs`
    Simulated {
        /// Initial simulated time
        #[serde(default)]
        start_secs: u64,
    },
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::System
    }
}

impl ClockConfig {
    /// Build the configured clock
    pub fn build(&self) -> Arc<dyn Clock> {
        match self {
            ClockConfig::System => Arc::new(SystemClock),
            ClockConfig::Simulated { start_secs } => {
                Arc::new(SimulatedClock::new(Timestamp(*start_secs)))
            }
        }
    }
}

/// Process-level configuration for hosting managers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// `tracing_subscriber` env-filter directive
    pub log_filter: String,
    /// Minimum delay used when a request does not specify one
    pub default_min_delay_secs: u64,
    /// Clock source
    pub clock: ClockConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            default_min_delay_secs: 0,
            clock: ClockConfig::System,
        }
    }
}

impl RuntimeConfig {
    /// Load from a TOML file; missing keys keep their defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ManagerError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: RuntimeConfig = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded runtime config");
        Ok(config)
    }

    /// Overlay `ROLMANAGER_*` variables from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Overlay `ROLMANAGER_*` variables from an explicit set
    ///
    /// Recognised keys: `LOG_FILTER`, `DEFAULT_MIN_DELAY_SECS`, `CLOCK`
    /// (`system` or `simulated`) and `CLOCK_START_SECS`.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut clock_mode: Option<String> = None;
        let mut clock_start: Option<u64> = None;

        for (key, value) in vars {
            let Some(key) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match key {
                "LOG_FILTER" => self.log_filter = value.to_string(),
                "DEFAULT_MIN_DELAY_SECS" => {
                    self.default_min_delay_secs = parse_secs(key, value)?;
                }
                "CLOCK" => clock_mode = Some(value.to_ascii_lowercase()),
                "CLOCK_START_SECS" => clock_start = Some(parse_secs(key, value)?),
                _ => tracing::debug!(key, "ignoring unknown environment override"),
            }
        }

        match clock_mode.as_deref() {
            Some("system") => self.clock = ClockConfig::System,
            Some("simulated") => {
                self.clock = ClockConfig::Simulated {
                    start_secs: clock_start.unwrap_or(0),
                };
            }
            Some(other) => {
                return Err(ManagerError::config(format!("Unknown clock mode: {other}")));
            }
            None => {
                if let (Some(start), ClockConfig::Simulated { start_secs }) =
                    (clock_start, &mut self.clock)
                {
                    *start_secs = start;
                }
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.log_filter.trim().is_empty() {
            return Err(ManagerError::config("log_filter must not be empty"));
        }
        Ok(())
    }

    /// Default minimum delay as a duration
    pub fn default_min_delay(&self) -> Duration {
        Duration::from_secs(self.default_min_delay_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| ManagerError::config(format!("{ENV_PREFIX}{key}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config(roles: usize, principals: usize) -> ManagerConfig {
        ManagerConfig::new(
            Duration::from_secs(40),
            "My failSafe",
            Address::from_label("admin"),
            vec![RoleId::from_name("PROPOSER_ROLE"); roles],
            vec![Address::from_label("proposer"); principals],
        )
        .unwrap()
    }

    #[test]
    fn test_manager_config_rejects_unequal_sequences() {
        assert_eq!(
            config(2, 1).validate(),
            Err(ManagerError::LengthMismatch {
                roles: 2,
                principals: 1
            })
        );
        assert!(config(0, 0).validate().is_ok());
        assert_eq!(config(3, 3).bootstrap_pairs().count(), 3);
    }

    #[test]
    fn test_manager_config_rejects_fractional_min_delay() {
        let result = ManagerConfig::new(
            Duration::from_millis(1500),
            "fractional",
            Address::from_label("admin"),
            vec![],
            vec![],
        );
        assert_eq!(
            result,
            Err(ManagerError::FractionalDelay {
                delay: Duration::from_millis(1500)
            })
        );
    }

    #[test]
    fn test_runtime_config_from_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_min_delay_secs = 40").unwrap();
        writeln!(file, "[clock]").unwrap();
        writeln!(file, "mode = \"simulated\"").unwrap();
        writeln!(file, "start_secs = 1000").unwrap();

        let config = RuntimeConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.default_min_delay(), Duration::from_secs(40));
        assert_eq!(config.clock, ClockConfig::Simulated { start_secs: 1000 });
        assert_eq!(config.clock.build().now(), Timestamp(1000));
    }

    #[test]
    fn test_runtime_config_missing_file() {
        let err = RuntimeConfig::load_from_file(Path::new("/nonexistent/rolmanager.toml"))
            .unwrap_err();
        assert!(matches!(err, ManagerError::Config { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RuntimeConfig::default();
        config
            .merge_with_vars([
                ("ROLMANAGER_LOG_FILTER", "debug"),
                ("ROLMANAGER_CLOCK", "Simulated"),
                ("ROLMANAGER_CLOCK_START_SECS", "77"),
                ("HOME", "/root"),
            ])
            .unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.clock, ClockConfig::Simulated { start_secs: 77 });
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let mut config = RuntimeConfig::default();
        assert!(config
            .merge_with_vars([("ROLMANAGER_DEFAULT_MIN_DELAY_SECS", "soon")])
            .is_err());
        assert!(config
            .merge_with_vars([("ROLMANAGER_CLOCK", "sundial")])
            .is_err());
    }

    #[test]
    fn test_validate_rejects_empty_filter() {
        let config = RuntimeConfig {
            log_filter: "  ".to_string(),
            ..RuntimeConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
