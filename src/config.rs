//! Kernel configuration.
//!
//! Every report records `params_hash()` so a diagnostic can be traced back
//! to the exact parameters that produced it.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::DEFAULT_CONFIG_VERSION;

/// Environment variable for the template seed.
pub const ENV_TEMPLATE_SEED: &str = "COPHYLO_TEMPLATE_SEED";
/// Environment variable for the resolution retry budget.
pub const ENV_MAX_RESOLUTION_ATTEMPTS: &str = "COPHYLO_MAX_RESOLUTION_ATTEMPTS";
/// Environment variable toggling outside tables in reports.
pub const ENV_INCLUDE_SUPERCOUNTS: &str = "COPHYLO_INCLUDE_SUPERCOUNTS";

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("Invalid value {value:?} for {variable}")]
    InvalidValue {
        /// Variable name.
        variable: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Parameters for counting and dating runs.
///
/// ## Parameters
///
/// - `template_seed`: seed for template sampling
/// - `max_resolution_attempts`: re-datings allowed per reconciliation
///   after cycle resolution (the kernel itself never loops)
/// - `include_supercounts`: whether count reports carry the outside table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Config version identifier.
    pub version: String,
    /// Seed for template sampling.
    pub template_seed: u64,
    /// Resolution retries per time-travelling reconciliation.
    pub max_resolution_attempts: usize,
    /// Include supercounts in count reports.
    pub include_supercounts: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CONFIG_VERSION.to_string(),
            template_seed: 0,
            max_resolution_attempts: 1,
            include_supercounts: true,
        }
    }
}

impl KernelConfig {
    /// Set the template seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.template_seed = seed;
        self
    }

    /// Set the resolution retry budget.
    pub fn with_max_resolution_attempts(mut self, attempts: usize) -> Self {
        self.max_resolution_attempts = attempts;
        self
    }

    /// Load from the environment, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TEMPLATE_SEED) {
            config.template_seed = parse_var(ENV_TEMPLATE_SEED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_RESOLUTION_ATTEMPTS) {
            config.max_resolution_attempts = parse_var(ENV_MAX_RESOLUTION_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_INCLUDE_SUPERCOUNTS) {
            config.include_supercounts = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        variable: ENV_INCLUDE_SUPERCOUNTS,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }

    /// Config identifier.
    pub fn config_id(&self) -> &str {
        &self.version
    }

    /// Canonical hash of all parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

fn parse_var<T: std::str::FromStr>(variable: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        variable,
        value: raw.to_string(),
    })
}
