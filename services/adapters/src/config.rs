//! Configuration module for adapters
//!
//! Provides file- and environment-based configuration shared by all network adapters

use std::env;

use serde::{Deserialize, Serialize};

/// Base configuration shared by all adapters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseAdapterConfig {
    /// Adapter name/identifier
    pub name: String,

    /// Whether this adapter is enabled
    pub enabled: bool,

    /// Name of the mediation platform reported to the network SDK
    pub wrapper_name: String,

    /// Version of the mediation platform wrapper reported to the network SDK
    pub wrapper_version: String,
}

impl Default for BaseAdapterConfig {
    fn default() -> Self {
        Self {
            name: "adapter".to_string(),
            enabled: true,
            wrapper_name: "MoPub".to_string(),
            wrapper_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl BaseAdapterConfig {
    /// Load configuration from `<PREFIX>_*` environment variables with defaults
    pub fn from_env(prefix: &str) -> Self {
        let defaults = Self::default();
        let var = |suffix: &str| env::var(format!("{}_{}", prefix, suffix)).ok();

        Self {
            name: var("NAME").unwrap_or(defaults.name),
            enabled: var("ENABLED")
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(defaults.enabled),
            wrapper_name: var("WRAPPER_NAME").unwrap_or(defaults.wrapper_name),
            wrapper_version: var("WRAPPER_VERSION").unwrap_or(defaults.wrapper_version),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Adapter name cannot be empty".to_string());
        }

        if self.wrapper_name.is_empty() {
            return Err("Wrapper name cannot be empty".to_string());
        }

        if self.wrapper_version.is_empty() {
            return Err("Wrapper version cannot be empty".to_string());
        }

        Ok(())
    }
}
