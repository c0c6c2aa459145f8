//! Configuration and network-level metadata for the StartApp adapter

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mediation_adapter::{
    AdapterConfiguration, AdapterError, BaseAdapterConfig, HostContext, InitializationStatus,
    Result,
};

use crate::extras::keys;
use crate::init::{InitSettings, InitializationGuard};
use crate::sdk::StartAppSdk;

/// Network id reported to the mediation framework
pub const AD_NETWORK_ID: &str = "StartAppSDK";

/// Adapter name used in log events
pub const ADAPTER_NAME: &str = "StartappAdapter";

/// Build number appended to the adapter version
pub const DEFAULT_VERSION_CODE: u32 = 1;

/// Configuration specific to the StartApp adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartappAdapterConfig {
    /// Base adapter configuration
    #[serde(flatten)]
    pub base: BaseAdapterConfig,

    /// Let the SDK show its own consent dialog
    #[serde(default)]
    pub consent_enabled: bool,

    /// Keep the SDK splash screen
    #[serde(default)]
    pub splash_enabled: bool,

    /// Build number appended to the adapter version
    #[serde(default = "default_version_code")]
    pub adapter_version_code: u32,
}

fn default_version_code() -> u32 {
    DEFAULT_VERSION_CODE
}

impl Default for StartappAdapterConfig {
    fn default() -> Self {
        Self {
            base: BaseAdapterConfig {
                name: "startapp".to_string(),
                ..BaseAdapterConfig::default()
            },
            consent_enabled: false,
            splash_enabled: false,
            adapter_version_code: DEFAULT_VERSION_CODE,
        }
    }
}

impl StartappAdapterConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load from `STARTAPP_*` environment variables with defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let var = |suffix: &str| env::var(format!("STARTAPP_{}", suffix)).ok();

        let mut base = BaseAdapterConfig::from_env("STARTAPP");
        if var("NAME").is_none() {
            base.name = defaults.base.name;
        }

        let adapter_version_code = match var("VERSION_CODE") {
            Some(raw) => raw.parse().map_err(|_| {
                AdapterError::Configuration(format!("STARTAPP_VERSION_CODE is not a number: {}", raw))
            })?,
            None => defaults.adapter_version_code,
        };

        let config = Self {
            base,
            consent_enabled: var("CONSENT_ENABLED")
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(defaults.consent_enabled),
            splash_enabled: var("SPLASH_ENABLED")
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(defaults.splash_enabled),
            adapter_version_code,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.base.validate().map_err(AdapterError::Configuration)?;

        if self.adapter_version_code == 0 {
            return Err(AdapterError::Configuration(
                "Adapter version code must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Options for the one-time SDK initialization
    pub fn init_settings(&self) -> InitSettings {
        InitSettings {
            wrapper_name: self.base.wrapper_name.clone(),
            wrapper_version: self.base.wrapper_version.clone(),
            consent_enabled: self.consent_enabled,
            splash_enabled: self.splash_enabled,
        }
    }
}

/// Adapter version: the first three components of the SDK version, then the
/// version code. Shorter SDK versions are used whole.
pub fn adapter_version(sdk_version: &str, version_code: u32) -> String {
    let parts: Vec<&str> = sdk_version.split('.').collect();
    if parts.len() >= 3 {
        format!("{}.{}.{}.{}", parts[0], parts[1], parts[2], version_code)
    } else {
        format!("{}.{}", sdk_version, version_code)
    }
}

/// Network-level configuration the mediation framework queries and initializes
pub struct StartappConfig {
    sdk: Arc<dyn StartAppSdk>,
    config: StartappAdapterConfig,
    guard: &'static InitializationGuard,
}

impl StartappConfig {
    /// Configuration over `sdk` using the process-wide initialization guard
    pub fn new(sdk: Arc<dyn StartAppSdk>, config: StartappAdapterConfig) -> Self {
        Self::with_guard(sdk, config, InitializationGuard::global())
    }

    /// Configuration with an explicit initialization guard
    pub fn with_guard(
        sdk: Arc<dyn StartAppSdk>,
        config: StartappAdapterConfig,
        guard: &'static InitializationGuard,
    ) -> Self {
        Self { sdk, config, guard }
    }

    /// Adapter settings
    pub fn config(&self) -> &StartappAdapterConfig {
        &self.config
    }
}

impl AdapterConfiguration for StartappConfig {
    fn adapter_version(&self) -> String {
        adapter_version(&self.sdk.version(), self.config.adapter_version_code)
    }

    fn network_name(&self) -> &str {
        AD_NETWORK_ID
    }

    fn network_sdk_version(&self) -> String {
        self.sdk.version()
    }

    fn bidding_token(&self, _context: &HostContext) -> Option<String> {
        None
    }

    fn initialize_network(
        &self,
        context: &HostContext,
        configuration: Option<&HashMap<String, String>>,
    ) -> InitializationStatus {
        let app_id = configuration.and_then(|c| c.get(keys::APP_ID));

        match app_id {
            Some(app_id) => {
                let ran = self.guard.try_initialize(
                    self.sdk.as_ref(),
                    context,
                    Some(app_id.as_str()),
                    &self.config.init_settings(),
                );
                info!(ran, "StartApp network initialization finished");
                InitializationStatus::Success
            }
            None => {
                warn!("❌ StartApp network configuration has no {}", keys::APP_ID);
                InitializationStatus::ConfigurationError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulatedSdk;

    fn leaked_guard() -> &'static InitializationGuard {
        Box::leak(Box::new(InitializationGuard::new()))
    }

    #[test]
    fn test_adapter_version() {
        assert_eq!(adapter_version("4.6.3", 1), "4.6.3.1");
        assert_eq!(adapter_version("4.6.3.2", 5), "4.6.3.5");
        assert_eq!(adapter_version("4.6", 1), "4.6.1");
        assert_eq!(adapter_version("dev", 2), "dev.2");
    }

    #[test]
    fn test_config_from_toml() {
        let config = StartappAdapterConfig::from_toml_str(
            r#"
            name = "startapp-eu"
            enabled = true
            wrapper_name = "MoPub"
            wrapper_version = "5.13.1"
            consent_enabled = true
            adapter_version_code = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.base.name, "startapp-eu");
        assert_eq!(config.base.wrapper_version, "5.13.1");
        assert!(config.consent_enabled);
        assert!(!config.splash_enabled);
        assert_eq!(config.adapter_version_code, 3);
    }

    #[test]
    fn test_config_validation() {
        let mut config = StartappAdapterConfig::default();
        assert!(config.validate().is_ok());

        config.adapter_version_code = 0;
        assert!(config.validate().unwrap_err().is_configuration());

        assert!(StartappAdapterConfig::from_toml_str("adapter_version_code = \"x\"").is_err());
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("STARTAPP_CONSENT_ENABLED", "true");
        env::set_var("STARTAPP_VERSION_CODE", "7");

        let config = StartappAdapterConfig::from_env().unwrap();
        assert_eq!(config.base.name, "startapp");
        assert!(config.consent_enabled);
        assert_eq!(config.adapter_version_code, 7);

        env::set_var("STARTAPP_VERSION_CODE", "seven");
        assert!(StartappAdapterConfig::from_env().is_err());

        env::remove_var("STARTAPP_CONSENT_ENABLED");
        env::remove_var("STARTAPP_VERSION_CODE");
    }

    #[test]
    fn test_network_metadata() {
        let sdk = SimulatedSdk::with_version("4.6.3");
        let config =
            StartappConfig::with_guard(sdk, StartappAdapterConfig::default(), leaked_guard());

        assert_eq!(config.network_name(), "StartAppSDK");
        assert_eq!(config.network_sdk_version(), "4.6.3");
        assert_eq!(config.adapter_version(), "4.6.3.1");
        assert_eq!(config.bidding_token(&HostContext::application()), None);
    }

    #[test]
    fn test_initialize_network() {
        let sdk = SimulatedSdk::new();
        let guard = leaked_guard();
        let config = StartappConfig::with_guard(sdk.clone(), StartappAdapterConfig::default(), guard);
        let ctx = HostContext::application();

        assert_eq!(
            config.initialize_network(&ctx, None),
            InitializationStatus::ConfigurationError
        );
        assert_eq!(
            config.initialize_network(&ctx, Some(&HashMap::new())),
            InitializationStatus::ConfigurationError
        );
        assert!(!guard.is_initialized());

        let mut settings = HashMap::new();
        settings.insert(keys::APP_ID.to_string(), "200000001".to_string());
        assert_eq!(
            config.initialize_network(&ctx, Some(&settings)),
            InitializationStatus::Success
        );
        assert!(guard.is_initialized());
        assert_eq!(
            config.initialize_network(&ctx, Some(&settings)),
            InitializationStatus::Success
        );
    }
}
