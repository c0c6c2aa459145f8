//! # Common Adapter Infrastructure
//!
//! Trait definitions every network adapter implements so that the mediation
//! framework can drive it without knowing which network is behind it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{AdData, BannerContainer, HostContext, MediationListener};

// ============================================================================
// CORE TRAITS
// ============================================================================

/// Lifecycle contract for one ad placement.
///
/// The framework calls [`BaseAd::check_and_initialize_sdk`] before the first
/// load, then alternates `load`/`show` and finally `invalidate`. None of these
/// block: outcomes are reported exclusively through the listener given to
/// [`BaseAd::load`].
pub trait BaseAd: Send {
    /// Network identifier used in log events
    fn ad_network_id(&self) -> &str;

    /// Initialize the network SDK if this is the first use in the process.
    ///
    /// Returns true only when this call performed the initialization.
    fn check_and_initialize_sdk(&self, context: &HostContext, ad_data: &AdData) -> bool;

    /// Attach the interaction listener. A listener passed to `load` replaces it.
    fn set_listener(&mut self, listener: Arc<dyn MediationListener>);

    /// Start loading an ad; the listener receives every outcome of the cycle
    fn load(
        &mut self,
        context: &HostContext,
        ad_data: &AdData,
        listener: Arc<dyn MediationListener>,
    );

    /// Show the loaded ad. Banners render on load and ignore this call.
    fn show(&mut self);

    /// Release the current ad and detach the listener. Safe to call repeatedly.
    /// A listener attached afterwards receives outcomes again.
    fn invalidate(&mut self);

    /// View the framework should attach for banner formats
    fn ad_view(&self) -> Option<Arc<BannerContainer>>;
}

/// Outcome of network-wide initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitializationStatus {
    /// The network is initialized or will be shortly
    Success,
    /// The configuration lacked what the network needs
    ConfigurationError,
}

/// Network-level metadata and initialization, independent of any placement
pub trait AdapterConfiguration: Send + Sync {
    /// Version of the adapter itself
    fn adapter_version(&self) -> String;

    /// Name the framework uses for this network
    fn network_name(&self) -> &str;

    /// Version of the wrapped network SDK
    fn network_sdk_version(&self) -> String;

    /// Token for header bidding; `None` when the network does not bid
    fn bidding_token(&self, context: &HostContext) -> Option<String>;

    /// Initialize the network from framework configuration
    fn initialize_network(
        &self,
        context: &HostContext,
        configuration: Option<&HashMap<String, String>>,
    ) -> InitializationStatus;
}
