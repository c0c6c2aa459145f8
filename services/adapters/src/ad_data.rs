//! Request data handed to an adapter for one load

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known keys the framework places in the server extras
pub mod data_keys {
    /// Ad unit format string, e.g. `"320x50_mopub_banner"`
    pub const ADUNIT_FORMAT: &str = "adunit_format";
}

/// Kind of host the adapter is loading into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostKind {
    /// A foreground activity that can own views
    Activity,
    /// An application-level context without a window
    Application,
}

/// Platform context passed through to the network SDK
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostContext {
    kind: HostKind,
    density: f32,
}

impl HostContext {
    /// Activity context with the given display density
    pub fn activity(density: f32) -> Self {
        Self {
            kind: HostKind::Activity,
            density,
        }
    }

    /// Application context with unit density
    pub fn application() -> Self {
        Self {
            kind: HostKind::Application,
            density: 1.0,
        }
    }

    /// Host kind
    pub fn kind(&self) -> HostKind {
        self.kind
    }

    /// Whether views can be created against this context
    pub fn is_activity(&self) -> bool {
        self.kind == HostKind::Activity
    }

    /// Display density (pixels per dp)
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Convert density-independent pixels to physical pixels, rounding half up
    pub fn dp_to_px(&self, dp: u32) -> u32 {
        (dp as f32 * self.density + 0.5) as u32
    }
}

/// Everything the framework knows about one ad request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdData {
    extras: HashMap<String, String>,
    ad_width: Option<u32>,
    ad_height: Option<u32>,
    rewarded: bool,
}

impl AdData {
    /// Request with the given server extras
    pub fn new(extras: HashMap<String, String>) -> Self {
        Self {
            extras,
            ..Self::default()
        }
    }

    /// Set the ad unit format string
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.extras
            .insert(data_keys::ADUNIT_FORMAT.to_string(), format.into());
        self
    }

    /// Set the requested banner size in dp
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.ad_width = Some(width);
        self.ad_height = Some(height);
        self
    }

    /// Mark the request as rewarded
    pub fn with_rewarded(mut self, rewarded: bool) -> Self {
        self.rewarded = rewarded;
        self
    }

    /// Add one server extra
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Server-delivered extras, all values as strings
    pub fn extras(&self) -> &HashMap<String, String> {
        &self.extras
    }

    /// Ad unit format string; empty when the framework did not provide one
    pub fn ad_unit_format(&self) -> &str {
        self.extras
            .get(data_keys::ADUNIT_FORMAT)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Requested width in dp
    pub fn ad_width(&self) -> Option<u32> {
        self.ad_width
    }

    /// Requested height in dp
    pub fn ad_height(&self) -> Option<u32> {
        self.ad_height
    }

    /// Whether the request is for a rewarded ad
    pub fn is_rewarded(&self) -> bool {
        self.rewarded
    }
}
