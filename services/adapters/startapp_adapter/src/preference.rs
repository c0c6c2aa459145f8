//! Preference resolution
//!
//! Folds the publisher's local extras and the server extras into one immutable
//! [`Preference`]. Local values are applied first and remote values overlay them;
//! a remote value that cannot be decoded is reported as an [`ExtrasIssue`] and
//! treated as absent, so the local value (if any) survives.

use serde::Serialize;
use thiserror::Error;
use tracing::{trace, warn};

use crate::extras::{
    keys, GeoLocation, ImageSize, InterstitialMode, LocalExtras, LocalValue, RemoteExtras,
};

/// Whether the preference targets a native ad, and with which image sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PreferenceKind {
    /// Banner, interstitial or rewarded request
    Standard,
    /// Native request; sizes are [`ImageSize`] ordinals
    Native {
        /// Main image size ordinal
        primary_image_size: Option<u8>,
        /// Secondary image size ordinal
        secondary_image_size: Option<u8>,
    },
}

/// Fully resolved request parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preference {
    ad_tag: Option<String>,
    min_cpm: Option<f64>,
    mute_video: Option<bool>,
    banner_3d: Option<bool>,
    interstitial_mode: Option<InterstitialMode>,
    location: Option<GeoLocation>,
    app_id: Option<String>,
    kind: PreferenceKind,
}

impl Default for Preference {
    fn default() -> Self {
        Self {
            ad_tag: None,
            min_cpm: None,
            mute_video: None,
            banner_3d: None,
            interstitial_mode: None,
            location: None,
            app_id: None,
            kind: PreferenceKind::Standard,
        }
    }
}

impl Preference {
    /// Ad tag for reporting
    pub fn ad_tag(&self) -> Option<&str> {
        self.ad_tag.as_deref()
    }

    /// Minimum CPM floor; always finite and non-negative
    pub fn min_cpm(&self) -> Option<f64> {
        self.min_cpm
    }

    /// Mute video ads
    pub fn mute_video(&self) -> Option<bool> {
        self.mute_video
    }

    /// Explicit 3D banner flag
    pub fn banner_3d(&self) -> Option<bool> {
        self.banner_3d
    }

    /// Whether the 3D banner was requested
    pub fn wants_3d_banner(&self) -> bool {
        self.banner_3d.unwrap_or(false)
    }

    /// Interstitial mode; `None` leaves the choice to the SDK
    pub fn interstitial_mode(&self) -> Option<InterstitialMode> {
        self.interstitial_mode
    }

    /// Device location
    pub fn location(&self) -> Option<GeoLocation> {
        self.location
    }

    /// StartApp application id
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    /// Standard or native
    pub fn kind(&self) -> PreferenceKind {
        self.kind
    }

    /// Whether this is a native preference
    pub fn is_native(&self) -> bool {
        matches!(self.kind, PreferenceKind::Native { .. })
    }

    /// Native primary image size ordinal
    pub fn primary_image_size(&self) -> Option<u8> {
        match self.kind {
            PreferenceKind::Native {
                primary_image_size, ..
            } => primary_image_size,
            PreferenceKind::Standard => None,
        }
    }

    /// Native secondary image size ordinal
    pub fn secondary_image_size(&self) -> Option<u8> {
        match self.kind {
            PreferenceKind::Native {
                secondary_image_size,
                ..
            } => secondary_image_size,
            PreferenceKind::Standard => None,
        }
    }
}

/// A parameter that could not be used as given
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtrasIssue {
    /// Local value of the wrong type for its key
    #[error("local {key} expects {expected}, got {found}")]
    WrongLocalType {
        /// Key
        key: &'static str,
        /// Type the key requires
        expected: &'static str,
        /// Type that was supplied
        found: &'static str,
    },
    /// Remote number that did not parse
    #[error("{key} is not a number: {value:?}")]
    InvalidNumber {
        /// Key
        key: &'static str,
        /// Raw value
        value: String,
    },
    /// CPM that parsed but is negative or not finite
    #[error("minCPM must be finite and non-negative, got {value}")]
    InvalidCpm {
        /// Offending value
        value: f64,
    },
    /// Remote enumeration name that matched no variant
    #[error("{key} has unknown value {value:?}")]
    UnknownVariant {
        /// Key
        key: &'static str,
        /// Raw value
        value: String,
    },
}

impl ExtrasIssue {
    /// Key the issue concerns
    pub fn key(&self) -> &'static str {
        match self {
            ExtrasIssue::WrongLocalType { key, .. }
            | ExtrasIssue::InvalidNumber { key, .. }
            | ExtrasIssue::UnknownVariant { key, .. } => key,
            ExtrasIssue::InvalidCpm { .. } => keys::MIN_CPM,
        }
    }
}

/// Resolve the preference for one request. Never fails.
pub fn merge(local: &LocalExtras, remote: &RemoteExtras, is_native: bool) -> Preference {
    merge_with_diagnostics(local, remote, is_native).0
}

/// Resolve the preference and report every value that had to be ignored
pub fn merge_with_diagnostics(
    local: &LocalExtras,
    remote: &RemoteExtras,
    is_native: bool,
) -> (Preference, Vec<ExtrasIssue>) {
    trace!(?remote, "server extras");

    let mut merger = Merger {
        local,
        remote,
        issues: Vec::new(),
    };

    let mut ad_tag = merger.local_text(keys::AD_TAG);
    let mut mute_video = merger.local_bool(keys::MUTE_VIDEO);
    let mut banner_3d = merger.local_bool(keys::IS_3D_BANNER);
    let mut min_cpm = merger.local_cpm();
    let mut interstitial_mode = merger.local_mode();
    let mut primary_image_size = merger.local_size(keys::NATIVE_IMAGE_SIZE);
    let mut secondary_image_size = merger.local_size(keys::NATIVE_SECONDARY_IMAGE_SIZE);
    let location = merger.local_location();

    if let Some(tag) = remote.get(keys::AD_TAG) {
        ad_tag = (!tag.is_empty()).then(|| tag.clone());
    }
    if let Some(flag) = merger.remote_bool(keys::MUTE_VIDEO) {
        mute_video = Some(flag);
    }
    if let Some(flag) = merger.remote_bool(keys::IS_3D_BANNER) {
        banner_3d = Some(flag);
    }
    if let Some(cpm) = merger.remote_cpm() {
        min_cpm = Some(cpm);
    }
    if let Some(mode) = merger.remote_enum::<InterstitialMode>(keys::INTERSTITIAL_MODE) {
        interstitial_mode = Some(mode);
    }
    if let Some(size) = merger.remote_enum::<ImageSize>(keys::NATIVE_IMAGE_SIZE) {
        primary_image_size = Some(size);
    }
    if let Some(size) = merger.remote_enum::<ImageSize>(keys::NATIVE_SECONDARY_IMAGE_SIZE) {
        secondary_image_size = Some(size);
    }

    let app_id = remote
        .get(keys::APP_ID)
        .filter(|id| !id.is_empty())
        .cloned();

    let kind = if is_native {
        PreferenceKind::Native {
            primary_image_size: primary_image_size.map(|size| size.ordinal()),
            secondary_image_size: secondary_image_size.map(|size| size.ordinal()),
        }
    } else {
        PreferenceKind::Standard
    };

    let issues = merger.issues;
    for issue in &issues {
        warn!(key = issue.key(), "⚠️ Ignoring StartApp extra: {}", issue);
    }

    (
        Preference {
            ad_tag,
            min_cpm,
            mute_video,
            banner_3d,
            interstitial_mode,
            location,
            app_id,
            kind,
        },
        issues,
    )
}

struct Merger<'a> {
    local: &'a LocalExtras,
    remote: &'a RemoteExtras,
    issues: Vec<ExtrasIssue>,
}

impl<'a> Merger<'a> {
    fn wrong_type(&mut self, key: &'static str, expected: &'static str, found: &LocalValue) {
        self.issues.push(ExtrasIssue::WrongLocalType {
            key,
            expected,
            found: found.type_name(),
        });
    }

    fn local_text(&mut self, key: &'static str) -> Option<String> {
        match self.local.get(key)? {
            LocalValue::Text(text) => Some(text.clone()),
            other => {
                self.wrong_type(key, "text", other);
                None
            }
        }
    }

    fn local_bool(&mut self, key: &'static str) -> Option<bool> {
        match self.local.get(key)? {
            LocalValue::Bool(flag) => Some(*flag),
            other => {
                self.wrong_type(key, "bool", other);
                None
            }
        }
    }

    fn local_cpm(&mut self) -> Option<f64> {
        match self.local.get(keys::MIN_CPM)? {
            LocalValue::Double(value) => self.checked_cpm(*value),
            other => {
                self.wrong_type(keys::MIN_CPM, "double", other);
                None
            }
        }
    }

    fn local_mode(&mut self) -> Option<InterstitialMode> {
        match self.local.get(keys::INTERSTITIAL_MODE)? {
            LocalValue::Mode(mode) => Some(*mode),
            other => {
                self.wrong_type(keys::INTERSTITIAL_MODE, "interstitial mode", other);
                None
            }
        }
    }

    fn local_size(&mut self, key: &'static str) -> Option<ImageSize> {
        match self.local.get(key)? {
            LocalValue::Size(size) => Some(*size),
            other => {
                self.wrong_type(key, "image size", other);
                None
            }
        }
    }

    fn local_location(&mut self) -> Option<GeoLocation> {
        match self.local.get(keys::LOCATION)? {
            LocalValue::Location(location) => Some(*location),
            other => {
                self.wrong_type(keys::LOCATION, "location", other);
                None
            }
        }
    }

    fn remote_non_empty(&self, key: &str) -> Option<&'a str> {
        self.remote
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Lenient boolean: any non-empty value containing `true` is true
    fn remote_bool(&self, key: &str) -> Option<bool> {
        self.remote_non_empty(key).map(|value| value.contains("true"))
    }

    fn remote_cpm(&mut self) -> Option<f64> {
        let raw = self.remote_non_empty(keys::MIN_CPM)?;
        match raw.parse::<f64>() {
            Ok(value) => self.checked_cpm(value),
            Err(_) => {
                self.issues.push(ExtrasIssue::InvalidNumber {
                    key: keys::MIN_CPM,
                    value: raw.to_string(),
                });
                None
            }
        }
    }

    fn remote_enum<T: std::str::FromStr>(&mut self, key: &'static str) -> Option<T> {
        let raw = self.remote_non_empty(key)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.issues.push(ExtrasIssue::UnknownVariant {
                    key,
                    value: raw.to_string(),
                });
                None
            }
        }
    }

    fn checked_cpm(&mut self, value: f64) -> Option<f64> {
        if value.is_finite() && value >= 0.0 {
            Some(value)
        } else {
            self.issues.push(ExtrasIssue::InvalidCpm { value });
            None
        }
    }
}
