//! Parameter sources for a StartApp request
//!
//! Two maps feed every request: typed local extras the publisher registers with
//! the adapter, and string-valued extras the mediation server delivers with each
//! ad unit. This module defines both shapes and the vocabulary they share; the
//! merge itself lives in [`crate::preference`].

use std::collections::HashMap;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mediation_adapter::Result;

/// Keys recognized in either parameter map
pub mod keys {
    /// Ad tag (string)
    pub const AD_TAG: &str = "adTag";
    /// Interstitial display mode (`OFFERWALL`, `VIDEO`, `OVERLAY`)
    pub const INTERSTITIAL_MODE: &str = "interstitialMode";
    /// Minimum CPM (decimal)
    pub const MIN_CPM: &str = "minCPM";
    /// Mute video ads (boolean)
    pub const MUTE_VIDEO: &str = "muteVideo";
    /// Use the 3D banner (boolean)
    pub const IS_3D_BANNER: &str = "is3DBanner";
    /// Native primary image size (size name)
    pub const NATIVE_IMAGE_SIZE: &str = "nativeImageSize";
    /// Native secondary image size (size name)
    pub const NATIVE_SECONDARY_IMAGE_SIZE: &str = "nativeSecondaryImageSize";
    /// StartApp application id, server extras only
    pub const APP_ID: &str = "startappAppId";
    /// Geolocation, local extras only
    pub const LOCATION: &str = "location";
}

/// Name that did not match any variant of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown variant {0:?}")]
pub struct UnknownVariant(pub String);

/// How an interstitial is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterstitialMode {
    /// Offer wall
    #[serde(rename = "OFFERWALL")]
    Offerwall,
    /// Full-screen video
    #[serde(rename = "VIDEO")]
    Video,
    /// Overlay
    #[serde(rename = "OVERLAY")]
    Overlay,
}

impl InterstitialMode {
    /// Every mode, in declaration order
    pub const ALL: [InterstitialMode; 3] = [
        InterstitialMode::Offerwall,
        InterstitialMode::Video,
        InterstitialMode::Overlay,
    ];

    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            InterstitialMode::Offerwall => "OFFERWALL",
            InterstitialMode::Video => "VIDEO",
            InterstitialMode::Overlay => "OVERLAY",
        }
    }
}

impl FromStr for InterstitialMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Native image size classes. The SDK takes the ordinal, not the name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ImageSize {
    /// 72x72
    #[serde(rename = "SIZE72X72")]
    Size72x72 = 0,
    /// 100x100
    #[serde(rename = "SIZE100X100")]
    Size100x100 = 1,
    /// 150x150
    #[serde(rename = "SIZE150X150")]
    Size150x150 = 2,
    /// 340x340
    #[serde(rename = "SIZE340X340")]
    Size340x340 = 3,
    /// 1200x628
    #[serde(rename = "SIZE1200X628")]
    Size1200x628 = 4,
    /// 320x480
    #[serde(rename = "SIZE320X480")]
    Size320x480 = 5,
    /// 480x320
    #[serde(rename = "SIZE480X320")]
    Size480x320 = 6,
}

impl ImageSize {
    /// Every size, in ordinal order
    pub const ALL: [ImageSize; 7] = [
        ImageSize::Size72x72,
        ImageSize::Size100x100,
        ImageSize::Size150x150,
        ImageSize::Size340x340,
        ImageSize::Size1200x628,
        ImageSize::Size320x480,
        ImageSize::Size480x320,
    ];

    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            ImageSize::Size72x72 => "SIZE72X72",
            ImageSize::Size100x100 => "SIZE100X100",
            ImageSize::Size150x150 => "SIZE150X150",
            ImageSize::Size340x340 => "SIZE340X340",
            ImageSize::Size1200x628 => "SIZE1200X628",
            ImageSize::Size320x480 => "SIZE320X480",
            ImageSize::Size480x320 => "SIZE480X320",
        }
    }

    /// Position in the enumeration, as the SDK expects it
    pub fn ordinal(&self) -> u8 {
        u8::from(*self)
    }
}

impl FromStr for ImageSize {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.name() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
}

impl GeoLocation {
    /// New location
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Typed value in the local extras map
#[derive(Debug, Clone, PartialEq)]
pub enum LocalValue {
    /// String value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Floating point value
    Double(f64),
    /// Interstitial mode
    Mode(InterstitialMode),
    /// Native image size
    Size(ImageSize),
    /// Device location
    Location(GeoLocation),
}

impl LocalValue {
    /// Short type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            LocalValue::Text(_) => "text",
            LocalValue::Bool(_) => "bool",
            LocalValue::Double(_) => "double",
            LocalValue::Mode(_) => "interstitial mode",
            LocalValue::Size(_) => "image size",
            LocalValue::Location(_) => "location",
        }
    }
}

/// Process-local extras, registered by the publisher as mediation settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalExtras {
    values: HashMap<String, LocalValue>,
}

impl LocalExtras {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a builder
    pub fn builder() -> LocalExtrasBuilder {
        LocalExtrasBuilder::default()
    }

    /// Insert a raw value under any key
    pub fn insert(&mut self, key: impl Into<String>, value: LocalValue) -> Option<LocalValue> {
        self.values.insert(key.into(), value)
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&LocalValue> {
        self.values.get(key)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fluent construction of [`LocalExtras`] with the recognized keys
#[derive(Debug, Default)]
pub struct LocalExtrasBuilder {
    extras: LocalExtras,
}

impl LocalExtrasBuilder {
    /// Ad tag for reporting
    pub fn ad_tag(mut self, ad_tag: impl Into<String>) -> Self {
        self.extras
            .insert(keys::AD_TAG, LocalValue::Text(ad_tag.into()));
        self
    }

    /// Interstitial display mode
    pub fn interstitial_mode(mut self, mode: InterstitialMode) -> Self {
        self.extras
            .insert(keys::INTERSTITIAL_MODE, LocalValue::Mode(mode));
        self
    }

    /// Minimum CPM floor
    pub fn min_cpm(mut self, cpm: f64) -> Self {
        self.extras.insert(keys::MIN_CPM, LocalValue::Double(cpm));
        self
    }

    /// Mute video ads
    pub fn mute_video(mut self) -> Self {
        self.extras.insert(keys::MUTE_VIDEO, LocalValue::Bool(true));
        self
    }

    /// Use the 3D banner for banner placements
    pub fn enable_3d_banner(mut self) -> Self {
        self.extras
            .insert(keys::IS_3D_BANNER, LocalValue::Bool(true));
        self
    }

    /// Native primary image size
    pub fn native_image_size(mut self, size: ImageSize) -> Self {
        self.extras
            .insert(keys::NATIVE_IMAGE_SIZE, LocalValue::Size(size));
        self
    }

    /// Native secondary image size
    pub fn native_secondary_image_size(mut self, size: ImageSize) -> Self {
        self.extras
            .insert(keys::NATIVE_SECONDARY_IMAGE_SIZE, LocalValue::Size(size));
        self
    }

    /// Device location
    pub fn location(mut self, location: GeoLocation) -> Self {
        self.extras
            .insert(keys::LOCATION, LocalValue::Location(location));
        self
    }

    /// Finish
    pub fn build(self) -> LocalExtras {
        self.extras
    }
}

/// Server-delivered extras; every value is a string that still needs parsing
pub type RemoteExtras = HashMap<String, String>;

/// Decode server extras delivered as a flat JSON object of strings
pub fn remote_extras_from_json(json: &str) -> Result<RemoteExtras> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_are_case_sensitive() {
        assert_eq!("VIDEO".parse::<InterstitialMode>(), Ok(InterstitialMode::Video));
        assert_eq!(
            "OFFERWALL".parse::<InterstitialMode>(),
            Ok(InterstitialMode::Offerwall)
        );
        assert!("video".parse::<InterstitialMode>().is_err());
        assert!("REWARDED_VIDEO".parse::<InterstitialMode>().is_err());
    }

    #[test]
    fn test_unknown_variant_is_an_error() {
        let err = "video".parse::<InterstitialMode>().unwrap_err();
        assert_eq!(err.to_string(), r#"unknown variant "video""#);

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_image_size_ordinals_follow_declaration_order() {
        for (index, size) in ImageSize::ALL.iter().enumerate() {
            assert_eq!(size.ordinal() as usize, index);
            assert_eq!(size.name().parse::<ImageSize>(), Ok(*size));
        }
        assert_eq!(ImageSize::try_from(4u8), Ok(ImageSize::Size1200x628));
        assert!("size72x72".parse::<ImageSize>().is_err());
    }

    #[test]
    fn test_builder_uses_recognized_keys() {
        let extras = LocalExtras::builder()
            .ad_tag("menu")
            .min_cpm(0.5)
            .mute_video()
            .enable_3d_banner()
            .interstitial_mode(InterstitialMode::Overlay)
            .native_image_size(ImageSize::Size150x150)
            .location(GeoLocation::new(32.1, 34.8))
            .build();

        assert_eq!(extras.len(), 7);
        assert_eq!(
            extras.get(keys::AD_TAG),
            Some(&LocalValue::Text("menu".to_string()))
        );
        assert_eq!(extras.get(keys::MUTE_VIDEO), Some(&LocalValue::Bool(true)));
        assert_eq!(
            extras.get(keys::LOCATION),
            Some(&LocalValue::Location(GeoLocation::new(32.1, 34.8)))
        );
    }

    #[test]
    fn test_remote_extras_from_json() {
        let extras =
            remote_extras_from_json(r#"{"startappAppId":"200000001","minCPM":"0.25"}"#).unwrap();
        assert_eq!(extras.get(keys::APP_ID).map(String::as_str), Some("200000001"));
        assert_eq!(extras.len(), 2);

        assert!(remote_extras_from_json(r#"{"minCPM": 0.25}"#).is_err());
    }
}
