//! Ad surface selection
//!
//! Which StartApp ad object a request turns into is decided here, from the ad
//! unit format, the rewarded and native flags, and the resolved preference.

use std::fmt;

use serde::{Deserialize, Serialize};

use mediation_adapter::AdData;

use crate::extras::InterstitialMode;
use crate::preference::Preference;
use crate::sdk::BannerKind;

/// Concrete ad object for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Standard banner
    Banner,
    /// 300x250 medium rectangle
    MediumRectangle,
    /// 3D banner
    Banner3D,
    /// Interstitial; `None` lets the SDK pick the mode
    Interstitial {
        /// Display mode
        mode: Option<InterstitialMode>,
    },
    /// Rewarded video
    Rewarded,
    /// Native ad
    Native,
}

impl SurfaceKind {
    /// Banner widget flavour, for the inline surfaces
    pub fn banner_kind(&self) -> Option<BannerKind> {
        match self {
            SurfaceKind::Banner => Some(BannerKind::Standard),
            SurfaceKind::MediumRectangle => Some(BannerKind::MediumRectangle),
            SurfaceKind::Banner3D => Some(BannerKind::ThreeD),
            _ => None,
        }
    }

    /// Whether the surface renders inline as soon as it loads
    pub fn is_inline(&self) -> bool {
        self.banner_kind().is_some()
    }

    /// Whether the surface is shown full screen
    pub fn is_fullscreen(&self) -> bool {
        matches!(
            self,
            SurfaceKind::Interstitial { .. } | SurfaceKind::Rewarded
        )
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceKind::Banner => f.write_str("banner"),
            SurfaceKind::MediumRectangle => f.write_str("medium rectangle"),
            SurfaceKind::Banner3D => f.write_str("3D banner"),
            SurfaceKind::Interstitial { mode: Some(mode) } => {
                write!(f, "interstitial ({})", mode.name())
            }
            SurfaceKind::Interstitial { mode: None } => f.write_str("interstitial"),
            SurfaceKind::Rewarded => f.write_str("rewarded video"),
            SurfaceKind::Native => f.write_str("native"),
        }
    }
}

/// Coarse class of an ad unit format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatClass {
    /// Contains `medium_rectangle`
    MediumRectangle,
    /// Contains `banner`
    Banner,
    /// Anything else
    Other,
}

/// Classify an ad unit format, ignoring case
pub fn classify_format(format: &str) -> FormatClass {
    let format = format.to_lowercase();
    if format.contains("medium_rectangle") {
        FormatClass::MediumRectangle
    } else if format.contains("banner") {
        FormatClass::Banner
    } else {
        FormatClass::Other
    }
}

/// The request flags that drive selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceRequest {
    /// Ad unit format string
    pub ad_unit_format: String,
    /// Rewarded request
    pub rewarded: bool,
    /// Native request
    pub native: bool,
}

impl SurfaceRequest {
    /// Flags of a framework request. The framework never asks for native here.
    pub fn from_ad_data(ad_data: &AdData) -> Self {
        Self {
            ad_unit_format: ad_data.ad_unit_format().to_string(),
            rewarded: ad_data.is_rewarded(),
            native: false,
        }
    }
}

/// Pick the surface for a request
pub fn select_surface(request: &SurfaceRequest, preference: &Preference) -> SurfaceKind {
    if request.rewarded {
        return SurfaceKind::Rewarded;
    }

    match classify_format(&request.ad_unit_format) {
        FormatClass::MediumRectangle => SurfaceKind::MediumRectangle,
        FormatClass::Banner if preference.wants_3d_banner() => SurfaceKind::Banner3D,
        FormatClass::Banner => SurfaceKind::Banner,
        FormatClass::Other if request.native => SurfaceKind::Native,
        FormatClass::Other => SurfaceKind::Interstitial {
            mode: preference.interstitial_mode(),
        },
    }
}
