//! # Wrapped StartApp SDK Surface
//!
//! The adapter never renders or talks to the network itself. Everything it asks
//! of the StartApp SDK goes through the traits in this module, and everything the
//! SDK reports comes back through the listener traits below, on whatever thread
//! the SDK chooses.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mediation_adapter::{HostContext, ViewId};

use crate::extras::InterstitialMode;
use crate::preference::Preference;

/// Failure of a synchronous SDK call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    /// The SDK refused the call
    #[error("SDK rejected {call}: {reason}")]
    Rejected {
        /// SDK entry point
        call: &'static str,
        /// Reason given by the SDK
        reason: String,
    },

    /// The SDK is not usable in this process
    #[error("SDK unavailable: {0}")]
    Unavailable(String),
}

/// Result of a synchronous SDK call
pub type SdkResult<T> = std::result::Result<T, SdkError>;

// ============================================================================
// AD KINDS
// ============================================================================

/// Banner widget flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BannerKind {
    /// Standard banner
    Standard,
    /// 300x250 medium rectangle
    MediumRectangle,
    /// Rotating 3D banner
    ThreeD,
}

/// Full-screen ad modes understood by the SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdMode {
    /// Offer wall
    Offerwall,
    /// Video interstitial
    Video,
    /// Overlay interstitial
    Overlay,
    /// Rewarded video
    RewardedVideo,
}

impl From<InterstitialMode> for AdMode {
    fn from(mode: InterstitialMode) -> Self {
        match mode {
            InterstitialMode::Offerwall => AdMode::Offerwall,
            InterstitialMode::Video => AdMode::Video,
            InterstitialMode::Overlay => AdMode::Overlay,
        }
    }
}

/// What tapping a native ad does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignAction {
    /// Opens the store listing
    OpenMarket,
    /// Launches an installed application
    LaunchApp,
    /// Opens a web page
    OpenUrl,
}

// ============================================================================
// SDK ENTRY POINT
// ============================================================================

/// Process-wide StartApp SDK
pub trait StartAppSdk: Send + Sync {
    /// Turn off the splash screen
    fn disable_splash(&self) -> SdkResult<()>;

    /// Enable or disable the SDK consent dialog
    fn set_consent(&self, enabled: bool) -> SdkResult<()>;

    /// Register the mediation wrapper name and version
    fn add_wrapper(&self, name: &str, version: &str) -> SdkResult<()>;

    /// Initialize with the application id
    fn init(&self, context: &HostContext, app_id: &str) -> SdkResult<()>;

    /// SDK version string, e.g. `"4.6.3"`
    fn version(&self) -> String;

    /// Create a banner widget that reports to `listener`
    fn new_banner(
        &self,
        context: &HostContext,
        kind: BannerKind,
        preference: &Preference,
        listener: Arc<dyn BannerListener>,
    ) -> Box<dyn BannerAd>;

    /// Create a full-screen ad object
    fn new_fullscreen_ad(&self, context: &HostContext) -> Box<dyn FullscreenAd>;

    /// Create a native ad loader
    fn new_native_loader(&self, context: &HostContext) -> Arc<dyn NativeAdLoader>;
}

// ============================================================================
// AD OBJECTS
// ============================================================================

/// Banner widget
pub trait BannerAd: Send {
    /// Request an ad of the given size in dp; the outcome arrives on the banner listener
    fn load_ad(&mut self, width_dp: u32, height_dp: u32);

    /// Platform view of the widget
    fn view(&self) -> ViewId;
}

/// Interstitial or rewarded ad object
pub trait FullscreenAd: Send {
    /// Listener for video completion
    fn set_video_listener(&mut self, listener: Arc<dyn VideoListener>);

    /// Request an ad; `None` lets the SDK choose the mode
    fn load_ad(
        &mut self,
        mode: Option<AdMode>,
        preference: &Preference,
        listener: Arc<dyn AdEventListener>,
    );

    /// Whether a loaded ad is waiting to be shown
    fn is_ready(&self) -> bool;

    /// Display the loaded ad; display callbacks go to `listener`
    fn show_ad(&mut self, listener: Arc<dyn AdDisplayListener>) -> bool;
}

/// Loader for native ads. Its callback reads the delivered ads back from it,
/// so it is shared rather than owned.
pub trait NativeAdLoader: Send + Sync {
    /// Request native ads; the outcome arrives on `listener`
    fn load_ad(&self, preference: &Preference, listener: Arc<dyn AdEventListener>);

    /// Ads delivered by the last successful load
    fn native_ads(&self) -> Vec<Arc<dyn NativeAdDetails>>;
}

/// One delivered native ad
pub trait NativeAdDetails: Send + Sync {
    /// Headline
    fn title(&self) -> String;

    /// Body text
    fn description(&self) -> String;

    /// Click behaviour
    fn campaign_action(&self) -> CampaignAction;

    /// Star rating
    fn rating(&self) -> f32;

    /// Main image URL
    fn image_url(&self) -> Option<String>;

    /// Secondary (icon) image URL
    fn secondary_image_url(&self) -> Option<String>;

    /// Track impressions and clicks on `view`
    fn register_view_for_interaction(
        &self,
        view: ViewId,
        listener: Arc<dyn NativeAdDisplayListener>,
    );

    /// Stop tracking the registered view
    fn unregister_view(&self);
}

// ============================================================================
// CALLBACKS
// ============================================================================

/// Load outcome of a full-screen or native request
pub trait AdEventListener: Send + Sync {
    /// An ad was received
    fn on_receive_ad(&self);

    /// No ad; the SDK may explain why
    fn on_failed_to_receive_ad(&self, message: Option<&str>);
}

/// Display callbacks of a full-screen ad
pub trait AdDisplayListener: Send + Sync {
    /// On screen
    fn ad_displayed(&self);

    /// Closed
    fn ad_hidden(&self);

    /// Tapped
    fn ad_clicked(&self);

    /// Could not be displayed
    fn ad_not_displayed(&self);
}

/// Video progress of a rewarded ad
pub trait VideoListener: Send + Sync {
    /// The user watched the video to the end
    fn on_video_completed(&self);
}

/// Callbacks of a banner widget. The SDK gives no failure reason for banners.
pub trait BannerListener: Send + Sync {
    /// An ad is in the widget
    fn on_banner_received(&self);

    /// No ad
    fn on_banner_failed(&self);

    /// Impression counted
    fn on_banner_impression(&self);

    /// Tapped
    fn on_banner_click(&self);
}

/// Interaction callbacks of a registered native ad view
pub trait NativeAdDisplayListener: Send + Sync {
    /// On screen
    fn ad_displayed(&self);

    /// Off screen
    fn ad_hidden(&self);

    /// Tapped
    fn ad_clicked(&self);

    /// Could not be displayed
    fn ad_not_displayed(&self);
}
