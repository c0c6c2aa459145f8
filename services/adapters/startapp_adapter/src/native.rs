//! Native ads
//!
//! Native requests bypass surface selection: the framework calls
//! [`StartappNative::load_native_ad`] directly and receives a [`StaticNativeAd`]
//! whose text and image URLs it renders itself.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

use mediation_adapter::{
    log_event, log_failure, AdapterLogEvent, HostContext, MediationErrorCode, MediationListener,
    ViewId,
};

use crate::config::{StartappAdapterConfig, AD_NETWORK_ID};
use crate::extras::{LocalExtras, RemoteExtras};
use crate::init::{InitSettings, InitializationGuard};
use crate::preference::merge;
use crate::sdk::{
    AdEventListener, CampaignAction, NativeAdDetails, NativeAdDisplayListener, NativeAdLoader,
    StartAppSdk,
};
use crate::translator::classify_failure;

const NATIVE_ADAPTER_NAME: &str = "StartappNative";

/// Framework-side receiver of a native load
pub trait NativeLoadListener: Send + Sync {
    /// The ad and its images are ready
    fn on_native_ad_loaded(&self, ad: Arc<StaticNativeAd>);

    /// No ad
    fn on_native_ad_failed(&self, error: MediationErrorCode);
}

/// Completion of an image pre-cache request
pub trait ImageCacheListener: Send + Sync {
    /// Every image is cached
    fn on_images_cached(&self);

    /// At least one image could not be cached
    fn on_images_failed_to_cache(&self, error: MediationErrorCode);
}

/// Downloads native ad images before the ad is reported as loaded
pub trait ImagePreCacher: Send + Sync {
    /// Cache `urls`, then report to `listener`
    fn pre_cache_images(&self, urls: Vec<String>, listener: Arc<dyn ImageCacheListener>);
}

/// Button label for a campaign action
pub fn call_to_action(action: CampaignAction) -> &'static str {
    match action {
        CampaignAction::OpenMarket => "Install",
        CampaignAction::LaunchApp => "Launch app",
        _ => "Open",
    }
}

// ============================================================================
// STATIC NATIVE AD
// ============================================================================

/// Rendered-by-the-framework native ad
pub struct StaticNativeAd {
    title: String,
    text: String,
    call_to_action: &'static str,
    star_rating: f64,
    main_image_url: Option<String>,
    icon_image_url: Option<String>,
    details: Mutex<Option<Arc<dyn NativeAdDetails>>>,
}

impl StaticNativeAd {
    fn from_details(details: Arc<dyn NativeAdDetails>, content_ad: bool) -> Self {
        let (main_image_url, icon_image_url) = if content_ad {
            (None, None)
        } else {
            (details.image_url(), details.secondary_image_url())
        };

        Self {
            title: details.title(),
            text: details.description(),
            call_to_action: call_to_action(details.campaign_action()),
            star_rating: f64::from(details.rating()),
            main_image_url,
            icon_image_url,
            details: Mutex::new(Some(details)),
        }
    }

    /// Headline
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Body text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Button label
    pub fn call_to_action(&self) -> &str {
        self.call_to_action
    }

    /// Star rating
    pub fn star_rating(&self) -> f64 {
        self.star_rating
    }

    /// Main image URL; never set for content ads
    pub fn main_image_url(&self) -> Option<&str> {
        self.main_image_url.as_deref()
    }

    /// Icon image URL; never set for content ads
    pub fn icon_image_url(&self) -> Option<&str> {
        self.icon_image_url.as_deref()
    }

    /// Non-empty image URLs to pre-cache, main image first
    pub fn image_urls(&self) -> Vec<String> {
        [&self.main_image_url, &self.icon_image_url]
            .into_iter()
            .flatten()
            .filter(|url| !url.is_empty())
            .cloned()
            .collect()
    }

    /// Whether the SDK ad is still held
    pub fn is_destroyed(&self) -> bool {
        self.details.lock().is_none()
    }

    /// Track impressions and clicks on `view`, forwarding them to `listener`
    pub fn prepare(&self, view: ViewId, listener: Arc<dyn MediationListener>) {
        let details = self.details.lock().clone();
        if let Some(details) = details {
            details.register_view_for_interaction(view, Arc::new(NativeInteraction { listener }));
        }
    }

    /// Stop tracking the prepared view
    pub fn clear(&self, _view: ViewId) {
        let details = self.details.lock().clone();
        if let Some(details) = details {
            details.unregister_view();
        }
    }

    /// Release the SDK ad
    pub fn destroy(&self) {
        self.details.lock().take();
    }
}

struct NativeInteraction {
    listener: Arc<dyn MediationListener>,
}

impl NativeAdDisplayListener for NativeInteraction {
    fn ad_displayed(&self) {
        self.listener.on_ad_impression();
        log_event(AD_NETWORK_ID, AdapterLogEvent::ShowSuccess, NATIVE_ADAPTER_NAME);
    }

    fn ad_hidden(&self) {
        log_event(AD_NETWORK_ID, AdapterLogEvent::DidDisappear, NATIVE_ADAPTER_NAME);
    }

    fn ad_clicked(&self) {
        self.listener.on_ad_clicked();
        log_event(AD_NETWORK_ID, AdapterLogEvent::Clicked, NATIVE_ADAPTER_NAME);
    }

    fn ad_not_displayed(&self) {
        log_event(AD_NETWORK_ID, AdapterLogEvent::ShowFailed, NATIVE_ADAPTER_NAME);
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Entry point for native requests
pub struct StartappNative {
    sdk: Arc<dyn StartAppSdk>,
    settings: InitSettings,
    guard: &'static InitializationGuard,
    pre_cacher: Arc<dyn ImagePreCacher>,
    content_ads: bool,
    loader: Mutex<Option<Arc<dyn NativeAdLoader>>>,
}

impl StartappNative {
    /// Native loader over `sdk`, caching images through `pre_cacher`
    pub fn new(sdk: Arc<dyn StartAppSdk>, pre_cacher: Arc<dyn ImagePreCacher>) -> Self {
        Self {
            sdk,
            settings: StartappAdapterConfig::default().init_settings(),
            guard: InitializationGuard::global(),
            pre_cacher,
            content_ads: false,
            loader: Mutex::new(None),
        }
    }

    /// Apply adapter settings
    pub fn with_config(mut self, config: &StartappAdapterConfig) -> Self {
        self.settings = config.init_settings();
        self
    }

    /// Use `guard` instead of the process-wide guard
    pub fn with_guard(mut self, guard: &'static InitializationGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Request content ads: text only, reported as soon as they arrive
    pub fn with_content_ads(mut self, content_ads: bool) -> Self {
        self.content_ads = content_ads;
        self
    }

    /// Load one native ad and report it to `listener`.
    ///
    /// One load at a time: starting a new load abandons the previous one, and
    /// so does dropping this value.
    pub fn load_native_ad(
        &self,
        context: &HostContext,
        local: &LocalExtras,
        remote: &RemoteExtras,
        listener: Arc<dyn NativeLoadListener>,
    ) {
        let preference = merge(local, remote, true);
        self.guard
            .try_initialize(self.sdk.as_ref(), context, preference.app_id(), &self.settings);

        let loader = self.sdk.new_native_loader(context);
        let callback = Arc::new(NativeLoadCallback {
            loader: Mutex::new(Some(Arc::downgrade(&loader))),
            listener,
            pre_cacher: self.pre_cacher.clone(),
            content_ads: self.content_ads,
        });

        info!(
            primary = ?preference.primary_image_size(),
            secondary = ?preference.secondary_image_size(),
            "🔄 Loading StartApp native ad"
        );
        if self.loader.lock().replace(loader.clone()).is_some() {
            debug!("Abandoning previous StartApp native load");
        }
        loader.load_ad(&preference, callback);
        log_event(AD_NETWORK_ID, AdapterLogEvent::LoadAttempted, NATIVE_ADAPTER_NAME);
    }
}

/// Receives the SDK load result once. The SDK holds this callback, so the
/// loader is only referenced weakly; [`StartappNative`] owns it.
struct NativeLoadCallback {
    loader: Mutex<Option<Weak<dyn NativeAdLoader>>>,
    listener: Arc<dyn NativeLoadListener>,
    pre_cacher: Arc<dyn ImagePreCacher>,
    content_ads: bool,
}

impl NativeLoadCallback {
    fn fail(&self, code: MediationErrorCode) {
        log_failure(AD_NETWORK_ID, AdapterLogEvent::LoadFailed, NATIVE_ADAPTER_NAME, code);
        self.listener.on_native_ad_failed(code);
    }
}

impl AdEventListener for NativeLoadCallback {
    fn on_receive_ad(&self) {
        let Some(loader) = self.loader.lock().take() else {
            debug!("Duplicate StartApp native load callback, ignoring");
            return;
        };
        let Some(loader) = loader.upgrade() else {
            debug!("StartApp native load was abandoned, ignoring");
            return;
        };

        let Some(details) = loader.native_ads().into_iter().next() else {
            self.fail(MediationErrorCode::NetworkNoFill);
            return;
        };

        let ad = Arc::new(StaticNativeAd::from_details(details, self.content_ads));
        if self.content_ads {
            log_event(AD_NETWORK_ID, AdapterLogEvent::LoadSuccess, NATIVE_ADAPTER_NAME);
            self.listener.on_native_ad_loaded(ad);
            return;
        }

        let urls = ad.image_urls();
        self.pre_cacher.pre_cache_images(
            urls,
            Arc::new(PreCacheCallback {
                ad,
                listener: self.listener.clone(),
            }),
        );
    }

    fn on_failed_to_receive_ad(&self, message: Option<&str>) {
        let Some(loader) = self.loader.lock().take() else {
            debug!("Duplicate StartApp native load callback, ignoring");
            return;
        };
        if loader.strong_count() == 0 {
            debug!("StartApp native load was abandoned, ignoring");
            return;
        }
        self.fail(classify_failure(message));
    }
}

struct PreCacheCallback {
    ad: Arc<StaticNativeAd>,
    listener: Arc<dyn NativeLoadListener>,
}

impl ImageCacheListener for PreCacheCallback {
    fn on_images_cached(&self) {
        log_event(AD_NETWORK_ID, AdapterLogEvent::LoadSuccess, NATIVE_ADAPTER_NAME);
        self.listener.on_native_ad_loaded(self.ad.clone());
    }

    fn on_images_failed_to_cache(&self, error: MediationErrorCode) {
        log_failure(AD_NETWORK_ID, AdapterLogEvent::LoadFailed, NATIVE_ADAPTER_NAME, error);
        self.listener.on_native_ad_failed(error);
    }
}
