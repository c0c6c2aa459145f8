//! # StartApp Placement Adapter
//!
//! ## Purpose
//!
//! Implements the framework's [`BaseAd`] lifecycle on top of the StartApp SDK:
//! resolves the request parameters, picks the ad object, starts the load and
//! wires the SDK's callbacks to an [`EventTranslator`] for the cycle.
//!
//! ## Lifecycle
//!
//! One cycle at a time. Every `load` starts a new cycle with a fresh translator
//! and handle; `invalidate` detaches the translator so callbacks still in flight
//! from the SDK are dropped.

use std::sync::Arc;

use tracing::{debug, info, warn};

use mediation_adapter::{
    log_failure, AdData, AdapterError, AdapterLogEvent, BannerContainer, BaseAd, HostContext,
    MediationErrorCode, MediationListener, Result,
};

use crate::config::{StartappAdapterConfig, ADAPTER_NAME, AD_NETWORK_ID};
use crate::extras::{keys, LocalExtras};
use crate::init::{InitSettings, InitializationGuard};
use crate::preference::{merge, Preference};
use crate::sdk::{AdMode, BannerAd, BannerKind, FullscreenAd, StartAppSdk};
use crate::surface::{select_surface, SurfaceKind, SurfaceRequest};
use crate::translator::{CycleState, EventTranslator};

/// Live SDK ad object of the current cycle
enum AdHandle {
    /// Keeps the SDK banner alive for the cycle; its view is in the container
    Banner { _banner: Box<dyn BannerAd> },
    Fullscreen(Box<dyn FullscreenAd>),
}

/// StartApp implementation of the framework's placement lifecycle
pub struct StartappAdapter {
    sdk: Arc<dyn StartAppSdk>,
    settings: InitSettings,
    guard: &'static InitializationGuard,
    local_extras: LocalExtras,

    listener: Option<Arc<dyn MediationListener>>,
    translator: Option<Arc<EventTranslator>>,
    handle: Option<AdHandle>,
    banner_view: Option<Arc<BannerContainer>>,
    is_rewarded: bool,
    is_medium_rectangle: bool,
}

impl StartappAdapter {
    /// Adapter over `sdk` with default settings and the process-wide guard
    pub fn new(sdk: Arc<dyn StartAppSdk>) -> Self {
        Self::with_config(sdk, &StartappAdapterConfig::default())
    }

    /// Adapter over `sdk` with explicit settings
    pub fn with_config(sdk: Arc<dyn StartAppSdk>, config: &StartappAdapterConfig) -> Self {
        Self {
            sdk,
            settings: config.init_settings(),
            guard: InitializationGuard::global(),
            local_extras: LocalExtras::new(),
            listener: None,
            translator: None,
            handle: None,
            banner_view: None,
            is_rewarded: false,
            is_medium_rectangle: false,
        }
    }

    /// Use `guard` instead of the process-wide guard
    pub fn with_guard(mut self, guard: &'static InitializationGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Publisher-supplied local extras applied to every request
    pub fn with_mediation_settings(mut self, local_extras: LocalExtras) -> Self {
        self.local_extras = local_extras;
        self
    }

    /// Whether the current cycle is rewarded
    pub fn is_rewarded(&self) -> bool {
        self.is_rewarded
    }

    /// Whether the current cycle is a medium rectangle
    pub fn is_medium_rectangle(&self) -> bool {
        self.is_medium_rectangle
    }

    /// Whether a rewarded video is loaded and waiting to be shown
    pub fn is_rewarded_video_loaded(&self) -> bool {
        self.is_rewarded && self.cycle_state() == Some(CycleState::Loaded)
    }

    /// State of the current cycle, if one was started
    pub fn cycle_state(&self) -> Option<CycleState> {
        self.translator.as_ref().map(|t| t.state())
    }

    /// Report a show refused before any cycle exists
    fn reject_show_without_cycle(&self) {
        let code = MediationErrorCode::FullscreenShowError;
        match &self.listener {
            Some(listener) => {
                log_failure(AD_NETWORK_ID, AdapterLogEvent::ShowFailed, ADAPTER_NAME, code);
                listener.on_ad_failed(code);
            }
            None => debug!("show() with no listener attached, ignoring"),
        }
    }

    fn reset_cycle(&mut self) {
        if let Some(translator) = self.translator.take() {
            translator.detach();
        }
        self.handle = None;
        if let Some(view) = self.banner_view.take() {
            view.remove_from_parent();
        }
        self.is_rewarded = false;
        self.is_medium_rectangle = false;
    }

    // ========================================================================
    // BANNERS
    // ========================================================================

    fn banner_size(
        surface: SurfaceKind,
        context: &HostContext,
        ad_data: &AdData,
    ) -> Result<(u32, u32)> {
        if !context.is_activity() {
            return Err(AdapterError::UnsupportedHost {
                surface: surface.to_string(),
            });
        }

        match (ad_data.ad_width(), ad_data.ad_height()) {
            (Some(width), Some(height)) => Ok((width, height)),
            (width, height) => Err(AdapterError::MissingDimensions { width, height }),
        }
    }

    fn load_banner(
        &mut self,
        context: &HostContext,
        ad_data: &AdData,
        kind: BannerKind,
        preference: &Preference,
        translator: Arc<EventTranslator>,
    ) {
        let (width, height) = match Self::banner_size(translator.surface(), context, ad_data) {
            Ok(size) => size,
            Err(e) => {
                warn!(error = %e, "❌ Cannot request StartApp banner");
                translator.load_failed(e.error_code());
                return;
            }
        };

        let mut banner = self
            .sdk
            .new_banner(context, kind, preference, translator.clone());
        translator.begin_load();
        banner.load_ad(width, height);

        let container = Arc::new(BannerContainer::new());
        container.add_child(
            banner.view(),
            context.dp_to_px(width),
            context.dp_to_px(height),
        );

        debug!(
            ?kind,
            width,
            height,
            container = container.id().value(),
            "StartApp banner requested"
        );

        self.banner_view = Some(container);
        self.handle = Some(AdHandle::Banner { _banner: banner });
    }

    // ========================================================================
    // FULL SCREEN
    // ========================================================================

    fn load_fullscreen(
        &mut self,
        context: &HostContext,
        mode: Option<AdMode>,
        preference: &Preference,
        translator: Arc<EventTranslator>,
    ) {
        let mut ad = self.sdk.new_fullscreen_ad(context);
        if self.is_rewarded {
            ad.set_video_listener(translator.clone());
        }

        translator.begin_load();
        ad.load_ad(mode, preference, translator);

        self.handle = Some(AdHandle::Fullscreen(ad));
    }

    fn show_fullscreen(&mut self, translator: Arc<EventTranslator>) {
        let Some(AdHandle::Fullscreen(ad)) = self.handle.as_mut() else {
            return;
        };

        let rejection = if self.is_rewarded {
            (translator.state() != CycleState::Loaded)
                .then_some(MediationErrorCode::VideoDownloadError)
        } else {
            (!ad.is_ready()).then_some(MediationErrorCode::FullscreenShowError)
        };

        if let Some(code) = rejection {
            translator.show_rejected(code);
            return;
        }

        if !translator.begin_show() {
            let code = if self.is_rewarded {
                MediationErrorCode::VideoDownloadError
            } else {
                MediationErrorCode::FullscreenShowError
            };
            translator.show_rejected(code);
            return;
        }

        if !ad.show_ad(translator.clone()) {
            translator.not_displayed();
        }
    }
}

impl BaseAd for StartappAdapter {
    fn ad_network_id(&self) -> &str {
        AD_NETWORK_ID
    }

    fn check_and_initialize_sdk(&self, context: &HostContext, ad_data: &AdData) -> bool {
        let app_id = ad_data.extras().get(keys::APP_ID).map(String::as_str);
        self.guard
            .try_initialize(self.sdk.as_ref(), context, app_id, &self.settings)
    }

    fn set_listener(&mut self, listener: Arc<dyn MediationListener>) {
        self.listener = Some(listener);
    }

    fn load(
        &mut self,
        context: &HostContext,
        ad_data: &AdData,
        listener: Arc<dyn MediationListener>,
    ) {
        self.reset_cycle();
        self.listener = Some(listener.clone());

        let preference = merge(&self.local_extras, ad_data.extras(), false);
        let surface = select_surface(&SurfaceRequest::from_ad_data(ad_data), &preference);
        info!(%surface, format = ad_data.ad_unit_format(), "🔄 Loading StartApp ad");

        let translator = EventTranslator::new(surface, listener);
        self.translator = Some(translator.clone());
        self.is_rewarded = surface == SurfaceKind::Rewarded;
        self.is_medium_rectangle = surface == SurfaceKind::MediumRectangle;

        match surface {
            SurfaceKind::Banner | SurfaceKind::MediumRectangle | SurfaceKind::Banner3D => {
                let kind = surface.banner_kind().unwrap_or(BannerKind::Standard);
                self.load_banner(context, ad_data, kind, &preference, translator);
            }
            SurfaceKind::Interstitial { mode } => {
                self.load_fullscreen(context, mode.map(AdMode::from), &preference, translator);
            }
            SurfaceKind::Rewarded => {
                self.load_fullscreen(context, Some(AdMode::RewardedVideo), &preference, translator);
            }
            SurfaceKind::Native => {
                warn!("❌ Native requests are served by StartappNative, not the placement adapter");
                translator.load_failed(MediationErrorCode::AdapterConfigurationError);
            }
        }
    }

    fn show(&mut self) {
        let Some(translator) = self.translator.clone() else {
            self.reject_show_without_cycle();
            return;
        };

        match self.handle {
            Some(AdHandle::Banner { .. }) => debug!("StartApp banners render on load, ignoring show()"),
            Some(AdHandle::Fullscreen(_)) => self.show_fullscreen(translator),
            None if self.is_rewarded => {
                translator.show_rejected(MediationErrorCode::VideoDownloadError)
            }
            None if translator.surface().is_inline() => {
                debug!("StartApp banner was never requested, ignoring show()")
            }
            None => translator.show_rejected(MediationErrorCode::FullscreenShowError),
        }
    }

    fn invalidate(&mut self) {
        self.reset_cycle();
        self.listener = None;
    }

    fn ad_view(&self) -> Option<Arc<BannerContainer>> {
        self.banner_view.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{LoadScript, SimulatedSdk};
    use mediation_adapter::{EventOutcome, RecordingListener, ViewId};

    fn adapter(sdk: &Arc<SimulatedSdk>) -> StartappAdapter {
        let guard: &'static InitializationGuard = Box::leak(Box::new(InitializationGuard::new()));
        StartappAdapter::new(sdk.clone()).with_guard(guard)
    }

    #[test]
    fn test_check_and_initialize_uses_server_app_id() {
        let sdk = SimulatedSdk::new();
        let adapter = adapter(&sdk);
        let ctx = HostContext::activity(2.0);

        assert!(!adapter.check_and_initialize_sdk(&ctx, &AdData::default()));
        assert!(sdk.init_steps().is_empty());

        let data = AdData::default().with_extra(keys::APP_ID, "200000001");
        assert!(adapter.check_and_initialize_sdk(&ctx, &data));
        assert!(!adapter.check_and_initialize_sdk(&ctx, &data));
    }

    #[test]
    fn test_banner_sized_in_pixels() {
        let sdk = SimulatedSdk::new();
        let mut adapter = adapter(&sdk);
        let recorder = RecordingListener::new();
        let data = AdData::default()
            .with_format("320x50_mopub_banner")
            .with_size(320, 50);

        adapter.load(&HostContext::activity(1.5), &data, recorder.clone());
        sdk.complete_load();

        let view = adapter.ad_view().expect("banner view");
        let child = view.child().expect("banner child");
        assert_eq!((child.width_px, child.height_px), (480, 75));
        assert_eq!(sdk.created_banners(), vec![BannerKind::Standard]);
        assert_eq!(recorder.outcomes(), vec![EventOutcome::Loaded]);
    }

    #[test]
    fn test_banner_without_activity_fails_before_sdk() {
        let sdk = SimulatedSdk::new();
        let mut adapter = adapter(&sdk);
        let recorder = RecordingListener::new();
        let data = AdData::default()
            .with_format("320x50_mopub_banner")
            .with_size(320, 50);

        adapter.load(&HostContext::application(), &data, recorder.clone());

        assert_eq!(
            recorder.outcomes(),
            vec![EventOutcome::LoadFailed(
                MediationErrorCode::AdapterConfigurationError
            )]
        );
        assert!(sdk.created_banners().is_empty());
        assert!(adapter.ad_view().is_none());
    }

    #[test]
    fn test_banner_without_dimensions_fails_before_sdk() {
        let sdk = SimulatedSdk::new();
        let mut adapter = adapter(&sdk);
        let recorder = RecordingListener::new();
        let data = AdData::default().with_format("300x250_medium_rectangle");

        adapter.load(&HostContext::activity(2.0), &data, recorder.clone());

        assert!(adapter.is_medium_rectangle());
        assert_eq!(
            recorder.outcomes(),
            vec![EventOutcome::LoadFailed(
                MediationErrorCode::AdapterConfigurationError
            )]
        );
        assert!(sdk.created_banners().is_empty());
    }

    #[test]
    fn test_interstitial_mode_reaches_sdk() {
        let sdk = SimulatedSdk::new();
        let mut adapter = adapter(&sdk);
        let data = AdData::default()
            .with_format("full")
            .with_extra(keys::INTERSTITIAL_MODE, "OVERLAY");

        adapter.load(&HostContext::activity(2.0), &data, RecordingListener::new());
        assert_eq!(sdk.requested_modes(), vec![Some(AdMode::Overlay)]);

        adapter.load(&HostContext::activity(2.0), &AdData::default(), RecordingListener::new());
        assert_eq!(sdk.requested_modes(), vec![Some(AdMode::Overlay), None]);
    }

    #[test]
    fn test_show_on_banner_is_noop() {
        let sdk = SimulatedSdk::new();
        let mut adapter = adapter(&sdk);
        let recorder = RecordingListener::new();
        let data = AdData::default()
            .with_format("320x50_mopub_banner")
            .with_size(320, 50);

        adapter.load(&HostContext::activity(1.0), &data, recorder.clone());
        sdk.complete_load();
        adapter.show();

        assert_eq!(recorder.outcomes(), vec![EventOutcome::Loaded]);
        assert_eq!(sdk.show_count(), 0);
    }

    #[test]
    fn test_invalidate_detaches_banner_and_listener() {
        let sdk = SimulatedSdk::new();
        let mut adapter = adapter(&sdk);
        let recorder = RecordingListener::new();
        let data = AdData::default()
            .with_format("320x50_mopub_banner")
            .with_size(320, 50);

        adapter.load(&HostContext::activity(1.0), &data, recorder.clone());
        let view = adapter.ad_view().expect("banner view");
        view.attach_to(ViewId::next());

        adapter.invalidate();
        assert!(!view.is_attached());
        assert!(adapter.ad_view().is_none());
        assert_eq!(adapter.cycle_state(), None);

        sdk.complete_load();
        assert!(recorder.outcomes().is_empty());
    }

    #[test]
    fn test_rewarded_show_before_load_completes() {
        let sdk = SimulatedSdk::new();
        let mut adapter = adapter(&sdk);
        let recorder = RecordingListener::new();

        adapter.load(
            &HostContext::activity(2.0),
            &AdData::default().with_rewarded(true),
            recorder.clone(),
        );
        assert_eq!(sdk.requested_modes(), vec![Some(AdMode::RewardedVideo)]);
        assert!(!adapter.is_rewarded_video_loaded());

        adapter.show();
        assert_eq!(
            recorder.outcomes(),
            vec![EventOutcome::ShowFailed(MediationErrorCode::VideoDownloadError)]
        );

        sdk.push_load_result(LoadScript::Fill);
        sdk.complete_load();
        assert!(adapter.is_rewarded_video_loaded());
    }
}
