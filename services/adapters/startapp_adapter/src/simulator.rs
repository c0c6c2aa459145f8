//! In-process stand-in for the StartApp SDK
//!
//! [`SimulatedSdk`] implements every SDK trait without rendering or network
//! access. Loads stay pending until [`SimulatedSdk::complete_load`] delivers the
//! next scripted result, and display callbacks fire only when asked, so tests
//! and the `startapp_sim` binary control the exact callback order.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use mediation_adapter::{HostContext, MediationErrorCode, ViewId};

use crate::native::{ImageCacheListener, ImagePreCacher};
use crate::preference::Preference;
use crate::sdk::{
    AdDisplayListener, AdEventListener, AdMode, BannerAd, BannerKind, BannerListener,
    CampaignAction, FullscreenAd, NativeAdDetails, NativeAdDisplayListener, NativeAdLoader,
    SdkError, SdkResult, StartAppSdk, VideoListener,
};

/// SDK version the simulator reports by default
pub const SIMULATED_SDK_VERSION: &str = "4.6.3";

/// One recorded initialization call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitStep {
    /// Splash disabled
    DisableSplash,
    /// Consent dialog toggled
    Consent(bool),
    /// Wrapper registered
    Wrapper {
        /// Wrapper name
        name: String,
        /// Wrapper version
        version: String,
    },
    /// SDK initialized
    Init {
        /// Application id
        app_id: String,
    },
}

/// Scripted result of the next load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadScript {
    /// Deliver an ad
    Fill,
    /// Fail with an optional message
    NoFill(Option<String>),
}

enum PendingLoad {
    Banner(Arc<dyn BannerListener>),
    Fullscreen {
        listener: Arc<dyn AdEventListener>,
        ready: Arc<AtomicBool>,
    },
    Native {
        listener: Arc<dyn AdEventListener>,
        delivered: Arc<Mutex<Vec<Arc<dyn NativeAdDetails>>>>,
    },
}

#[derive(Default)]
struct SimState {
    init_steps: Vec<InitStep>,
    failing_steps: HashSet<&'static str>,
    script: VecDeque<LoadScript>,
    pending: VecDeque<PendingLoad>,
    banners: Vec<BannerKind>,
    banner_listener: Option<Arc<dyn BannerListener>>,
    modes: Vec<Option<AdMode>>,
    preferences: Vec<Preference>,
    display: Option<Arc<dyn AdDisplayListener>>,
    video: Option<Arc<dyn VideoListener>>,
    shows: usize,
    native_inventory: Vec<Arc<dyn NativeAdDetails>>,
    native_loaders: Vec<Weak<SimulatedNativeLoader>>,
}

/// Scriptable StartApp SDK
pub struct SimulatedSdk {
    version: String,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedSdk {
    /// Simulator reporting [`SIMULATED_SDK_VERSION`]
    pub fn new() -> Arc<Self> {
        Self::with_version(SIMULATED_SDK_VERSION)
    }

    /// Simulator reporting `version`
    pub fn with_version(version: &str) -> Arc<Self> {
        Arc::new(Self {
            version: version.to_string(),
            state: Arc::new(Mutex::new(SimState::default())),
        })
    }

    /// Make the named initialization call (`disable_splash`, `set_consent`,
    /// `add_wrapper`, `init`) fail
    pub fn fail_step(&self, step: &'static str) {
        self.state.lock().failing_steps.insert(step);
    }

    /// Initialization calls that succeeded, in order
    pub fn init_steps(&self) -> Vec<InitStep> {
        self.state.lock().init_steps.clone()
    }

    /// Queue the result of a future load; unscripted loads fill
    pub fn push_load_result(&self, script: LoadScript) {
        self.state.lock().script.push_back(script);
    }

    /// Add an ad to what every native load delivers
    pub fn push_native_ad(&self, ad: Arc<SimulatedNativeAd>) {
        self.state.lock().native_inventory.push(ad);
    }

    /// Banner kinds created so far
    pub fn created_banners(&self) -> Vec<BannerKind> {
        self.state.lock().banners.clone()
    }

    /// Modes of every full-screen load so far
    pub fn requested_modes(&self) -> Vec<Option<AdMode>> {
        self.state.lock().modes.clone()
    }

    /// Preferences handed to every load so far
    pub fn requested_preferences(&self) -> Vec<Preference> {
        self.state.lock().preferences.clone()
    }

    /// Number of full-screen ads actually shown
    pub fn show_count(&self) -> usize {
        self.state.lock().shows
    }

    /// Native loaders created so far that are still alive
    pub fn live_native_loaders(&self) -> usize {
        self.state
            .lock()
            .native_loaders
            .iter()
            .filter(|loader| loader.strong_count() > 0)
            .count()
    }

    /// Number of loads waiting for a result
    pub fn pending_loads(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Deliver the oldest pending load using the next scripted result.
    /// Returns false when nothing was pending.
    pub fn complete_load(&self) -> bool {
        let (pending, script, inventory) = {
            let mut state = self.state.lock();
            let Some(pending) = state.pending.pop_front() else {
                return false;
            };
            let script = state.script.pop_front().unwrap_or(LoadScript::Fill);
            (pending, script, state.native_inventory.clone())
        };

        debug!(?script, "Simulated SDK delivering load");
        match (pending, script) {
            (PendingLoad::Banner(listener), LoadScript::Fill) => listener.on_banner_received(),
            (PendingLoad::Banner(listener), LoadScript::NoFill(_)) => listener.on_banner_failed(),
            (PendingLoad::Fullscreen { listener, ready }, LoadScript::Fill) => {
                ready.store(true, Ordering::Release);
                listener.on_receive_ad();
            }
            (PendingLoad::Fullscreen { listener, .. }, LoadScript::NoFill(message)) => {
                listener.on_failed_to_receive_ad(message.as_deref())
            }
            (PendingLoad::Native { listener, delivered }, LoadScript::Fill) => {
                *delivered.lock() = inventory;
                listener.on_receive_ad();
            }
            (PendingLoad::Native { listener, .. }, LoadScript::NoFill(message)) => {
                listener.on_failed_to_receive_ad(message.as_deref())
            }
        }
        true
    }

    /// The shown ad appeared on screen
    pub fn fire_displayed(&self) {
        if let Some(listener) = self.display_listener() {
            listener.ad_displayed();
        }
    }

    /// The shown ad could not be displayed
    pub fn fire_not_displayed(&self) {
        if let Some(listener) = self.display_listener() {
            listener.ad_not_displayed();
        }
    }

    /// The shown ad was tapped
    pub fn fire_clicked(&self) {
        if let Some(listener) = self.display_listener() {
            listener.ad_clicked();
        }
    }

    /// The shown ad was closed
    pub fn fire_hidden(&self) {
        if let Some(listener) = self.display_listener() {
            listener.ad_hidden();
        }
    }

    /// The rewarded video finished
    pub fn fire_video_completed(&self) {
        let listener = self.state.lock().video.clone();
        if let Some(listener) = listener {
            listener.on_video_completed();
        }
    }

    /// The latest banner counted an impression
    pub fn fire_banner_impression(&self) {
        if let Some(listener) = self.banner_listener() {
            listener.on_banner_impression();
        }
    }

    /// The latest banner was tapped
    pub fn fire_banner_click(&self) {
        if let Some(listener) = self.banner_listener() {
            listener.on_banner_click();
        }
    }

    fn display_listener(&self) -> Option<Arc<dyn AdDisplayListener>> {
        self.state.lock().display.clone()
    }

    fn banner_listener(&self) -> Option<Arc<dyn BannerListener>> {
        self.state.lock().banner_listener.clone()
    }

    fn step(&self, name: &'static str, step: InitStep) -> SdkResult<()> {
        let mut state = self.state.lock();
        if state.failing_steps.contains(name) {
            return Err(SdkError::Rejected {
                call: name,
                reason: "scripted failure".to_string(),
            });
        }
        state.init_steps.push(step);
        Ok(())
    }
}

impl StartAppSdk for SimulatedSdk {
    fn disable_splash(&self) -> SdkResult<()> {
        self.step("disable_splash", InitStep::DisableSplash)
    }

    fn set_consent(&self, enabled: bool) -> SdkResult<()> {
        self.step("set_consent", InitStep::Consent(enabled))
    }

    fn add_wrapper(&self, name: &str, version: &str) -> SdkResult<()> {
        self.step(
            "add_wrapper",
            InitStep::Wrapper {
                name: name.to_string(),
                version: version.to_string(),
            },
        )
    }

    fn init(&self, _context: &HostContext, app_id: &str) -> SdkResult<()> {
        self.step(
            "init",
            InitStep::Init {
                app_id: app_id.to_string(),
            },
        )
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn new_banner(
        &self,
        _context: &HostContext,
        kind: BannerKind,
        preference: &Preference,
        listener: Arc<dyn BannerListener>,
    ) -> Box<dyn BannerAd> {
        let mut state = self.state.lock();
        state.banners.push(kind);
        state.preferences.push(preference.clone());
        state.banner_listener = Some(listener.clone());

        Box::new(SimulatedBanner {
            view: ViewId::next(),
            listener,
            state: Arc::clone(&self.state),
        })
    }

    fn new_fullscreen_ad(&self, _context: &HostContext) -> Box<dyn FullscreenAd> {
        Box::new(SimulatedFullscreenAd {
            ready: Arc::new(AtomicBool::new(false)),
            state: Arc::clone(&self.state),
        })
    }

    fn new_native_loader(&self, _context: &HostContext) -> Arc<dyn NativeAdLoader> {
        let loader = Arc::new(SimulatedNativeLoader {
            delivered: Arc::new(Mutex::new(Vec::new())),
            state: Arc::clone(&self.state),
        });
        self.state.lock().native_loaders.push(Arc::downgrade(&loader));
        loader
    }
}

struct SimulatedBanner {
    view: ViewId,
    listener: Arc<dyn BannerListener>,
    state: Arc<Mutex<SimState>>,
}

impl BannerAd for SimulatedBanner {
    fn load_ad(&mut self, width_dp: u32, height_dp: u32) {
        debug!(width_dp, height_dp, "Simulated banner load");
        self.state
            .lock()
            .pending
            .push_back(PendingLoad::Banner(self.listener.clone()));
    }

    fn view(&self) -> ViewId {
        self.view
    }
}

struct SimulatedFullscreenAd {
    ready: Arc<AtomicBool>,
    state: Arc<Mutex<SimState>>,
}

impl FullscreenAd for SimulatedFullscreenAd {
    fn set_video_listener(&mut self, listener: Arc<dyn VideoListener>) {
        self.state.lock().video = Some(listener);
    }

    fn load_ad(
        &mut self,
        mode: Option<AdMode>,
        preference: &Preference,
        listener: Arc<dyn AdEventListener>,
    ) {
        let mut state = self.state.lock();
        state.modes.push(mode);
        state.preferences.push(preference.clone());
        state.pending.push_back(PendingLoad::Fullscreen {
            listener,
            ready: Arc::clone(&self.ready),
        });
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn show_ad(&mut self, listener: Arc<dyn AdDisplayListener>) -> bool {
        if !self.ready.swap(false, Ordering::AcqRel) {
            return false;
        }
        let mut state = self.state.lock();
        state.display = Some(listener);
        state.shows += 1;
        true
    }
}

struct SimulatedNativeLoader {
    delivered: Arc<Mutex<Vec<Arc<dyn NativeAdDetails>>>>,
    state: Arc<Mutex<SimState>>,
}

impl NativeAdLoader for SimulatedNativeLoader {
    fn load_ad(&self, preference: &Preference, listener: Arc<dyn AdEventListener>) {
        let mut state = self.state.lock();
        state.preferences.push(preference.clone());
        state.pending.push_back(PendingLoad::Native {
            listener,
            delivered: Arc::clone(&self.delivered),
        });
    }

    fn native_ads(&self) -> Vec<Arc<dyn NativeAdDetails>> {
        self.delivered.lock().clone()
    }
}

/// Native ad with fixed content and manual interaction callbacks
pub struct SimulatedNativeAd {
    title: String,
    description: String,
    action: CampaignAction,
    rating: f32,
    image_url: Option<String>,
    secondary_image_url: Option<String>,
    registered: Mutex<Option<(ViewId, Arc<dyn NativeAdDisplayListener>)>>,
}

impl SimulatedNativeAd {
    /// Ad with the given headline, opening a store listing
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: format!("{} description", title),
            action: CampaignAction::OpenMarket,
            rating: 4.5,
            image_url: None,
            secondary_image_url: None,
            registered: Mutex::new(None),
        }
    }

    /// Click behaviour
    pub fn with_action(mut self, action: CampaignAction) -> Self {
        self.action = action;
        self
    }

    /// Main and icon image URLs
    pub fn with_images(mut self, main: &str, icon: &str) -> Self {
        self.image_url = Some(main.to_string());
        self.secondary_image_url = Some(icon.to_string());
        self
    }

    /// View currently registered for interaction
    pub fn registered_view(&self) -> Option<ViewId> {
        self.registered.lock().as_ref().map(|(view, _)| *view)
    }

    /// The registered view came on screen
    pub fn fire_displayed(&self) {
        if let Some(listener) = self.registered_listener() {
            listener.ad_displayed();
        }
    }

    /// The registered view was tapped
    pub fn fire_clicked(&self) {
        if let Some(listener) = self.registered_listener() {
            listener.ad_clicked();
        }
    }

    fn registered_listener(&self) -> Option<Arc<dyn NativeAdDisplayListener>> {
        self.registered
            .lock()
            .as_ref()
            .map(|(_, listener)| listener.clone())
    }
}

impl NativeAdDetails for SimulatedNativeAd {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn campaign_action(&self) -> CampaignAction {
        self.action
    }

    fn rating(&self) -> f32 {
        self.rating
    }

    fn image_url(&self) -> Option<String> {
        self.image_url.clone()
    }

    fn secondary_image_url(&self) -> Option<String> {
        self.secondary_image_url.clone()
    }

    fn register_view_for_interaction(
        &self,
        view: ViewId,
        listener: Arc<dyn NativeAdDisplayListener>,
    ) {
        *self.registered.lock() = Some((view, listener));
    }

    fn unregister_view(&self) {
        self.registered.lock().take();
    }
}

/// Image pre-cacher that answers at once, recording every request
pub struct SimulatedPreCacher {
    fail: bool,
    requests: Mutex<Vec<Vec<String>>>,
}

impl SimulatedPreCacher {
    /// Every request succeeds
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every request fails with [`MediationErrorCode::ImageDownloadFailure`]
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// URL lists requested so far
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().clone()
    }
}

impl ImagePreCacher for SimulatedPreCacher {
    fn pre_cache_images(&self, urls: Vec<String>, listener: Arc<dyn ImageCacheListener>) {
        self.requests.lock().push(urls);
        if self.fail {
            listener.on_images_failed_to_cache(MediationErrorCode::ImageDownloadFailure);
        } else {
            listener.on_images_cached();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediation_adapter::{EventOutcome, RecordingListener};

    use crate::surface::SurfaceKind;
    use crate::translator::EventTranslator;

    #[test]
    fn test_loads_stay_pending_until_completed() {
        let sdk = SimulatedSdk::new();
        let recorder = RecordingListener::new();
        let translator = EventTranslator::new(SurfaceKind::Rewarded, recorder.clone());

        let mut ad = sdk.new_fullscreen_ad(&HostContext::application());
        translator.begin_load();
        ad.load_ad(
            Some(AdMode::RewardedVideo),
            &Preference::default(),
            translator.clone(),
        );

        assert_eq!(sdk.pending_loads(), 1);
        assert!(!ad.is_ready());
        assert!(recorder.outcomes().is_empty());

        assert!(sdk.complete_load());
        assert!(ad.is_ready());
        assert_eq!(recorder.outcomes(), vec![EventOutcome::Loaded]);
        assert!(!sdk.complete_load());
    }

    #[test]
    fn test_scripted_no_fill() {
        let sdk = SimulatedSdk::new();
        sdk.push_load_result(LoadScript::NoFill(Some("Empty Response".to_string())));
        let recorder = RecordingListener::new();
        let translator =
            EventTranslator::new(SurfaceKind::Interstitial { mode: None }, recorder.clone());

        let mut ad = sdk.new_fullscreen_ad(&HostContext::application());
        translator.begin_load();
        ad.load_ad(None, &Preference::default(), translator);
        sdk.complete_load();

        assert_eq!(
            recorder.outcomes(),
            vec![EventOutcome::LoadFailed(MediationErrorCode::NetworkNoFill)]
        );
        assert!(!ad.is_ready());
    }

    #[test]
    fn test_show_requires_ready() {
        let sdk = SimulatedSdk::new();
        let recorder = RecordingListener::new();
        let translator =
            EventTranslator::new(SurfaceKind::Interstitial { mode: None }, recorder);

        let mut ad = sdk.new_fullscreen_ad(&HostContext::application());
        assert!(!ad.show_ad(translator.clone()));
        assert_eq!(sdk.show_count(), 0);

        ad.load_ad(None, &Preference::default(), translator.clone());
        sdk.complete_load();
        assert!(ad.show_ad(translator.clone()));
        assert!(!ad.show_ad(translator));
        assert_eq!(sdk.show_count(), 1);
    }

    #[test]
    fn test_native_ad_registration() {
        let ad = SimulatedNativeAd::new("Game");
        assert_eq!(ad.registered_view(), None);

        struct Silent;
        impl NativeAdDisplayListener for Silent {
            fn ad_displayed(&self) {}
            fn ad_hidden(&self) {}
            fn ad_clicked(&self) {}
            fn ad_not_displayed(&self) {}
        }

        let view = ViewId::next();
        ad.register_view_for_interaction(view, Arc::new(Silent));
        assert_eq!(ad.registered_view(), Some(view));
        ad.unregister_view();
        assert_eq!(ad.registered_view(), None);
    }
}
