//! # SDK Callback Translation
//!
//! ## Purpose
//!
//! Turns the StartApp SDK's asynchronous callbacks into the mediation
//! framework's listener calls for one load/show cycle. The SDK may call back on
//! any thread, more than once, or after the placement was invalidated; the
//! translator makes sure each step of the cycle is reported at most once and only
//! while a listener is attached.
//!
//! ## Cycle
//!
//! ```text
//! Idle -> Loading -> Loaded | LoadFailed
//! Loaded -> Showing -> Shown -> Dismissed
//!                   -> ShowFailed
//! Shown -> Completed -> Dismissed        (rewarded only)
//! ```
//!
//! Clicks and banner impressions do not move the cycle and are forwarded
//! whenever an ad is loaded.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use mediation_adapter::{
    log_event, log_failure, AdapterLogEvent, EventOutcome, MediationErrorCode, MediationListener,
    MediationReward,
};

use crate::config::{ADAPTER_NAME, AD_NETWORK_ID};
use crate::sdk::{AdDisplayListener, AdEventListener, BannerListener, VideoListener};
use crate::surface::SurfaceKind;

/// Position of a placement in its load/show cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CycleState {
    /// Nothing requested yet
    Idle,
    /// Waiting for the SDK to deliver
    Loading,
    /// Ad ready
    Loaded,
    /// No ad this cycle
    LoadFailed,
    /// Show requested, waiting for display
    Showing,
    /// On screen
    Shown,
    /// Could not be displayed
    ShowFailed,
    /// Rewarded video watched to the end
    Completed,
    /// Closed
    Dismissed,
}

impl CycleState {
    /// Whether an ad is loaded and not yet finished
    pub fn has_ad(&self) -> bool {
        matches!(
            self,
            CycleState::Loaded | CycleState::Showing | CycleState::Shown | CycleState::Completed
        )
    }
}

/// Map an SDK failure message to a framework error code.
///
/// The SDK signals no-fill only through its message text.
pub fn classify_failure(message: Option<&str>) -> MediationErrorCode {
    match message {
        Some(m) if m.contains("204") || m.contains("Empty Response") => {
            MediationErrorCode::NetworkNoFill
        }
        _ => MediationErrorCode::Unspecified,
    }
}

struct TranslatorState {
    cycle: CycleState,
    listener: Option<Arc<dyn MediationListener>>,
}

/// Per-cycle state machine between the SDK and the framework listener
pub struct EventTranslator {
    surface: SurfaceKind,
    inner: Mutex<TranslatorState>,
}

impl EventTranslator {
    /// Translator for one cycle of `surface`, reporting to `listener`
    pub fn new(surface: SurfaceKind, listener: Arc<dyn MediationListener>) -> Arc<Self> {
        Arc::new(Self {
            surface,
            inner: Mutex::new(TranslatorState {
                cycle: CycleState::Idle,
                listener: Some(listener),
            }),
        })
    }

    /// Surface this cycle is for
    pub fn surface(&self) -> SurfaceKind {
        self.surface
    }

    /// Current cycle state
    pub fn state(&self) -> CycleState {
        self.inner.lock().cycle
    }

    /// Whether a listener is still attached
    pub fn is_attached(&self) -> bool {
        self.inner.lock().listener.is_some()
    }

    /// Drop the listener; everything reported afterwards is discarded
    pub fn detach(&self) {
        self.inner.lock().listener = None;
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// The load request was handed to the SDK
    pub fn begin_load(&self) -> bool {
        let started = self.transition("begin_load", &[CycleState::Idle], CycleState::Loading, &[]);
        if started {
            log_event(AD_NETWORK_ID, AdapterLogEvent::LoadAttempted, ADAPTER_NAME);
        }
        started
    }

    /// The SDK delivered an ad
    pub fn load_succeeded(&self) -> bool {
        let accepted = self.transition(
            "load_succeeded",
            &[CycleState::Loading],
            CycleState::Loaded,
            &[EventOutcome::Loaded],
        );
        if accepted {
            log_event(AD_NETWORK_ID, AdapterLogEvent::LoadSuccess, ADAPTER_NAME);
        }
        accepted
    }

    /// The load ended without an ad. Accepted before the SDK was contacted too,
    /// for requests rejected up front.
    pub fn load_failed(&self, code: MediationErrorCode) -> bool {
        let accepted = self.transition(
            "load_failed",
            &[CycleState::Idle, CycleState::Loading],
            CycleState::LoadFailed,
            &[EventOutcome::LoadFailed(code)],
        );
        if accepted {
            log_failure(AD_NETWORK_ID, AdapterLogEvent::LoadFailed, ADAPTER_NAME, code);
        }
        accepted
    }

    /// A show was handed to the SDK
    pub fn begin_show(&self) -> bool {
        let started =
            self.transition("begin_show", &[CycleState::Loaded], CycleState::Showing, &[]);
        if started {
            log_event(AD_NETWORK_ID, AdapterLogEvent::ShowAttempted, ADAPTER_NAME);
        }
        started
    }

    /// A show was refused before reaching the SDK; the cycle does not move
    pub fn show_rejected(&self, code: MediationErrorCode) {
        log_failure(AD_NETWORK_ID, AdapterLogEvent::ShowFailed, ADAPTER_NAME, code);
        let listener = self.inner.lock().listener.clone();
        deliver(listener, &[EventOutcome::ShowFailed(code)]);
    }

    /// The ad is on screen
    pub fn displayed(&self) -> bool {
        let accepted = self.transition(
            "displayed",
            &[CycleState::Showing],
            CycleState::Shown,
            &[EventOutcome::Shown, EventOutcome::Impression],
        );
        if accepted {
            log_event(AD_NETWORK_ID, AdapterLogEvent::ShowSuccess, ADAPTER_NAME);
        }
        accepted
    }

    /// The SDK could not display the ad
    pub fn not_displayed(&self) -> bool {
        let code = if self.surface == SurfaceKind::Rewarded {
            MediationErrorCode::VideoPlaybackError
        } else {
            MediationErrorCode::FullscreenShowError
        };
        let accepted = self.transition(
            "not_displayed",
            &[CycleState::Showing],
            CycleState::ShowFailed,
            &[EventOutcome::ShowFailed(code)],
        );
        if accepted {
            log_failure(AD_NETWORK_ID, AdapterLogEvent::ShowFailed, ADAPTER_NAME, code);
        }
        accepted
    }

    /// The rewarded video played to the end
    pub fn video_completed(&self) -> bool {
        let accepted = self.transition(
            "video_completed",
            &[CycleState::Showing, CycleState::Shown],
            CycleState::Completed,
            &[EventOutcome::RewardGranted(MediationReward::default_success())],
        );
        if accepted {
            log_event(AD_NETWORK_ID, AdapterLogEvent::ShouldReward, ADAPTER_NAME);
        }
        accepted
    }

    /// The ad was closed
    pub fn hidden(&self) -> bool {
        let accepted = self.transition(
            "hidden",
            &[CycleState::Shown, CycleState::Completed],
            CycleState::Dismissed,
            &[EventOutcome::Dismissed],
        );
        if accepted {
            log_event(AD_NETWORK_ID, AdapterLogEvent::DidDisappear, ADAPTER_NAME);
        }
        accepted
    }

    /// The ad was tapped
    pub fn clicked(&self) -> bool {
        let forwarded = self.forward("clicked", EventOutcome::Clicked);
        if forwarded {
            for event in click_events(self.surface) {
                log_event(AD_NETWORK_ID, *event, ADAPTER_NAME);
            }
        }
        forwarded
    }

    /// A banner impression was counted
    pub fn impression(&self) -> bool {
        self.forward("impression", EventOutcome::Impression)
    }

    fn transition(
        &self,
        event: &'static str,
        from: &[CycleState],
        to: CycleState,
        outcomes: &[EventOutcome],
    ) -> bool {
        let listener = {
            let mut inner = self.inner.lock();
            if !from.contains(&inner.cycle) {
                debug!(
                    event,
                    state = ?inner.cycle,
                    surface = %self.surface,
                    "Dropping StartApp callback not valid in current state"
                );
                return false;
            }
            inner.cycle = to;
            inner.listener.clone()
        };

        deliver(listener, outcomes);
        true
    }

    fn forward(&self, event: &'static str, outcome: EventOutcome) -> bool {
        let listener = {
            let inner = self.inner.lock();
            if !inner.cycle.has_ad() {
                debug!(event, state = ?inner.cycle, "Dropping StartApp callback without an ad");
                return false;
            }
            inner.listener.clone()
        };

        deliver(listener, &[outcome]);
        true
    }
}

/// Log events for a click. Banner clicks open the landing page outside the app.
fn click_events(surface: SurfaceKind) -> &'static [AdapterLogEvent] {
    if surface.is_inline() {
        &[
            AdapterLogEvent::Clicked,
            AdapterLogEvent::WillLeaveApplication,
        ]
    } else {
        &[AdapterLogEvent::Clicked]
    }
}

/// Called outside the state lock; listeners may call back into the adapter
fn deliver(listener: Option<Arc<dyn MediationListener>>, outcomes: &[EventOutcome]) {
    match listener {
        Some(listener) => {
            for outcome in outcomes {
                outcome.clone().dispatch(listener.as_ref());
            }
        }
        None if !outcomes.is_empty() => {
            debug!(?outcomes, "Listener detached, discarding outcomes");
        }
        None => {}
    }
}

// ============================================================================
// SDK LISTENERS
// ============================================================================

impl AdEventListener for EventTranslator {
    fn on_receive_ad(&self) {
        self.load_succeeded();
    }

    fn on_failed_to_receive_ad(&self, message: Option<&str>) {
        debug!(message, "StartApp failed to receive ad");
        self.load_failed(classify_failure(message));
    }
}

impl AdDisplayListener for EventTranslator {
    fn ad_displayed(&self) {
        self.displayed();
    }

    fn ad_hidden(&self) {
        self.hidden();
    }

    fn ad_clicked(&self) {
        self.clicked();
    }

    fn ad_not_displayed(&self) {
        self.not_displayed();
    }
}

impl VideoListener for EventTranslator {
    fn on_video_completed(&self) {
        self.video_completed();
    }
}

impl BannerListener for EventTranslator {
    fn on_banner_received(&self) {
        self.load_succeeded();
    }

    fn on_banner_failed(&self) {
        self.load_failed(MediationErrorCode::NetworkNoFill);
    }

    fn on_banner_impression(&self) {
        self.impression();
    }

    fn on_banner_click(&self) {
        self.clicked();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediation_adapter::RecordingListener;

    #[test]
    fn test_only_banner_clicks_leave_application() {
        for surface in [
            SurfaceKind::Banner,
            SurfaceKind::MediumRectangle,
            SurfaceKind::Banner3D,
        ] {
            assert!(click_events(surface).contains(&AdapterLogEvent::WillLeaveApplication));
        }
        for surface in [
            SurfaceKind::Interstitial { mode: None },
            SurfaceKind::Rewarded,
        ] {
            assert_eq!(click_events(surface), &[AdapterLogEvent::Clicked]);
        }
    }

    fn translator(surface: SurfaceKind) -> (Arc<EventTranslator>, Arc<RecordingListener>) {
        let recorder = RecordingListener::new();
        (EventTranslator::new(surface, recorder.clone()), recorder)
    }

    fn loaded(surface: SurfaceKind) -> (Arc<EventTranslator>, Arc<RecordingListener>) {
        let (t, recorder) = translator(surface);
        assert!(t.begin_load());
        assert!(t.load_succeeded());
        recorder.clear();
        (t, recorder)
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify_failure(Some("Ad server returned 204")),
            MediationErrorCode::NetworkNoFill
        );
        assert_eq!(
            classify_failure(Some("Empty Response")),
            MediationErrorCode::NetworkNoFill
        );
        assert_eq!(
            classify_failure(Some("timeout")),
            MediationErrorCode::Unspecified
        );
        assert_eq!(classify_failure(None), MediationErrorCode::Unspecified);
    }

    #[test]
    fn test_load_outcome_reported_once() {
        let (t, recorder) = translator(SurfaceKind::Interstitial { mode: None });
        t.begin_load();
        t.on_receive_ad();
        t.on_receive_ad();
        t.on_failed_to_receive_ad(Some("204"));

        assert_eq!(recorder.outcomes(), vec![EventOutcome::Loaded]);
        assert_eq!(t.state(), CycleState::Loaded);
    }

    #[test]
    fn test_load_failure_classified() {
        let (t, recorder) = translator(SurfaceKind::Rewarded);
        t.begin_load();
        t.on_failed_to_receive_ad(Some("Ad server returned 204"));

        assert_eq!(
            recorder.outcomes(),
            vec![EventOutcome::LoadFailed(MediationErrorCode::NetworkNoFill)]
        );
        assert_eq!(t.state(), CycleState::LoadFailed);
    }

    #[test]
    fn test_banner_failure_is_no_fill() {
        let (t, recorder) = translator(SurfaceKind::Banner);
        t.begin_load();
        t.on_banner_failed();

        assert_eq!(
            recorder.outcomes(),
            vec![EventOutcome::LoadFailed(MediationErrorCode::NetworkNoFill)]
        );
    }

    #[test]
    fn test_display_emits_shown_and_impression() {
        let (t, recorder) = loaded(SurfaceKind::Interstitial { mode: None });
        assert!(t.begin_show());
        t.ad_displayed();
        t.ad_displayed();
        t.ad_clicked();
        t.ad_hidden();
        t.ad_hidden();

        assert_eq!(
            recorder.outcomes(),
            vec![
                EventOutcome::Shown,
                EventOutcome::Impression,
                EventOutcome::Clicked,
                EventOutcome::Dismissed,
            ]
        );
    }

    #[test]
    fn test_reward_once_then_dismissed() {
        let (t, recorder) = loaded(SurfaceKind::Rewarded);
        t.begin_show();
        t.ad_displayed();
        t.on_video_completed();
        t.on_video_completed();
        t.ad_hidden();

        let reward = EventOutcome::RewardGranted(MediationReward::default_success());
        assert_eq!(recorder.count(&reward), 1);
        assert_eq!(recorder.count(&EventOutcome::Dismissed), 1);
        assert_eq!(recorder.outcomes().last(), Some(&EventOutcome::Dismissed));
        assert_eq!(t.state(), CycleState::Dismissed);
    }

    #[test]
    fn test_dismissal_without_completion_grants_nothing() {
        let (t, recorder) = loaded(SurfaceKind::Rewarded);
        t.begin_show();
        t.ad_displayed();
        t.ad_hidden();
        t.on_video_completed();

        assert!(recorder
            .outcomes()
            .iter()
            .all(|o| !matches!(o, EventOutcome::RewardGranted(_))));
    }

    #[test]
    fn test_not_displayed_code_depends_on_surface() {
        let (t, recorder) = loaded(SurfaceKind::Rewarded);
        t.begin_show();
        t.ad_not_displayed();
        assert_eq!(
            recorder.outcomes(),
            vec![EventOutcome::ShowFailed(MediationErrorCode::VideoPlaybackError)]
        );

        let (t, recorder) = loaded(SurfaceKind::Interstitial { mode: None });
        t.begin_show();
        t.ad_not_displayed();
        assert_eq!(
            recorder.outcomes(),
            vec![EventOutcome::ShowFailed(MediationErrorCode::FullscreenShowError)]
        );
    }

    #[test]
    fn test_show_rejected_keeps_state() {
        let (t, recorder) = translator(SurfaceKind::Interstitial { mode: None });
        t.show_rejected(MediationErrorCode::FullscreenShowError);

        assert_eq!(
            recorder.outcomes(),
            vec![EventOutcome::ShowFailed(MediationErrorCode::FullscreenShowError)]
        );
        assert_eq!(t.state(), CycleState::Idle);
    }

    #[test]
    fn test_detached_translator_drops_outcomes() {
        let (t, recorder) = translator(SurfaceKind::Banner);
        t.begin_load();
        t.detach();
        t.on_banner_received();
        t.on_banner_impression();

        assert!(recorder.outcomes().is_empty());
        assert!(!t.is_attached());
    }

    #[test]
    fn test_banner_clicks_and_impressions_need_an_ad() {
        let (t, recorder) = translator(SurfaceKind::Banner);
        t.begin_load();
        t.on_banner_click();
        t.on_banner_received();
        t.on_banner_impression();
        t.on_banner_click();
        t.on_banner_impression();

        assert_eq!(
            recorder.outcomes(),
            vec![
                EventOutcome::Loaded,
                EventOutcome::Impression,
                EventOutcome::Clicked,
                EventOutcome::Impression,
            ]
        );
    }
}
