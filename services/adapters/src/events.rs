//! # Mediation Event Contract
//!
//! Outcomes an adapter reports to the mediation framework, the listener trait the
//! framework implements, and two ready-made listeners: one that forwards outcomes
//! over a channel and one that records them.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::MediationErrorCode;

/// Reward handed to the framework when a rewarded ad completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediationReward {
    /// Currency label
    pub label: String,
    /// Amount granted
    pub amount: i32,
}

impl MediationReward {
    /// Label used when the network does not name a currency
    pub const NO_REWARD_LABEL: &'static str = "";

    /// Amount used when the network does not report one
    pub const DEFAULT_REWARD_AMOUNT: i32 = 0;

    /// Successful reward with an explicit label and amount
    pub fn success(label: impl Into<String>, amount: i32) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }

    /// Successful reward carrying the framework defaults
    pub fn default_success() -> Self {
        Self::success(Self::NO_REWARD_LABEL, Self::DEFAULT_REWARD_AMOUNT)
    }
}

/// Normalized outcome of one step of a load/show cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOutcome {
    /// Ad finished loading
    Loaded,
    /// Ad failed to load
    LoadFailed(MediationErrorCode),
    /// Ad is on screen
    Shown,
    /// Impression was counted
    Impression,
    /// User clicked the ad
    Clicked,
    /// Ad left the screen
    Dismissed,
    /// User earned the reward
    RewardGranted(MediationReward),
    /// Ad could not be shown
    ShowFailed(MediationErrorCode),
}

impl EventOutcome {
    /// Deliver this outcome to the matching listener method
    pub fn dispatch(self, listener: &dyn MediationListener) {
        match self {
            EventOutcome::Loaded => listener.on_ad_loaded(),
            EventOutcome::LoadFailed(code) => listener.on_ad_load_failed(code),
            EventOutcome::Shown => listener.on_ad_shown(),
            EventOutcome::Impression => listener.on_ad_impression(),
            EventOutcome::Clicked => listener.on_ad_clicked(),
            EventOutcome::Dismissed => listener.on_ad_dismissed(),
            EventOutcome::RewardGranted(reward) => listener.on_ad_complete(reward),
            EventOutcome::ShowFailed(code) => listener.on_ad_failed(code),
        }
    }

    /// Whether this outcome ends the load phase
    pub fn is_load_terminal(&self) -> bool {
        matches!(self, EventOutcome::Loaded | EventOutcome::LoadFailed(_))
    }
}

/// Callbacks the mediation framework receives from an adapter.
///
/// Implementations must tolerate being called from any thread: network SDK
/// callbacks are forwarded on whatever thread they arrive.
pub trait MediationListener: Send + Sync {
    /// Load succeeded
    fn on_ad_loaded(&self);

    /// Load failed
    fn on_ad_load_failed(&self, error: MediationErrorCode);

    /// Ad was displayed
    fn on_ad_shown(&self);

    /// Show failed
    fn on_ad_failed(&self, error: MediationErrorCode);

    /// Impression recorded
    fn on_ad_impression(&self);

    /// Ad clicked
    fn on_ad_clicked(&self);

    /// Ad dismissed
    fn on_ad_dismissed(&self);

    /// Reward granted
    fn on_ad_complete(&self, reward: MediationReward);
}

/// Listener that forwards every outcome over an unbounded channel.
///
/// Sending never blocks, so it is safe to use from SDK callback threads. Outcomes
/// sent after the receiver is dropped are discarded.
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<EventOutcome>,
}

impl ChannelListener {
    /// Create a listener and the receiving half of its channel
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<EventOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }

    fn send(&self, outcome: EventOutcome) {
        if self.tx.send(outcome).is_err() {
            tracing::debug!("outcome receiver dropped, discarding event");
        }
    }
}

impl MediationListener for ChannelListener {
    fn on_ad_loaded(&self) {
        self.send(EventOutcome::Loaded);
    }

    fn on_ad_load_failed(&self, error: MediationErrorCode) {
        self.send(EventOutcome::LoadFailed(error));
    }

    fn on_ad_shown(&self) {
        self.send(EventOutcome::Shown);
    }

    fn on_ad_failed(&self, error: MediationErrorCode) {
        self.send(EventOutcome::ShowFailed(error));
    }

    fn on_ad_impression(&self) {
        self.send(EventOutcome::Impression);
    }

    fn on_ad_clicked(&self) {
        self.send(EventOutcome::Clicked);
    }

    fn on_ad_dismissed(&self) {
        self.send(EventOutcome::Dismissed);
    }

    fn on_ad_complete(&self, reward: MediationReward) {
        self.send(EventOutcome::RewardGranted(reward));
    }
}

/// Listener that keeps every outcome in arrival order
#[derive(Default)]
pub struct RecordingListener {
    outcomes: Mutex<Vec<EventOutcome>>,
}

impl RecordingListener {
    /// Create an empty recorder
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything recorded so far
    pub fn outcomes(&self) -> Vec<EventOutcome> {
        self.outcomes.lock().clone()
    }

    /// Number of recorded outcomes equal to `outcome`
    pub fn count(&self, outcome: &EventOutcome) -> usize {
        self.outcomes.lock().iter().filter(|o| *o == outcome).count()
    }

    /// Drop everything recorded so far
    pub fn clear(&self) {
        self.outcomes.lock().clear();
    }

    fn push(&self, outcome: EventOutcome) {
        self.outcomes.lock().push(outcome);
    }
}

impl MediationListener for RecordingListener {
    fn on_ad_loaded(&self) {
        self.push(EventOutcome::Loaded);
    }

    fn on_ad_load_failed(&self, error: MediationErrorCode) {
        self.push(EventOutcome::LoadFailed(error));
    }

    fn on_ad_shown(&self) {
        self.push(EventOutcome::Shown);
    }

    fn on_ad_failed(&self, error: MediationErrorCode) {
        self.push(EventOutcome::ShowFailed(error));
    }

    fn on_ad_impression(&self) {
        self.push(EventOutcome::Impression);
    }

    fn on_ad_clicked(&self) {
        self.push(EventOutcome::Clicked);
    }

    fn on_ad_dismissed(&self) {
        self.push(EventOutcome::Dismissed);
    }

    fn on_ad_complete(&self, reward: MediationReward) {
        self.push(EventOutcome::RewardGranted(reward));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_routes_to_listener_method() {
        let recorder = RecordingListener::new();

        EventOutcome::Loaded.dispatch(recorder.as_ref());
        EventOutcome::ShowFailed(MediationErrorCode::FullscreenShowError)
            .dispatch(recorder.as_ref());
        EventOutcome::RewardGranted(MediationReward::default_success())
            .dispatch(recorder.as_ref());

        assert_eq!(
            recorder.outcomes(),
            vec![
                EventOutcome::Loaded,
                EventOutcome::ShowFailed(MediationErrorCode::FullscreenShowError),
                EventOutcome::RewardGranted(MediationReward::success("", 0)),
            ]
        );
    }

    #[tokio::test]
    async fn test_channel_listener_preserves_order() {
        let (listener, mut rx) = ChannelListener::channel();

        listener.on_ad_loaded();
        listener.on_ad_shown();
        listener.on_ad_impression();
        listener.on_ad_dismissed();
        drop(listener);

        let mut received = Vec::new();
        while let Some(outcome) = rx.recv().await {
            received.push(outcome);
        }

        assert_eq!(
            received,
            vec![
                EventOutcome::Loaded,
                EventOutcome::Shown,
                EventOutcome::Impression,
                EventOutcome::Dismissed,
            ]
        );
    }

    #[test]
    fn test_channel_listener_survives_dropped_receiver() {
        let (listener, rx) = ChannelListener::channel();
        drop(rx);
        listener.on_ad_clicked();
    }

    #[test]
    fn test_load_terminal_outcomes() {
        assert!(EventOutcome::Loaded.is_load_terminal());
        assert!(EventOutcome::LoadFailed(MediationErrorCode::Unspecified).is_load_terminal());
        assert!(!EventOutcome::Shown.is_load_terminal());
    }
}
