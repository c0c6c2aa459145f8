//! Structured adapter log events
//!
//! The mediation framework traces every adapter through the same small set of
//! lifecycle events. They are emitted as `tracing` events carrying the network
//! id, the adapter name and, for failures, the error code.

use std::fmt;

use tracing_subscriber::EnvFilter;

use crate::MediationErrorCode;

/// Lifecycle events every adapter reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterLogEvent {
    /// A load request was handed to the network
    LoadAttempted,
    /// The network delivered an ad
    LoadSuccess,
    /// The network failed to deliver an ad
    LoadFailed,
    /// A show was requested
    ShowAttempted,
    /// The ad was displayed
    ShowSuccess,
    /// The ad could not be displayed
    ShowFailed,
    /// The ad was clicked
    Clicked,
    /// A click is about to leave the application
    WillLeaveApplication,
    /// The ad left the screen
    DidDisappear,
    /// The user earned the reward
    ShouldReward,
}

impl AdapterLogEvent {
    /// Upper-case event name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterLogEvent::LoadAttempted => "LOAD_ATTEMPTED",
            AdapterLogEvent::LoadSuccess => "LOAD_SUCCESS",
            AdapterLogEvent::LoadFailed => "LOAD_FAILED",
            AdapterLogEvent::ShowAttempted => "SHOW_ATTEMPTED",
            AdapterLogEvent::ShowSuccess => "SHOW_SUCCESS",
            AdapterLogEvent::ShowFailed => "SHOW_FAILED",
            AdapterLogEvent::Clicked => "CLICKED",
            AdapterLogEvent::WillLeaveApplication => "WILL_LEAVE_APPLICATION",
            AdapterLogEvent::DidDisappear => "DID_DISAPPEAR",
            AdapterLogEvent::ShouldReward => "SHOULD_REWARD",
        }
    }
}

impl fmt::Display for AdapterLogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit a lifecycle event for `network` on behalf of `adapter`
pub fn log_event(network: &str, event: AdapterLogEvent, adapter: &str) {
    tracing::debug!(network, adapter, event = event.as_str(), "adapter event");
}

/// Emit a failure event carrying the framework error code
pub fn log_failure(network: &str, event: AdapterLogEvent, adapter: &str, code: MediationErrorCode) {
    tracing::warn!(
        network,
        adapter,
        event = event.as_str(),
        code = code.int_code(),
        reason = %code,
        "adapter event"
    );
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to `default_level`.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(AdapterLogEvent::LoadAttempted.to_string(), "LOAD_ATTEMPTED");
        assert_eq!(
            AdapterLogEvent::WillLeaveApplication.as_str(),
            "WILL_LEAVE_APPLICATION"
        );
    }

    #[test]
    fn test_init_tracing_is_reentrant() {
        init_tracing("debug");
        init_tracing("info");
        log_event("TestNetwork", AdapterLogEvent::LoadSuccess, "TestAdapter");
        log_failure(
            "TestNetwork",
            AdapterLogEvent::LoadFailed,
            "TestAdapter",
            MediationErrorCode::NetworkNoFill,
        );
    }
}
