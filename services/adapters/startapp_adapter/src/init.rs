//! One-time SDK initialization
//!
//! The StartApp SDK must be initialized once per process, before the first ad
//! request. Several placements may race to do it; exactly one of them runs the
//! sequence and the rest see it as done.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mediation_adapter::HostContext;

use crate::sdk::{SdkResult, StartAppSdk};

static GLOBAL_GUARD: Lazy<InitializationGuard> = Lazy::new(InitializationGuard::new);

/// Options applied during initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitSettings {
    /// Mediation platform name registered with the SDK
    pub wrapper_name: String,
    /// Adapter version registered with the SDK
    pub wrapper_version: String,
    /// Whether the SDK shows its own consent dialog
    pub consent_enabled: bool,
    /// Whether the SDK splash screen is left on
    pub splash_enabled: bool,
}

impl Default for InitSettings {
    fn default() -> Self {
        Self {
            wrapper_name: "MoPub".to_string(),
            wrapper_version: env!("CARGO_PKG_VERSION").to_string(),
            consent_enabled: false,
            splash_enabled: false,
        }
    }
}

/// At-most-once initialization of the StartApp SDK
#[derive(Debug, Default)]
pub struct InitializationGuard {
    initialized: AtomicBool,
}

impl InitializationGuard {
    /// Fresh, uninitialized guard
    pub fn new() -> Self {
        Self::default()
    }

    /// The guard shared by every placement in the process
    pub fn global() -> &'static InitializationGuard {
        &GLOBAL_GUARD
    }

    /// Whether some call has already run the sequence
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Initialize the SDK unless that already happened.
    ///
    /// Returns true only for the call that ran the sequence. A missing or empty
    /// app id returns false without touching the SDK or the flag. Individual
    /// steps are best-effort: a failing step is logged and the rest still run.
    pub fn try_initialize(
        &self,
        sdk: &dyn StartAppSdk,
        context: &HostContext,
        app_id: Option<&str>,
        settings: &InitSettings,
    ) -> bool {
        let app_id = match app_id {
            Some(id) if !id.is_empty() => id,
            _ => return false,
        };

        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        if !settings.splash_enabled {
            best_effort("disable_splash", sdk.disable_splash());
        }
        best_effort("set_consent", sdk.set_consent(settings.consent_enabled));
        best_effort(
            "add_wrapper",
            sdk.add_wrapper(&settings.wrapper_name, &settings.wrapper_version),
        );
        best_effort("init", sdk.init(context, app_id));

        info!(app_id, sdk_version = %sdk.version(), "✅ StartApp SDK initialized");
        true
    }
}

fn best_effort(step: &'static str, result: SdkResult<()>) {
    if let Err(e) = result {
        warn!(step, error = %e, "⚠️ StartApp initialization step failed, continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{InitStep, SimulatedSdk};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn ctx() -> HostContext {
        HostContext::activity(2.0)
    }

    #[test]
    fn test_runs_sequence_in_order_once() {
        let guard = InitializationGuard::new();
        let sdk = SimulatedSdk::new();
        let settings = InitSettings::default();

        assert!(guard.try_initialize(sdk.as_ref(), &ctx(), Some("200000001"), &settings));
        assert!(!guard.try_initialize(sdk.as_ref(), &ctx(), Some("200000001"), &settings));
        assert!(guard.is_initialized());

        assert_eq!(
            sdk.init_steps(),
            vec![
                InitStep::DisableSplash,
                InitStep::Consent(false),
                InitStep::Wrapper {
                    name: "MoPub".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                InitStep::Init {
                    app_id: "200000001".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_missing_app_id_has_no_side_effect() {
        let guard = InitializationGuard::new();
        let sdk = SimulatedSdk::new();
        let settings = InitSettings::default();

        assert!(!guard.try_initialize(sdk.as_ref(), &ctx(), None, &settings));
        assert!(!guard.try_initialize(sdk.as_ref(), &ctx(), Some(""), &settings));
        assert!(!guard.is_initialized());
        assert!(sdk.init_steps().is_empty());

        assert!(guard.try_initialize(sdk.as_ref(), &ctx(), Some("1"), &settings));
    }

    #[test]
    fn test_failing_step_does_not_stop_sequence() {
        let guard = InitializationGuard::new();
        let sdk = SimulatedSdk::new();
        sdk.fail_step("set_consent");

        assert!(guard.try_initialize(sdk.as_ref(), &ctx(), Some("1"), &InitSettings::default()));
        let steps = sdk.init_steps();
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps.last(),
            Some(&InitStep::Init {
                app_id: "1".to_string()
            })
        );
    }

    #[test]
    fn test_splash_left_on_when_enabled() {
        let guard = InitializationGuard::new();
        let sdk = SimulatedSdk::new();
        let settings = InitSettings {
            splash_enabled: true,
            consent_enabled: true,
            ..InitSettings::default()
        };

        assert!(guard.try_initialize(sdk.as_ref(), &ctx(), Some("1"), &settings));
        let steps = sdk.init_steps();
        assert!(!steps.contains(&InitStep::DisableSplash));
        assert_eq!(steps[0], InitStep::Consent(true));
    }

    #[test]
    fn test_concurrent_first_calls_initialize_once() {
        const THREADS: usize = 16;

        let guard = Arc::new(InitializationGuard::new());
        let sdk = SimulatedSdk::new();
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let sdk = Arc::clone(&sdk);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    guard.try_initialize(
                        sdk.as_ref(),
                        &HostContext::application(),
                        Some("200000001"),
                        &InitSettings::default(),
                    )
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        let inits = sdk
            .init_steps()
            .into_iter()
            .filter(|step| matches!(step, InitStep::Init { .. }))
            .count();
        assert_eq!(inits, 1);
    }
}
