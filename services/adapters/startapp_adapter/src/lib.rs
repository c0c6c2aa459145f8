//! # StartApp Mediation Adapter
//!
//! ## Purpose
//!
//! Lets the mediation framework drive the StartApp SDK for banner, medium
//! rectangle, 3D banner, interstitial, rewarded video and native placements.
//! The adapter owns no ad logic: it normalizes request parameters, picks the SDK
//! ad object and translates the SDK's callbacks into framework outcomes.
//!
//! ## Integration Points
//!
//! - **Input**: [`mediation_adapter::AdData`] server extras plus publisher
//!   [`LocalExtras`], merged into one [`Preference`]
//! - **SDK**: everything goes through the [`StartAppSdk`] trait family; the
//!   [`simulator`] module provides an in-process implementation
//! - **Output**: [`mediation_adapter::EventOutcome`]s through the framework
//!   listener, one per accepted step of the cycle
//!
//! ## Architecture
//!
//! ```text
//! LocalExtras ─┐
//!              ├─ preference::merge ─> Preference ─> select_surface ─> SurfaceKind
//! RemoteExtras ┘                                                            │
//!                                                                           ▼
//! MediationListener <── EventTranslator <── SDK callbacks <── StartAppSdk ad object
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use startapp_adapter::{LocalExtras, StartappAdapter};
//! use mediation_adapter::{AdData, BaseAd, HostContext, RecordingListener};
//!
//! let mut adapter = StartappAdapter::new(sdk)
//!     .with_mediation_settings(LocalExtras::builder().mute_video().build());
//!
//! let ad_data = AdData::default()
//!     .with_format("320x50_mopub_banner")
//!     .with_size(320, 50)
//!     .with_extra("startappAppId", "200000001");
//!
//! let context = HostContext::activity(2.0);
//! adapter.check_and_initialize_sdk(&context, &ad_data);
//! adapter.load(&context, &ad_data, RecordingListener::new());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod config;
pub mod extras;
pub mod init;
pub mod native;
pub mod preference;
pub mod sdk;
pub mod simulator;
pub mod surface;
pub mod translator;

pub use adapter::StartappAdapter;
pub use config::{
    adapter_version, StartappAdapterConfig, StartappConfig, ADAPTER_NAME, AD_NETWORK_ID,
};
pub use extras::{
    keys, remote_extras_from_json, GeoLocation, ImageSize, InterstitialMode, LocalExtras,
    LocalExtrasBuilder, LocalValue, RemoteExtras,
};
pub use init::{InitSettings, InitializationGuard};
pub use native::{
    ImageCacheListener, ImagePreCacher, NativeLoadListener, StartappNative, StaticNativeAd,
};
pub use preference::{merge, merge_with_diagnostics, ExtrasIssue, Preference, PreferenceKind};
pub use sdk::{
    AdDisplayListener, AdEventListener, AdMode, BannerAd, BannerKind, BannerListener,
    CampaignAction, FullscreenAd, NativeAdDetails, NativeAdDisplayListener, NativeAdLoader,
    SdkError, SdkResult, StartAppSdk, VideoListener,
};
pub use surface::{select_surface, SurfaceKind, SurfaceRequest};
pub use translator::{classify_failure, CycleState, EventTranslator};
