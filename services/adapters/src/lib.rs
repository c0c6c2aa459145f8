//! # Mediation Adapter Framework Contract
//!
//! ## Purpose
//!
//! The seam between a mediation framework and the ad network adapters it drives.
//! Each network plugin implements [`BaseAd`] for its placements and
//! [`AdapterConfiguration`] for network-wide setup; the framework in turn hands
//! the plugin a [`MediationListener`] and receives every outcome through it.
//!
//! ## Integration Points
//!
//! - **Inbound**: [`AdData`] (ad unit format, size, reward flag, server extras) and
//!   a [`HostContext`] for every load
//! - **Outbound**: [`EventOutcome`]s delivered to a [`MediationListener`], either
//!   directly or over a channel via [`ChannelListener`]
//! - **Errors**: every failure is reported once as a [`MediationErrorCode`];
//!   nothing is returned to the caller as a fatal error
//! - **Logging**: [`AdapterLogEvent`]s emitted as structured `tracing` events
//!
//! ## Adapters ARE / are NOT
//!
//! Adapters are format dispatchers, parameter normalizers and event translators.
//! They are not renderers, bidders or HTTP clients; the wrapped network SDK owns
//! all of that.
//!
//! ## Example
//!
//! ```ignore
//! use mediation_adapter::{AdData, BaseAd, ChannelListener, HostContext};
//!
//! let (listener, mut outcomes) = ChannelListener::channel();
//! let ad_data = AdData::default().with_format("320x50_mopub_banner").with_size(320, 50);
//!
//! adapter.check_and_initialize_sdk(&context, &ad_data);
//! adapter.load(&context, &ad_data, listener);
//!
//! while let Some(outcome) = outcomes.recv().await {
//!     println!("{:?}", outcome);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ad_data;
pub mod common;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod view;

pub use ad_data::{data_keys, AdData, HostContext, HostKind};
pub use common::{AdapterConfiguration, BaseAd, InitializationStatus};
pub use config::BaseAdapterConfig;
pub use error::{AdapterError, MediationErrorCode, Result};
pub use events::{
    ChannelListener, EventOutcome, MediationListener, MediationReward, RecordingListener,
};
pub use logging::{init_tracing, log_event, log_failure, AdapterLogEvent};
pub use view::{BannerContainer, ChildLayout, ViewId};
