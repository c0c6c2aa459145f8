//! StartApp Cycle Simulator - runs one load/show cycle against the simulated SDK
//!
//! Usage: cargo run --bin startapp_sim -- --format 320x50_mopub_banner --width 320 --height 50
//!
//! Prints every outcome the mediation framework would receive, one JSON value per line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use mediation_adapter::{init_tracing, AdData, BaseAd, ChannelListener, HostContext};
use startapp_adapter::simulator::{LoadScript, SimulatedSdk};
use startapp_adapter::{
    keys, remote_extras_from_json, CycleState, LocalExtras, StartappAdapter,
    StartappAdapterConfig,
};

#[derive(Parser, Debug)]
#[clap(name = "startapp_sim")]
struct Args {
    /// Ad unit format reported by the framework
    #[clap(long, default_value = "fullscreen_interstitial")]
    format: String,

    /// Request a rewarded video
    #[clap(long)]
    rewarded: bool,

    /// Banner width in dp
    #[clap(long)]
    width: Option<u32>,

    /// Banner height in dp
    #[clap(long)]
    height: Option<u32>,

    /// Display density of the simulated activity
    #[clap(long, default_value = "2.0")]
    density: f32,

    /// Load into an application context instead of an activity
    #[clap(long)]
    application_context: bool,

    /// StartApp application id
    #[clap(long, default_value = "200000001")]
    app_id: String,

    /// Additional server extras as a JSON object of strings
    #[clap(long)]
    extras: Option<String>,

    /// Make the load fail with this SDK message
    #[clap(long)]
    no_fill: Option<String>,

    /// Mute video ads through local extras
    #[clap(long)]
    mute_video: bool,

    /// Adapter configuration file (TOML); defaults to STARTAPP_* variables
    #[clap(long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[clap(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = match &args.config {
        Some(path) => StartappAdapterConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => StartappAdapterConfig::from_env().context("Invalid STARTAPP_* environment")?,
    };
    info!("🚀 StartApp simulator starting ({})", config.base.name);

    let sdk = SimulatedSdk::new();
    if let Some(message) = &args.no_fill {
        sdk.push_load_result(LoadScript::NoFill(Some(message.clone())));
    }

    let mut remote = match &args.extras {
        Some(json) => remote_extras_from_json(json).context("Invalid --extras")?,
        None => Default::default(),
    };
    remote.insert(keys::APP_ID.to_string(), args.app_id.clone());

    let mut ad_data = AdData::new(remote)
        .with_format(args.format.as_str())
        .with_rewarded(args.rewarded);
    if let (Some(width), Some(height)) = (args.width, args.height) {
        ad_data = ad_data.with_size(width, height);
    }

    let context = if args.application_context {
        HostContext::application()
    } else {
        HostContext::activity(args.density)
    };

    let local = if args.mute_video {
        LocalExtras::builder().mute_video().build()
    } else {
        LocalExtras::new()
    };

    let mut adapter = StartappAdapter::with_config(sdk.clone(), &config)
        .with_mediation_settings(local);
    let (listener, mut outcomes) = ChannelListener::channel();

    if adapter.check_and_initialize_sdk(&context, &ad_data) {
        info!("✅ SDK initialized");
    }

    adapter.load(&context, &ad_data, listener);
    sdk.complete_load();

    match adapter.cycle_state() {
        Some(CycleState::Loaded) if adapter.ad_view().is_some() => {
            sdk.fire_banner_impression();
        }
        Some(CycleState::Loaded) => {
            adapter.show();
            sdk.fire_displayed();
            if adapter.is_rewarded() {
                sdk.fire_video_completed();
            }
            sdk.fire_hidden();
        }
        state => warn!(?state, "⚠️ No ad to show"),
    }

    adapter.invalidate();

    while let Ok(outcome) = outcomes.try_recv() {
        println!("{}", serde_json::to_string(&outcome)?);
    }

    Ok(())
}
