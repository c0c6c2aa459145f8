//! Error types for the mediation adapter layer

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Error vocabulary of the mediation framework.
///
/// Every failure an adapter observes is reported to the framework as exactly one
/// of these codes through the listener contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediationErrorCode {
    /// The network had no inventory for the request
    NetworkNoFill,
    /// Any load failure the network did not classify
    Unspecified,
    /// The request could not be issued (missing app id, dimensions, wrong host)
    AdapterConfigurationError,
    /// A full-screen ad was not ready or could not be displayed
    FullscreenShowError,
    /// A rewarded video was shown before it finished loading
    VideoDownloadError,
    /// A rewarded video failed while rendering
    VideoPlaybackError,
    /// Native ad images could not be pre-cached
    ImageDownloadFailure,
}

impl MediationErrorCode {
    /// Numeric code reported alongside log events
    pub fn int_code(&self) -> u32 {
        match self {
            MediationErrorCode::NetworkNoFill => 3,
            MediationErrorCode::Unspecified => 10000,
            MediationErrorCode::AdapterConfigurationError => 10001,
            MediationErrorCode::FullscreenShowError => 10010,
            MediationErrorCode::VideoDownloadError => 10020,
            MediationErrorCode::VideoPlaybackError => 10021,
            MediationErrorCode::ImageDownloadFailure => 10030,
        }
    }

    /// Whether the code originates at show time rather than load time
    pub fn is_show_error(&self) -> bool {
        matches!(
            self,
            MediationErrorCode::FullscreenShowError
                | MediationErrorCode::VideoDownloadError
                | MediationErrorCode::VideoPlaybackError
        )
    }
}

impl fmt::Display for MediationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MediationErrorCode::NetworkNoFill => "No ads found.",
            MediationErrorCode::Unspecified => "Unspecified error.",
            MediationErrorCode::AdapterConfigurationError => {
                "Network adapter configuration error."
            }
            MediationErrorCode::FullscreenShowError => "Failed to show full screen ad.",
            MediationErrorCode::VideoDownloadError => "Failed to download video.",
            MediationErrorCode::VideoPlaybackError => "Failed to play video.",
            MediationErrorCode::ImageDownloadFailure => "Failed to download native images.",
        };
        f.write_str(text)
    }
}

/// Main error type for adapter operations
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Configuration error in adapter settings or request data
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Banner requested without both width and height
    #[error("Missing ad dimensions (width: {width:?}, height: {height:?})")]
    MissingDimensions {
        /// Requested width in dp, if any
        width: Option<u32>,
        /// Requested height in dp, if any
        height: Option<u32>,
    },

    /// The host context cannot carry the requested surface
    #[error("Unsupported host context for {surface}: an activity is required")]
    UnsupportedHost {
        /// Surface that was requested
        surface: String,
    },

    /// The wrapped network SDK reported a load failure
    #[error("Network failed to load ad: {code}")]
    LoadFailed {
        /// Classified failure
        code: MediationErrorCode,
        /// Raw message from the network, when it gave one
        message: Option<String>,
    },

    /// A show was requested that cannot be honoured
    #[error("Show failed: {0}")]
    ShowFailed(MediationErrorCode),

    /// The wrapped network SDK rejected a call
    #[error("Network SDK error: {0}")]
    Sdk(String),

    /// JSON decoding error for server-delivered extras
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML decoding error for configuration files
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    /// Framework error code this error is reported as
    pub fn error_code(&self) -> MediationErrorCode {
        match self {
            AdapterError::Configuration(_)
            | AdapterError::MissingDimensions { .. }
            | AdapterError::UnsupportedHost { .. }
            | AdapterError::JsonParse(_)
            | AdapterError::TomlParse(_)
            | AdapterError::Io(_) => MediationErrorCode::AdapterConfigurationError,
            AdapterError::LoadFailed { code, .. } => *code,
            AdapterError::ShowFailed(code) => *code,
            AdapterError::Sdk(_) => MediationErrorCode::Unspecified,
        }
    }

    /// Check if this error is fatal to the request before the network is contacted
    pub fn is_configuration(&self) -> bool {
        self.error_code() == MediationErrorCode::AdapterConfigurationError
    }
}
