//! Error handling for the mxlrc-cli application
//!
//! This module provides a hierarchical error system with proper error handling
//! and user-friendly error messages. All errors are typed and can be handled
//! appropriately by different parts of the application.

use thiserror::Error;

use crate::core::musixmatch::LyricsKind;
use crate::core::scanner::TrackError;

#[derive(Error, Debug)]
pub enum MxLrcError {
    #[error("Lyrics fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio metadata error: {0}")]
    AudioMetadata(#[from] TrackError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failure taxonomy for a single lyrics fetch. Batch processing records one
/// of these per track instead of aborting the whole run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Token request failed: {reason}")]
    TokenMint { reason: String },

    #[error("Token rejected by the lyrics service")]
    Auth,

    #[error("No matching track found")]
    NotFound,

    #[error("Track found, but no {kind} lyrics are available for it")]
    LyricsUnavailable { kind: LyricsKind },

    #[error("Network error: {reason}")]
    Transport { reason: String },

    #[error("Unexpected response from the lyrics service: {reason}")]
    InvalidResponse { reason: String },
}

impl FetchError {
    /// Map a transport-layer failure onto the fetch taxonomy. Body-decode
    /// failures are response-shape problems, everything else is network.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::InvalidResponse {
                reason: err.to_string(),
            }
        } else {
            FetchError::Transport {
                reason: err.to_string(),
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Failed to determine project directories")]
    ProjectDirs,
}

pub type Result<T> = std::result::Result<T, MxLrcError>;

impl From<toml::de::Error> for MxLrcError {
    fn from(err: toml::de::Error) -> Self {
        MxLrcError::Config(ConfigError::InvalidFormat(err))
    }
}
