//! Error types for configuration and analysis runs.
//!
//! Only run-level failures are errors. Per-window and per-carrier
//! conditions (a truncated window, no carrier above the SNR gate, a
//! degenerate bandpass) are recorded in the report instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating an [`AnalysisConfig`](crate::AnalysisConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A field holds a value the engine cannot work with
    #[error("invalid value for '{field}': {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Description of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid field error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Fatal errors that abort an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Binaural analysis needs exactly two channels
    #[error("unsupported channel layout: {channels} channel(s), expected stereo")]
    UnsupportedChannelLayout {
        /// Number of channels supplied.
        channels: usize,
    },

    /// Sample rate is zero, negative or not finite
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// The buffer holds no samples
    #[error("audio buffer is empty")]
    EmptyBuffer,

    /// Left and right channels differ in length
    #[error("channel length mismatch: left has {left} samples, right has {right}")]
    ChannelLengthMismatch {
        /// Left channel length.
        left: usize,
        /// Right channel length.
        right: usize,
    },

    /// The configuration failed validation
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience result type for analysis runs.
pub type Result<T> = std::result::Result<T, AnalysisError>;
