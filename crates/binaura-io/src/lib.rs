//! Audio file input for the Binaura analysis engine.
//!
//! This crate provides:
//!
//! - **WAV decoding**: [`read_wav_channels`] loads PCM or float WAV files
//!   as one vector per channel, without mixing
//! - **WAV metadata**: [`read_wav_info`] reads the header only
//! - **WAV encoding**: [`write_wav_channels`] for generated test material
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use binaura_io::read_wav_channels;
//! use binaura_analysis::{AnalysisConfig, Analyzer, StereoBuffer};
//!
//! let (channels, spec) = read_wav_channels("session.wav")?;
//! let buffer = StereoBuffer::from_channels(channels, f64::from(spec.sample_rate))?;
//! let report = Analyzer::new(AnalysisConfig::default())?.analyze(&buffer)?;
//! ```

mod wav;

pub use wav::{
    WavFormat, WavInfo, WavSpec, deinterleave, read_wav_channels, read_wav_info, write_wav_channels,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Channel data that cannot be written as a WAV file.
    #[error("Invalid channel layout: {0}")]
    InvalidLayout(String),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
