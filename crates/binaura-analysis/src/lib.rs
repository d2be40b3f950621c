//! Binaura Analysis - Binaural beat and isochronic pulse tracking
//!
//! This crate follows the carrier pairs of stereo entrainment audio
//! through time and measures what each pair does:
//!
//! - [`window`] - Stereo buffer and overlapping window slicing
//! - [`fft`] - FFT wrapper and Hann windowing
//! - [`spectral`] - SNR-gated spectral peaks with sub-bin refinement
//! - [`pairs`] - Cross-channel carrier pairing and clustering
//! - [`tracker`] - Optimal-assignment carrier tracking and fragment merging
//! - [`filter`] - Zero-phase Butterworth bandpass
//! - [`hilbert`] - Hilbert transform for amplitude envelopes
//! - [`isochronic`] - Pulse rate demodulation
//! - [`report`] - Per-window records and per-track summaries
//! - [`analyzer`] - The pipeline driving all of the above
//! - [`config`] - TOML-backed analysis configuration
//!
//! ## Example Workflow
//!
//! ```rust,ignore
//! use binaura_analysis::{AnalysisConfig, Analyzer, StereoBuffer};
//!
//! // 1. Decode a stereo recording (binaura-io does this for WAV)
//! let buffer = StereoBuffer::from_channels(channels, 44100.0)?;
//!
//! // 2. Run the pipeline
//! let analyzer = Analyzer::new(AnalysisConfig::default())?;
//! let report = analyzer.analyze(&buffer)?;
//!
//! // 3. Read the per-track summaries
//! for track in &report.tracks {
//!     println!("track {}: {:.2} Hz beat", track.track_id, track.mean_binaural_hz);
//! }
//! ```
//!
//! ## Single-Block Tools
//!
//! ```rust,ignore
//! use binaura_analysis::spectral::{estimate_peak, PeakSearch};
//! use binaura_analysis::isochronic::IsochronicDemodulator;
//!
//! let search = PeakSearch { freq_min: 20.0, freq_max: 1500.0, min_snr_db: 15.0, guard_hz: 5.0 };
//! let peak = estimate_peak(&left, 44100.0, &search);
//!
//! let demod = IsochronicDemodulator::new(44100.0, &AnalysisConfig::default());
//! let pulse = demod.demodulate(&left, 200.0);
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod fft;
pub mod filter;
pub mod hilbert;
pub mod isochronic;
pub mod pairs;
pub mod report;
pub mod spectral;
pub mod tracker;
pub mod window;

pub use analyzer::{Analyzer, DetectionMode};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, ConfigError, Result};
pub use fft::Fft;
pub use filter::ButterworthBandpass;
pub use hilbert::HilbertTransform;
pub use isochronic::{Channel, DemodulationSkip, IsochronicDemodulator, IsochronicMeasurement, PulseEstimate};
pub use pairs::{CarrierPair, CarrierPairDetector};
pub use report::{AnalysisReport, ReportAssembler, ReportRecord, TrackSummary, WindowStatus, WindowSummary};
pub use spectral::{ChannelSpectrum, PeakSearch, SpectralPeak};
pub use tracker::{CarrierTrack, CarrierTracker, TrackId, TrackStatus, TrackerParams};
pub use window::{AnalysisWindow, StereoBuffer, WindowSampler};
