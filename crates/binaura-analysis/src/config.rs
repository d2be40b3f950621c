//! Analysis configuration.
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! window_sec = 8.0
//! step_sec = 2.0
//! freq_max = 1000.0
//! min_snr_db = 12.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Tunable parameters of the carrier tracking pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analysis window length in seconds.
    pub window_sec: f64,
    /// Hop between window starts in seconds.
    pub step_sec: f64,
    /// Lowest carrier frequency searched, Hz.
    pub freq_min: f64,
    /// Highest carrier frequency searched, Hz.
    pub freq_max: f64,
    /// Smallest accepted binaural beat, Hz.
    pub beat_min: f64,
    /// Largest accepted binaural beat, Hz.
    pub beat_max: f64,
    /// Half-width of the demodulation bandpass around a carrier, Hz.
    pub bandwidth_hz: f64,
    /// Minimum peak height above the median noise floor, dB.
    pub min_snr_db: f64,
    /// Minimum envelope peak-to-median ratio for a pulse to be reported.
    pub min_confidence: f64,
    /// Assignments costing more than this become births instead.
    pub max_assignment_cost: f64,
    /// Raw pairs whose centers lie within this radius share a cluster, Hz.
    pub cluster_radius_hz: f64,
    /// Consecutive missed windows a track survives.
    pub missed_window_limit: u32,
    /// Half-width of the band excluded from the noise floor around a peak, Hz.
    pub guard_hz: f64,
    /// Peaks further than this below the strongest in-range bin are ignored, dB.
    pub peak_threshold_db: f64,
    /// Maximum peaks kept per channel per window.
    pub max_peaks: usize,
    /// Cost per Hz of center frequency change.
    pub frequency_weight: f64,
    /// Cost per dB of average power change.
    pub power_weight: f64,
    /// Lowest pulse rate searched in the envelope, Hz.
    pub pulse_min_hz: f64,
    /// Highest pulse rate searched in the envelope, Hz.
    ///
    /// Modulation at rate `m` puts sidebands `m` Hz either side of each
    /// carrier, and sideband pairs only fold into the carrier's cluster
    /// while `m <= cluster_radius_hz`. Raise both together for gamma-rate
    /// material.
    pub pulse_max_hz: f64,
    /// Largest gap, in windows, bridged when merging track fragments.
    pub merge_max_gap_windows: usize,
    /// Maximum deviation from the extrapolated trajectory for a merge, Hz.
    pub merge_tolerance_hz: f64,
    /// Discover carriers once from this many leading seconds, then only
    /// re-measure them. `None` scans every window in full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_sec: Option<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_sec: 10.0,
            step_sec: 5.0,
            freq_min: 20.0,
            freq_max: 1500.0,
            beat_min: 0.5,
            beat_max: 40.0,
            bandwidth_hz: 50.0,
            min_snr_db: 15.0,
            min_confidence: 4.0,
            max_assignment_cost: 10.0,
            cluster_radius_hz: 25.0,
            missed_window_limit: 2,
            guard_hz: 5.0,
            peak_threshold_db: 30.0,
            max_peaks: 8,
            frequency_weight: 1.0,
            power_weight: 0.05,
            pulse_min_hz: 0.5,
            pulse_max_hz: 25.0,
            merge_max_gap_windows: 3,
            merge_tolerance_hz: 5.0,
            discovery_sec: None,
        }
    }
}

fn require(ok: bool, field: &'static str, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, reason))
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl AnalysisConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every field is usable.
    ///
    /// Sample-rate dependent checks (window length in samples) happen in
    /// the analyzer, where the rate is known.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(positive(self.window_sec), "window_sec", "must be a positive number of seconds")?;
        require(positive(self.step_sec), "step_sec", "must be a positive number of seconds")?;
        require(non_negative(self.freq_min), "freq_min", "must be non-negative")?;
        require(
            self.freq_max.is_finite() && self.freq_max > self.freq_min,
            "freq_max",
            "must be greater than freq_min",
        )?;
        require(non_negative(self.beat_min), "beat_min", "must be non-negative")?;
        require(
            self.beat_max.is_finite() && self.beat_max >= self.beat_min,
            "beat_max",
            "must not be less than beat_min",
        )?;
        require(positive(self.bandwidth_hz), "bandwidth_hz", "must be positive")?;
        require(self.min_snr_db.is_finite(), "min_snr_db", "must be finite")?;
        require(non_negative(self.min_confidence), "min_confidence", "must be non-negative")?;
        require(
            positive(self.max_assignment_cost),
            "max_assignment_cost",
            "must be positive",
        )?;
        require(non_negative(self.cluster_radius_hz), "cluster_radius_hz", "must be non-negative")?;
        require(non_negative(self.guard_hz), "guard_hz", "must be non-negative")?;
        require(positive(self.peak_threshold_db), "peak_threshold_db", "must be positive")?;
        require(self.max_peaks > 0, "max_peaks", "must keep at least one peak")?;
        require(positive(self.frequency_weight), "frequency_weight", "must be positive")?;
        require(non_negative(self.power_weight), "power_weight", "must be non-negative")?;
        require(positive(self.pulse_min_hz), "pulse_min_hz", "must be positive")?;
        require(
            self.pulse_max_hz.is_finite() && self.pulse_max_hz > self.pulse_min_hz,
            "pulse_max_hz",
            "must be greater than pulse_min_hz",
        )?;
        require(
            self.pulse_max_hz <= self.cluster_radius_hz,
            "pulse_max_hz",
            "must not exceed cluster_radius_hz, or modulation sidebands split into extra carrier pairs",
        )?;
        require(
            non_negative(self.merge_tolerance_hz),
            "merge_tolerance_hz",
            "must be non-negative",
        )?;
        if let Some(sample_sec) = self.discovery_sec {
            require(positive(sample_sec), "discovery_sec", "must be a positive number of seconds")?;
        }
        Ok(())
    }
}
