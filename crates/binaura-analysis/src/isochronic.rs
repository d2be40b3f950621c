//! Isochronic pulse demodulation.
//!
//! For one carrier in one channel:
//! 1. Zero-phase 4th-order Butterworth bandpass around the carrier
//! 2. Hilbert envelope of the filtered signal
//! 3. DC removal and Hann window
//! 4. Envelope spectrum, restricted to the pulse range
//! 5. Strongest bin, refined by parabolic interpolation on dB values
//!
//! Confidence is the peak magnitude over the median magnitude in the
//! pulse range. Left and right are demodulated independently; asymmetric
//! pulse designs are valid input.

use serde::Serialize;
use std::fmt;

use crate::config::AnalysisConfig;
use crate::fft::{Fft, magnitude_to_db};
use crate::filter::ButterworthBandpass;
use crate::hilbert::HilbertTransform;
use crate::spectral::{median, parabolic_offset};
use crate::tracker::TrackId;
use crate::window::to_f64;

/// Envelope modulation depth below which a carrier counts as unmodulated.
pub const MIN_MODULATION_DEPTH: f64 = 0.02;

/// Fewest samples worth demodulating.
const MIN_SAMPLES: usize = 16;

/// Fewest envelope bins needed in the pulse range.
const MIN_PULSE_BINS: usize = 3;

/// Stereo channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Left channel.
    Left,
    /// Right channel.
    Right,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Left => write!(f, "left"),
            Channel::Right => write!(f, "right"),
        }
    }
}

/// A detected pulse rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseEstimate {
    /// Refined pulse rate, Hz.
    pub pulse_hz: f64,
    /// Peak over median envelope magnitude.
    pub confidence: f64,
    /// Estimated modulation depth of the envelope (0..1).
    pub depth: f64,
}

/// Why a carrier produced no pulse measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DemodulationSkip {
    /// The clipped bandpass collapsed to an empty or invalid band.
    DegenerateBand,
    /// Too few samples, or too few envelope bins in the pulse range.
    TooShort,
    /// The envelope barely moves.
    Unmodulated {
        /// Measured modulation depth.
        depth: f64,
        /// Measured confidence.
        confidence: f64,
    },
    /// The envelope peak does not stand out from the median.
    LowConfidence {
        /// Measured confidence.
        confidence: f64,
    },
}

/// One channel's pulse measurement for one track in one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IsochronicMeasurement {
    /// Track the carrier belongs to.
    pub track_id: TrackId,
    /// Channel demodulated.
    pub channel: Channel,
    /// Window demodulated.
    pub window_index: usize,
    /// Pulse rate; present only when `confidence >= min_confidence`.
    pub pulse_hz: Option<f64>,
    /// Peak over median envelope magnitude; 0 whenever `pulse_hz` is absent.
    pub confidence: f64,
}

/// Recovers the amplitude-modulation rate riding on a carrier.
#[derive(Debug, Clone)]
pub struct IsochronicDemodulator {
    sample_rate: f64,
    bandwidth_hz: f64,
    pulse_min_hz: f64,
    pulse_max_hz: f64,
    min_confidence: f64,
    plan: Option<Fft>,
}

impl IsochronicDemodulator {
    /// Build a demodulator for a given sample rate.
    pub fn new(sample_rate: f64, config: &AnalysisConfig) -> Self {
        Self {
            sample_rate,
            bandwidth_hz: config.bandwidth_hz,
            pulse_min_hz: config.pulse_min_hz,
            pulse_max_hz: config.pulse_max_hz,
            min_confidence: config.min_confidence,
            plan: None,
        }
    }

    /// Share one FFT plan across every block of its size. Blocks of any
    /// other length are planned per call.
    #[must_use]
    pub fn with_plan(mut self, fft: Fft) -> Self {
        self.plan = Some(fft);
        self
    }

    /// Demodulate one channel block around `carrier_hz`.
    pub fn demodulate(&self, samples: &[f32], carrier_hz: f64) -> Result<PulseEstimate, DemodulationSkip> {
        let band = ButterworthBandpass::around_carrier(self.sample_rate, carrier_hz, self.bandwidth_hz)
            .ok_or(DemodulationSkip::DegenerateBand)?;
        let n = samples.len();
        if n < MIN_SAMPLES {
            return Err(DemodulationSkip::TooShort);
        }

        let plan = match &self.plan {
            Some(fft) if fft.size() == n => fft.clone(),
            _ => Fft::new(n),
        };

        let filtered = band.filtfilt(&to_f64(samples));
        let mut envelope = HilbertTransform::with_fft(plan.clone()).envelope(&filtered);
        let mean = envelope.iter().sum::<f64>() / n as f64;
        for value in &mut envelope {
            *value -= mean;
        }

        let spectrum = plan.hann_magnitude(&envelope);
        let bin_width = self.sample_rate / n as f64;
        let lo = (self.pulse_min_hz / bin_width).ceil() as usize;
        let hi = ((self.pulse_max_hz / bin_width).floor() as usize).min(spectrum.len() - 1);
        if hi < lo || hi - lo + 1 < MIN_PULSE_BINS {
            return Err(DemodulationSkip::TooShort);
        }

        let bin = (lo..=hi)
            .max_by(|&i, &j| spectrum[i].total_cmp(&spectrum[j]).then(j.cmp(&i)))
            .ok_or(DemodulationSkip::TooShort)?;
        let peak = spectrum[bin];
        let offset = if bin > 0 && bin + 1 < spectrum.len() {
            parabolic_offset(
                magnitude_to_db(spectrum[bin - 1]),
                magnitude_to_db(peak),
                magnitude_to_db(spectrum[bin + 1]),
            )
        } else {
            0.0
        };

        let mut in_range = spectrum[lo..=hi].to_vec();
        let floor = median(&mut in_range).unwrap_or(0.0);
        let confidence = peak / floor.max(1e-12);

        // A Hann-windowed sinusoid of amplitude A peaks at A * n / 4.
        let depth = if mean > 0.0 {
            4.0 * peak / (n as f64 * mean)
        } else {
            0.0
        };

        if confidence < self.min_confidence {
            return Err(DemodulationSkip::LowConfidence { confidence });
        }
        if depth < MIN_MODULATION_DEPTH {
            return Err(DemodulationSkip::Unmodulated { depth, confidence });
        }

        Ok(PulseEstimate {
            pulse_hz: (bin as f64 + offset) * bin_width,
            confidence,
            depth,
        })
    }

    /// Demodulate and package the result for the report.
    ///
    /// Every skip reports `(None, 0.0)`; the measured values survive only
    /// in the trace log.
    pub fn measure(
        &self,
        samples: &[f32],
        carrier_hz: f64,
        track_id: TrackId,
        channel: Channel,
        window_index: usize,
    ) -> IsochronicMeasurement {
        let (pulse_hz, confidence) = match self.demodulate(samples, carrier_hz) {
            Ok(estimate) => (Some(estimate.pulse_hz), estimate.confidence),
            Err(skip) => {
                tracing::trace!(track = %track_id, %channel, window = window_index, ?skip, "no pulse");
                (None, 0.0)
            }
        };
        IsochronicMeasurement {
            track_id,
            channel,
            window_index,
            pulse_hz,
            confidence,
        }
    }
}
