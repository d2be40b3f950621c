//! SNR-gated spectral peak estimation.
//!
//! A channel block is Hann-windowed and transformed once into a dB
//! magnitude spectrum ([`ChannelSpectrum`]). Peaks are located inside a
//! frequency range, refined between bins by parabolic interpolation over
//! the three dB values around the maximum, and accepted only when they
//! rise at least `min_snr_db` above the median of the range with a guard
//! band around the peak removed. The guard band keeps the peak's own
//! main lobe from inflating the noise floor.

use serde::Serialize;

use crate::fft::{Fft, hann_magnitude_spectrum, magnitude_to_db};
use crate::window::to_f64;

/// Fewest in-range bins a search needs.
pub const MIN_RANGE_BINS: usize = 8;

/// Fewest bins outside the guard band needed for a noise floor.
pub const MIN_NOISE_BINS: usize = 4;

/// A refined spectral peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralPeak {
    /// Interpolated peak frequency.
    pub frequency_hz: f64,
    /// Interpolated peak height.
    pub power_db: f64,
    /// Median dB level of the range outside the guard band.
    pub noise_floor_db: f64,
    /// `power_db - noise_floor_db`.
    pub snr_db: f64,
}

/// Frequency range and gating parameters for one peak search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakSearch {
    /// Lower edge of the searched range, Hz.
    pub freq_min: f64,
    /// Upper edge of the searched range, Hz.
    pub freq_max: f64,
    /// Minimum accepted SNR, dB.
    pub min_snr_db: f64,
    /// Half-width excluded from the noise floor around the peak, Hz.
    pub guard_hz: f64,
}

impl PeakSearch {
    /// Same gating, different range.
    pub fn with_range(self, freq_min: f64, freq_max: f64) -> Self {
        Self { freq_min, freq_max, ..self }
    }
}

/// Sub-bin offset of a parabola through three equally spaced values.
///
/// `a`, `b`, `c` are the values left of, at, and right of a local maximum.
/// The result is in bins, clamped to `[-0.5, 0.5]`.
pub fn parabolic_offset(a: f64, b: f64, c: f64) -> f64 {
    let denom = a - 2.0 * b + c;
    if denom.abs() < 1e-12 || !denom.is_finite() {
        return 0.0;
    }
    (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
}

/// Median of a slice (mean of the middle pair for even lengths).
///
/// Reorders `values`. Returns `None` when empty.
pub fn median(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        Some(upper)
    } else {
        let lower_max = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(0.5 * (lower_max + upper))
    }
}

/// dB magnitude spectrum of one channel block.
#[derive(Debug, Clone)]
pub struct ChannelSpectrum {
    db: Vec<f64>,
    bin_width: f64,
}

impl ChannelSpectrum {
    /// Hann-window and transform a block.
    pub fn compute(samples: &[f32], sample_rate: f64) -> Self {
        Self::compute_f64(&to_f64(samples), sample_rate)
    }

    /// Same as [`compute`](Self::compute) for `f64` input.
    pub fn compute_f64(samples: &[f64], sample_rate: f64) -> Self {
        let bin_width = if samples.is_empty() {
            sample_rate
        } else {
            sample_rate / samples.len() as f64
        };
        Self::from_magnitudes(hann_magnitude_spectrum(samples), bin_width)
    }

    /// Transform a block with a shared plan sized to the block length.
    pub fn compute_with(fft: &Fft, samples: &[f32], sample_rate: f64) -> Self {
        Self::from_magnitudes(fft.hann_magnitude(&to_f64(samples)), fft.bin_width(sample_rate))
    }

    fn from_magnitudes(magnitudes: Vec<f64>, bin_width: f64) -> Self {
        let db = magnitudes.into_iter().map(magnitude_to_db).collect();
        Self { db, bin_width }
    }

    /// Spacing between bins in Hz.
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// dB value of every bin, DC to Nyquist.
    pub fn db(&self) -> &[f64] {
        &self.db
    }

    /// Inclusive bin bounds whose centers lie in `[freq_min, freq_max]`.
    fn bin_range(&self, freq_min: f64, freq_max: f64) -> Option<(usize, usize)> {
        if self.db.is_empty() || freq_max < freq_min {
            return None;
        }
        let lo = (freq_min.max(0.0) / self.bin_width).ceil() as usize;
        let hi = ((freq_max / self.bin_width).floor() as usize).min(self.db.len() - 1);
        if hi < lo || hi - lo + 1 < MIN_RANGE_BINS {
            return None;
        }
        Some((lo, hi))
    }

    /// Refine the peak at `bin` and gate it against the range's noise floor.
    fn measure(&self, bin: usize, (lo, hi): (usize, usize), search: &PeakSearch) -> Option<SpectralPeak> {
        let b = self.db[bin];
        let (offset, power_db) = if bin > 0 && bin + 1 < self.db.len() {
            let a = self.db[bin - 1];
            let c = self.db[bin + 1];
            let p = parabolic_offset(a, b, c);
            (p, b - 0.25 * (a - c) * p)
        } else {
            (0.0, b)
        };
        let frequency_hz = (bin as f64 + offset) * self.bin_width;

        let mut outside: Vec<f64> = (lo..=hi)
            .filter(|&i| (i as f64 * self.bin_width - frequency_hz).abs() > search.guard_hz)
            .map(|i| self.db[i])
            .collect();
        if outside.len() < MIN_NOISE_BINS {
            return None;
        }
        let noise_floor_db = median(&mut outside)?;
        let snr_db = power_db - noise_floor_db;
        if snr_db < search.min_snr_db {
            return None;
        }

        Some(SpectralPeak {
            frequency_hz,
            power_db,
            noise_floor_db,
            snr_db,
        })
    }

    /// The strongest bin in the search range, refined and SNR-gated.
    pub fn strongest_peak(&self, search: &PeakSearch) -> Option<SpectralPeak> {
        let range = self.bin_range(search.freq_min, search.freq_max)?;
        let (lo, hi) = range;
        let bin = (lo..=hi).max_by(|&i, &j| self.db[i].total_cmp(&self.db[j]).then(j.cmp(&i)))?;
        self.measure(bin, range, search)
    }

    /// Up to `max_peaks` local maxima within `threshold_db` of the range
    /// maximum, strongest first, each refined and SNR-gated.
    pub fn top_peaks(&self, search: &PeakSearch, threshold_db: f64, max_peaks: usize) -> Vec<SpectralPeak> {
        let Some(range) = self.bin_range(search.freq_min, search.freq_max) else {
            return Vec::new();
        };
        let (lo, hi) = range;
        let max_db = self.db[lo..=hi]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let floor = max_db - threshold_db;

        let mut candidates: Vec<usize> = (lo..=hi)
            .filter(|&i| {
                let v = self.db[i];
                let left = if i > 0 { self.db[i - 1] } else { f64::NEG_INFINITY };
                let right = self.db.get(i + 1).copied().unwrap_or(f64::NEG_INFINITY);
                v >= floor && v > left && v >= right
            })
            .collect();
        candidates.sort_by(|&i, &j| self.db[j].total_cmp(&self.db[i]).then(i.cmp(&j)));

        candidates
            .into_iter()
            .take(max_peaks)
            .filter_map(|bin| self.measure(bin, range, search))
            .collect()
    }
}

/// Strongest SNR-gated peak of one channel block.
///
/// Convenience wrapper computing the spectrum and searching it once.
pub fn estimate_peak(samples: &[f32], sample_rate: f64, search: &PeakSearch) -> Option<SpectralPeak> {
    ChannelSpectrum::compute(samples, sample_rate).strongest_peak(search)
}
