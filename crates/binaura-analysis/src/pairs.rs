//! Cross-channel carrier pairing and clustering.
//!
//! Every left/right peak combination whose frequency difference is a
//! plausible binaural beat becomes a raw pair. Raw pairs are clustered
//! greedily from the strongest down: a representative consumes every
//! other pair whose center lies within the cluster radius. The
//! representative is kept as-is (no averaging), so its frequencies keep
//! the precision of the original peak estimates. Near-duplicate
//! combinations collapse into the cluster of the true carrier pair this
//! way, and so do amplitude-modulation sidebands as long as the pulse rate
//! is within the cluster radius. Faster modulation yields separate
//! sideband pairs; `AnalysisConfig::validate` keeps the searched pulse
//! range inside the radius.

use serde::Serialize;
use std::cmp::Ordering;

use crate::config::AnalysisConfig;
use crate::spectral::{ChannelSpectrum, PeakSearch, SpectralPeak};

/// Smallest margin added around a pair for its search range, Hz.
pub const MIN_SEARCH_MARGIN_HZ: f64 = 15.0;

/// A left/right carrier pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CarrierPair {
    /// Left carrier frequency, Hz.
    pub left_freq_hz: f64,
    /// Right carrier frequency, Hz.
    pub right_freq_hz: f64,
    /// Mean of the two carriers, Hz.
    pub center_hz: f64,
    /// Absolute difference of the two carriers, Hz.
    pub binaural_hz: f64,
    /// Mean of the two peak powers, dB.
    pub avg_power_db: f64,
    /// Frequency range worth re-searching for this pair in later windows.
    pub search_range: (f64, f64),
}

impl CarrierPair {
    /// Pair two peaks; the search range is filled in by the detector.
    fn from_peaks(left: &SpectralPeak, right: &SpectralPeak) -> Self {
        Self {
            left_freq_hz: left.frequency_hz,
            right_freq_hz: right.frequency_hz,
            center_hz: 0.5 * (left.frequency_hz + right.frequency_hz),
            binaural_hz: (right.frequency_hz - left.frequency_hz).abs(),
            avg_power_db: 0.5 * (left.power_db + right.power_db),
            search_range: (left.frequency_hz, right.frequency_hz),
        }
    }

    /// Lower of the two carriers.
    pub fn low_hz(&self) -> f64 {
        self.left_freq_hz.min(self.right_freq_hz)
    }

    /// Higher of the two carriers.
    pub fn high_hz(&self) -> f64 {
        self.left_freq_hz.max(self.right_freq_hz)
    }
}

/// Strongest first; ties broken by frequency so ordering is total.
fn by_descending_power(a: &CarrierPair, b: &CarrierPair) -> Ordering {
    b.avg_power_db
        .total_cmp(&a.avg_power_db)
        .then(a.center_hz.total_cmp(&b.center_hz))
        .then(a.left_freq_hz.total_cmp(&b.left_freq_hz))
}

/// Pairs peaks across channels and reduces them to one pair per cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierPairDetector {
    freq_min: f64,
    freq_max: f64,
    beat_min: f64,
    beat_max: f64,
    cluster_radius_hz: f64,
}

impl CarrierPairDetector {
    /// Build a detector from the run configuration.
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            freq_min: config.freq_min,
            freq_max: config.freq_max,
            beat_min: config.beat_min,
            beat_max: config.beat_max,
            cluster_radius_hz: config.cluster_radius_hz,
        }
    }

    /// True when `diff` is an acceptable binaural beat.
    pub fn beat_in_range(&self, diff: f64) -> bool {
        diff >= self.beat_min && diff <= self.beat_max
    }

    /// Every left/right combination with a beat in range, strongest first.
    pub fn raw_pairs(&self, left: &[SpectralPeak], right: &[SpectralPeak]) -> Vec<CarrierPair> {
        let mut pairs: Vec<CarrierPair> = left
            .iter()
            .flat_map(|l| right.iter().map(move |r| CarrierPair::from_peaks(l, r)))
            .filter(|pair| self.beat_in_range(pair.binaural_hz))
            .collect();
        pairs.sort_by(by_descending_power);
        pairs
    }

    /// Search range around a pair: `margin = max(15, 2 * beat)` beyond
    /// each carrier, clipped to the configured frequency range.
    pub fn search_range(&self, pair: &CarrierPair) -> (f64, f64) {
        let margin = MIN_SEARCH_MARGIN_HZ.max(pair.binaural_hz * 2.0);
        (
            self.freq_min.max(pair.low_hz() - margin),
            self.freq_max.min(pair.high_hz() + margin),
        )
    }

    /// Greedy clustering of pairs sorted strongest first.
    ///
    /// Returns the representatives, with search ranges, in ascending
    /// center frequency.
    pub fn cluster(&self, sorted_pairs: &[CarrierPair]) -> Vec<CarrierPair> {
        let mut consumed = vec![false; sorted_pairs.len()];
        let mut clusters = Vec::new();

        for i in 0..sorted_pairs.len() {
            if consumed[i] {
                continue;
            }
            consumed[i] = true;
            let representative = sorted_pairs[i];
            for j in (i + 1)..sorted_pairs.len() {
                if !consumed[j]
                    && (sorted_pairs[j].center_hz - representative.center_hz).abs()
                        <= self.cluster_radius_hz
                {
                    consumed[j] = true;
                }
            }
            clusters.push(CarrierPair {
                search_range: self.search_range(&representative),
                ..representative
            });
        }

        clusters.sort_by(|a, b| {
            a.center_hz
                .total_cmp(&b.center_hz)
                .then(a.left_freq_hz.total_cmp(&b.left_freq_hz))
        });
        clusters
    }

    /// Pair, sort, and cluster two channels' peak lists.
    pub fn detect(&self, left: &[SpectralPeak], right: &[SpectralPeak]) -> Vec<CarrierPair> {
        self.cluster(&self.raw_pairs(left, right))
    }

    /// Re-measure known clusters inside their search ranges.
    ///
    /// Each cluster's range is searched for the strongest SNR-gated peak
    /// in both channels. A pair is emitted when both channels have one
    /// and their difference is a valid beat.
    pub fn remeasure(
        &self,
        known: &[CarrierPair],
        left: &ChannelSpectrum,
        right: &ChannelSpectrum,
        search: &PeakSearch,
    ) -> Vec<CarrierPair> {
        let mut found: Vec<CarrierPair> = known
            .iter()
            .filter_map(|cluster| {
                let (lo, hi) = cluster.search_range;
                let bounded = search.with_range(lo, hi);
                let l = left.strongest_peak(&bounded)?;
                let r = right.strongest_peak(&bounded)?;
                let pair = CarrierPair::from_peaks(&l, &r);
                self.beat_in_range(pair.binaural_hz).then_some(CarrierPair {
                    search_range: cluster.search_range,
                    ..pair
                })
            })
            .collect();
        found.sort_by(|a, b| a.center_hz.total_cmp(&b.center_hz));
        found
    }
}
