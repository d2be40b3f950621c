//! Property-based tests for the detection and tracking building blocks.
//!
//! Uses proptest to check invariants that must hold for any input:
//! window slicing covers the buffer, pairs respect the beat range, and
//! tracking assigns each observation to exactly one track.

use proptest::prelude::*;
use std::f64::consts::PI;

use binaura_analysis::spectral::{PeakSearch, SpectralPeak, estimate_peak, median, parabolic_offset};
use binaura_analysis::{
    AnalysisConfig, CarrierPair, CarrierPairDetector, CarrierTracker, StereoBuffer, TrackStatus,
    TrackerParams, WindowSampler,
};

fn peak(frequency_hz: f64, power_db: f64) -> SpectralPeak {
    SpectralPeak {
        frequency_hz,
        power_db,
        noise_floor_db: -120.0,
        snr_db: power_db + 120.0,
    }
}

fn pair(center_hz: f64, binaural_hz: f64, avg_power_db: f64) -> CarrierPair {
    CarrierPair {
        left_freq_hz: center_hz - binaural_hz / 2.0,
        right_freq_hz: center_hz + binaural_hz / 2.0,
        center_hz,
        binaural_hz,
        avg_power_db,
        search_range: (center_hz - 20.0, center_hz + 20.0),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The refinement never leaves the half-bin around the maximum.
    #[test]
    fn parabolic_offset_bounded(a in -200.0f64..0.0, b in -200.0f64..0.0, c in -200.0f64..0.0) {
        let p = parabolic_offset(a, a.max(b).max(c), c);
        prop_assert!((-0.5..=0.5).contains(&p));
    }

    /// The median lies between the smallest and largest value.
    #[test]
    fn median_within_bounds(mut values in prop::collection::vec(-1e6f64..1e6, 1..64)) {
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let m = median(&mut values).unwrap();
        prop_assert!(m >= lo && m <= hi);
    }

    /// Windows are in time order, stepped evenly, in bounds, and only the
    /// last one may be truncated.
    #[test]
    fn windows_cover_buffer(len in 1usize..2000, window in 1usize..300, step in 1usize..300) {
        let buffer = StereoBuffer::new(vec![0.0; len], vec![0.0; len], 100.0).unwrap();
        let sampler = WindowSampler::from_samples(window, step);
        let windows = sampler.windows(&buffer);

        prop_assert_eq!(windows.len(), sampler.window_count(len));
        prop_assert!(!windows.is_empty());
        for (i, w) in windows.iter().enumerate() {
            prop_assert_eq!(w.index, i);
            prop_assert_eq!(w.start_sample, i * step);
            prop_assert!(w.start_sample + w.len() <= len);
            if i + 1 < windows.len() {
                prop_assert!(w.complete);
            }
            prop_assert_eq!(w.complete, w.len() == window);
        }
    }

    /// Every detected pair carries an in-range beat and clusters are at
    /// least a radius apart.
    #[test]
    fn detected_pairs_respect_ranges(
        left in prop::collection::vec((40.0f64..1400.0, -60.0f64..0.0), 0..8),
        right in prop::collection::vec((40.0f64..1400.0, -60.0f64..0.0), 0..8),
    ) {
        let config = AnalysisConfig::default();
        let detector = CarrierPairDetector::new(&config);
        let left: Vec<_> = left.into_iter().map(|(f, p)| peak(f, p)).collect();
        let right: Vec<_> = right.into_iter().map(|(f, p)| peak(f, p)).collect();

        let pairs = detector.detect(&left, &right);
        for p in &pairs {
            prop_assert!(p.binaural_hz >= config.beat_min && p.binaural_hz <= config.beat_max);
            prop_assert!(p.search_range.0 <= p.low_hz() && p.search_range.1 >= p.high_hz());
            prop_assert!(p.search_range.0 >= config.freq_min && p.search_range.1 <= config.freq_max);
        }
        for w in pairs.windows(2) {
            prop_assert!(w[1].center_hz - w[0].center_hz > config.cluster_radius_hz);
        }
    }

    /// Each observed pair lands in exactly one track, and no track holds
    /// two observations from the same window.
    #[test]
    fn tracking_conserves_observations(
        frames in prop::collection::vec(
            prop::collection::vec((100.0f64..1000.0, 1.0f64..30.0, -40.0f64..0.0), 0..5),
            1..12,
        ),
    ) {
        let mut tracker = CarrierTracker::new(TrackerParams::from(&AnalysisConfig::default()));
        let mut total = 0;
        for (w, frame) in frames.iter().enumerate() {
            let mut pairs: Vec<_> = frame.iter().map(|&(c, b, p)| pair(c, b, p)).collect();
            pairs.sort_by(|a, b| a.center_hz.total_cmp(&b.center_hz));
            total += pairs.len();
            tracker.observe(w, &pairs);
        }
        let tracks = tracker.finish();

        let observed: usize = tracks.iter().map(|t| t.observations.len()).sum();
        prop_assert_eq!(observed, total);
        for (i, track) in tracks.iter().enumerate() {
            prop_assert_eq!(track.id.0 as usize, i);
            prop_assert!(track.status != TrackStatus::Active);
            prop_assert!(track.observations.windows(2).all(|o| o[0].0 < o[1].0));
            if let TrackStatus::Merged(into) = track.status {
                prop_assert!(track.observations.is_empty());
                prop_assert!(into != track.id);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any tone well inside the search range is located to within a
    /// fraction of a bin.
    #[test]
    fn tone_frequency_recovered(freq in 60.0f64..1400.0, amplitude in 0.05f64..0.9) {
        let sample_rate = 8000.0;
        let samples: Vec<f32> = (0..16000)
            .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / sample_rate).sin()) as f32)
            .collect();
        let search = PeakSearch { freq_min: 20.0, freq_max: 1500.0, min_snr_db: 15.0, guard_hz: 5.0 };

        let found = estimate_peak(&samples, sample_rate, &search).unwrap();
        prop_assert!((found.frequency_hz - freq).abs() < 0.05, "{} vs {}", found.frequency_hz, freq);
    }
}
