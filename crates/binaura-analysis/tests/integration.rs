//! Integration tests for binaura-analysis crate.
//!
//! Runs the full pipeline on synthetic stereo signals with known carriers,
//! beats and pulse rates.

use std::f64::consts::PI;

use binaura_analysis::{
    AnalysisConfig, AnalysisError, Analyzer, StereoBuffer, TrackId, WindowStatus,
};

const SAMPLE_RATE: f64 = 8000.0;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sine tone with optional isochronic gating (`rate`, `depth`).
fn carrier(freq_hz: f64, seconds: f64, amplitude: f64, pulse: Option<(f64, f64)>) -> Vec<f64> {
    let n = (seconds * SAMPLE_RATE) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            let gain = pulse.map_or(1.0, |(rate, depth)| {
                1.0 - depth * 0.5 * (1.0 - (2.0 * PI * rate * t).cos())
            });
            amplitude * gain * (2.0 * PI * freq_hz * t).sin()
        })
        .collect()
}

/// Linear chirp from `f0` with slope `k` Hz/s.
fn chirp(f0: f64, k: f64, seconds: f64, amplitude: f64) -> Vec<f64> {
    let n = (seconds * SAMPLE_RATE) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            amplitude * (2.0 * PI * (f0 * t + 0.5 * k * t * t)).sin()
        })
        .collect()
}

fn white_noise(n: usize, seed: u32) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            f64::from(state as i32) / f64::from(i32::MAX) * 0.3
        })
        .collect()
}

fn mix(signals: &[Vec<f64>]) -> Vec<f32> {
    let n = signals.iter().map(Vec::len).min().unwrap_or(0);
    (0..n)
        .map(|i| signals.iter().map(|s| s[i]).sum::<f64>() as f32)
        .collect()
}

fn stereo(left: Vec<f32>, right: Vec<f32>) -> StereoBuffer {
    StereoBuffer::new(left, right, SAMPLE_RATE).unwrap()
}

fn analyze(buffer: &StereoBuffer) -> binaura_analysis::AnalysisReport {
    Analyzer::new(AnalysisConfig::default())
        .unwrap()
        .analyze(buffer)
        .unwrap()
}

// ===========================================================================
// 1. Accuracy
// ===========================================================================

#[test]
fn binaural_beat_within_tolerance() {
    // Off-bin carriers at 0.1 Hz resolution
    let left = mix(&[carrier(200.33, 30.0, 0.4, None)]);
    let right = mix(&[carrier(210.61, 30.0, 0.4, None)]);
    let report = analyze(&stereo(left, right));

    assert_eq!(report.window_count, 5);
    assert_eq!(report.tracks.len(), 1);
    for record in report.records() {
        assert!(
            (record.binaural_hz - 10.28).abs() < 0.05,
            "beat {} at {}s",
            record.binaural_hz,
            record.time_sec
        );
        assert!((record.left_freq_hz - 200.33).abs() < 0.05);
        assert!((record.right_freq_hz - 210.61).abs() < 0.05);
    }
}

#[test]
fn isochronic_pulse_within_tolerance() {
    let left = mix(&[carrier(250.0, 30.0, 0.4, Some((7.3, 0.6)))]);
    let right = mix(&[carrier(256.0, 30.0, 0.4, Some((7.3, 0.6)))]);
    let report = analyze(&stereo(left, right));
    let min_confidence = AnalysisConfig::default().min_confidence;

    assert_eq!(report.tracks.len(), 1);
    assert!(report.records().count() > 0);
    for record in report.records() {
        assert!((record.binaural_hz - 6.0).abs() < 0.05);
        let left = record.pulse_left_hz.expect("left pulse");
        let right = record.pulse_right_hz.expect("right pulse");
        assert!((left - 7.3).abs() < 0.05, "left pulse {left}");
        assert!((right - 7.3).abs() < 0.05, "right pulse {right}");
        assert!(record.confidence_left >= min_confidence);
        assert!(record.confidence_right >= min_confidence);
    }

    let summary = report.track(TrackId(0)).unwrap();
    assert!((summary.mean_pulse_left_hz.unwrap() - 7.3).abs() < 0.05);
}

#[test]
fn asymmetric_pulses_measured_independently() {
    let left = mix(&[carrier(300.0, 20.0, 0.4, Some((5.0, 0.6)))]);
    let right = mix(&[carrier(310.0, 20.0, 0.4, Some((11.0, 0.6)))]);
    let report = analyze(&stereo(left, right));

    for record in report.records() {
        assert!((record.pulse_left_hz.unwrap() - 5.0).abs() < 0.05);
        assert!((record.pulse_right_hz.unwrap() - 11.0).abs() < 0.05);
    }
}

#[test]
fn fastest_default_pulse_keeps_one_track() {
    // Sidebands sit 24 Hz from each carrier, inside the 25 Hz cluster radius
    let left = mix(&[carrier(300.0, 20.0, 0.4, Some((24.0, 0.2)))]);
    let right = mix(&[carrier(310.0, 20.0, 0.4, Some((24.0, 0.2)))]);
    let report = analyze(&stereo(left, right));

    assert_eq!(report.tracks.len(), 1);
    assert_eq!(report.records().count(), report.window_count);
    for record in report.records() {
        assert!((record.center_hz - 305.0).abs() < 0.05);
        assert!((record.pulse_left_hz.unwrap() - 24.0).abs() < 0.05);
        assert!((record.pulse_right_hz.unwrap() - 24.0).abs() < 0.05);
    }
}

#[test]
fn gamma_pulse_with_widened_cluster_radius() {
    let config = AnalysisConfig {
        cluster_radius_hz: 40.0,
        pulse_max_hz: 40.0,
        ..Default::default()
    };
    let left = mix(&[carrier(300.0, 20.0, 0.4, Some((39.0, 0.2)))]);
    let right = mix(&[carrier(310.0, 20.0, 0.4, Some((39.0, 0.2)))]);
    let report = Analyzer::new(config)
        .unwrap()
        .analyze(&stereo(left, right))
        .unwrap();

    assert_eq!(report.tracks.len(), 1);
    assert_eq!(report.records().count(), report.window_count);
    for record in report.records() {
        assert!((record.binaural_hz - 10.0).abs() < 0.05);
        assert!((record.pulse_left_hz.unwrap() - 39.0).abs() < 0.05);
    }
}

#[test]
fn pulse_present_only_with_confidence() {
    let left = mix(&[carrier(200.0, 20.0, 0.4, Some((9.0, 0.5))), white_noise(160_000, 7)]);
    let right = mix(&[carrier(208.0, 20.0, 0.4, None), white_noise(160_000, 11)]);
    let report = analyze(&stereo(left, right));
    let min_confidence = AnalysisConfig::default().min_confidence;

    for record in report.records() {
        match record.pulse_left_hz {
            Some(_) => assert!(record.confidence_left >= min_confidence),
            None => assert_eq!(record.confidence_left, 0.0),
        }
        match record.pulse_right_hz {
            Some(_) => assert!(record.confidence_right >= min_confidence),
            None => assert_eq!(record.confidence_right, 0.0),
        }
    }
}

// ===========================================================================
// 2. Detection edge cases
// ===========================================================================

#[test]
fn white_noise_has_no_tracks() {
    let left = mix(&[white_noise(240_000, 0xDEAD_BEEF)]);
    let right = mix(&[white_noise(240_000, 0x1234_5678)]);
    let report = analyze(&stereo(left, right));

    assert!(report.tracks.is_empty());
    assert_eq!(report.records().count(), 0);
    assert_eq!(report.count_status(WindowStatus::NoCarrierDetected), report.window_count);
}

#[test]
fn mono_input_rejected() {
    let mono = vec![mix(&[carrier(200.0, 1.0, 0.4, None)])];
    let err = StereoBuffer::from_channels(mono, SAMPLE_RATE).unwrap_err();
    assert!(matches!(err, AnalysisError::UnsupportedChannelLayout { channels: 1 }));
}

#[test]
fn truncated_final_window_skipped() {
    // 27 s: full windows start at 0..=15 s, the window at 20 s is short
    let left = mix(&[carrier(200.0, 27.0, 0.4, None)]);
    let right = mix(&[carrier(210.0, 27.0, 0.4, None)]);
    let report = analyze(&stereo(left, right));

    assert_eq!(report.window_count, 5);
    let last = report.windows.last().unwrap();
    assert_eq!(last.status, WindowStatus::Skipped);
    assert!(last.records.is_empty());
    assert_eq!(report.count_status(WindowStatus::Analyzed), 4);
}

#[test]
fn recording_shorter_than_window_is_all_skipped() {
    let left = mix(&[carrier(200.0, 4.0, 0.4, None)]);
    let right = mix(&[carrier(210.0, 4.0, 0.4, None)]);
    let report = analyze(&stereo(left, right));

    assert_eq!(report.window_count, 1);
    assert_eq!(report.windows[0].status, WindowStatus::Skipped);
    assert!(report.tracks.is_empty());
}

// ===========================================================================
// 3. Tracking
// ===========================================================================

#[test]
fn linear_drift_keeps_one_track() {
    // 200 -> 212 Hz over 60 s, constant 8 Hz beat
    let left = mix(&[chirp(200.0, 0.2, 60.0, 0.4)]);
    let right = mix(&[chirp(208.0, 0.2, 60.0, 0.4)]);
    let report = analyze(&stereo(left, right));

    assert_eq!(report.tracks.len(), 1);
    assert!(report.records().all(|r| r.track_id == TrackId(0)));
    assert_eq!(report.records().count(), report.window_count);

    let summary = &report.tracks[0];
    let first = report.windows[0].records[0].center_hz;
    let last = report.windows.last().unwrap().records[0].center_hz;
    assert!(last - first > 5.0, "drifted from {first} to {last}");
    assert!((summary.mean_binaural_hz - 8.0).abs() < 0.5);
}

#[test]
fn separated_pairs_never_swap() {
    let left = mix(&[carrier(200.0, 40.0, 0.4, None), carrier(400.0, 40.0, 0.3, None)]);
    let right = mix(&[carrier(210.0, 40.0, 0.4, None), carrier(406.0, 40.0, 0.3, None)]);
    let report = analyze(&stereo(left, right));

    assert_eq!(report.tracks.len(), 2);
    for summary in &report.tracks {
        assert_eq!(summary.observations, report.window_count);
        assert!(summary.binaural_std_hz < 0.05);
    }
    for window in &report.windows {
        assert_eq!(window.records.len(), 2);
        for record in &window.records {
            let expected = if record.center_hz < 300.0 { 10.0 } else { 6.0 };
            assert!((record.binaural_hz - expected).abs() < 0.05);
        }
        // Births follow ascending center, so id 0 is the low pair throughout
        assert!(window.records[0].track_id == TrackId(0) && window.records[0].center_hz < 300.0);
        assert!(window.records[1].track_id == TrackId(1) && window.records[1].center_hz > 300.0);
    }
}

#[test]
fn dropout_fragments_rejoined() {
    // Tone for 0-20 s, silence until 40 s, tone again to 70 s
    let mut left = carrier(200.0, 70.0, 0.4, None);
    let mut right = carrier(210.0, 70.0, 0.4, None);
    let (gap_start, gap_end) = ((20.0 * SAMPLE_RATE) as usize, (40.0 * SAMPLE_RATE) as usize);
    for channel in [&mut left, &mut right] {
        channel[gap_start..gap_end].fill(0.0);
    }
    let report = analyze(&stereo(mix(&[left]), mix(&[right])));

    // Windows at 20, 25 and 30 s hear nothing
    assert_eq!(report.count_status(WindowStatus::NoCarrierDetected), 3);
    assert_eq!(report.tracks.len(), 1);
    let summary = &report.tracks[0];
    assert_eq!(summary.observations, report.count_status(WindowStatus::Analyzed));
    assert_eq!(summary.first_time_sec, 0.0);
    assert_eq!(summary.last_time_sec, 60.0);
}

// ===========================================================================
// 4. Determinism
// ===========================================================================

#[test]
fn identical_runs_identical_reports() {
    let left = mix(&[
        carrier(220.0, 30.0, 0.3, Some((4.0, 0.5))),
        carrier(500.0, 30.0, 0.2, None),
        white_noise(240_000, 3),
    ]);
    let right = mix(&[
        carrier(230.0, 30.0, 0.3, Some((4.0, 0.5))),
        carrier(507.0, 30.0, 0.2, None),
        white_noise(240_000, 5),
    ]);
    let buffer = stereo(left, right);
    let analyzer = Analyzer::new(AnalysisConfig::default()).unwrap();

    let parallel = analyzer.analyze(&buffer).unwrap();
    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| analyzer.analyze(&buffer).unwrap());

    assert_eq!(parallel, single);
    assert_eq!(
        serde_json::to_string(&parallel).unwrap(),
        serde_json::to_string(&analyzer.analyze(&buffer).unwrap()).unwrap()
    );
}
