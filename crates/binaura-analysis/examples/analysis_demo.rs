//! Analysis demo: track a drifting binaural pair with an isochronic pulse.
//!
//! Run with: cargo run -p binaura-analysis --example analysis_demo

use binaura_analysis::{AnalysisConfig, Analyzer, StereoBuffer};
use std::f64::consts::PI;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sample_rate = 22050.0;
    let seconds = 60.0;
    let n = (seconds * sample_rate) as usize;

    // Carrier glides 180 -> 192 Hz; 7 Hz beat; 10 Hz gate on both sides
    let channel = |offset_hz: f64| -> Vec<f32> {
        (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate;
                let phase = 2.0 * PI * ((180.0 + offset_hz) * t + 0.1 * t * t);
                let gate = 0.7 + 0.3 * (2.0 * PI * 10.0 * t).cos();
                (0.4 * gate * phase.sin()) as f32
            })
            .collect()
    };

    println!("=== Synthesizing {seconds} s of stereo entrainment audio ===\n");
    let buffer = StereoBuffer::new(channel(0.0), channel(7.0), sample_rate)?;

    let analyzer = Analyzer::new(AnalysisConfig::default())?;
    let report = analyzer.analyze(&buffer)?;

    println!("{:>8} {:>6} {:>10} {:>10} {:>10}", "time", "track", "center", "beat", "pulse");
    for record in report.records() {
        println!(
            "{:>7.1}s {:>6} {:>9.2}Hz {:>9.2}Hz {:>10}",
            record.time_sec,
            record.track_id,
            record.center_hz,
            record.binaural_hz,
            record
                .pulse_left_hz
                .map_or_else(|| "-".to_string(), |p| format!("{p:.2}Hz")),
        );
    }

    println!("\n=== Track Summaries ===\n");
    for track in &report.tracks {
        println!(
            "track {}: {:.1}-{:.1} s, beat {:.2} ± {:.3} Hz over {} windows",
            track.track_id,
            track.first_time_sec,
            track.last_time_sec,
            track.mean_binaural_hz,
            track.binaural_std_hz,
            track.observations,
        );
    }

    Ok(())
}
