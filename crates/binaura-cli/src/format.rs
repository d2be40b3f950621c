//! Report rendering: ASCII table, CSV and JSON.

use binaura_analysis::{AnalysisReport, ReportRecord, TrackSummary};
use clap::ValueEnum;
use std::fmt::Write;

/// Output format for `binaura analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table, one row per record
    Table,
    /// `time_sec,binaural_hz,pulse_left_hz,pulse_right_hz`
    Csv,
    /// Array of flat records
    Json,
}

/// Render a report in the requested format.
pub fn render(report: &AnalysisReport, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Table => render_table(report),
        OutputFormat::Csv => render_csv(report),
        OutputFormat::Json => render_json(report)?,
    })
}

fn pulse_cell(left: Option<f64>, right: Option<f64>) -> String {
    match (left, right) {
        (None, None) => "-".to_string(),
        (l, r) => {
            let show = |p: Option<f64>| p.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
            format!("{}/{}", show(l), show(r))
        }
    }
}

fn record_row(out: &mut String, record: &ReportRecord) {
    let _ = writeln!(
        out,
        "{:>9.1} | {:>5} | {:>11.3} | {:>13} | {:>5.1}/{:<5.1}",
        record.time_sec,
        record.track_id,
        record.binaural_hz,
        pulse_cell(record.pulse_left_hz, record.pulse_right_hz),
        record.confidence_left,
        record.confidence_right,
    );
}

fn summary_row(out: &mut String, track: &TrackSummary) {
    let pulse = pulse_cell(track.mean_pulse_left_hz, track.mean_pulse_right_hz);
    let _ = writeln!(
        out,
        "  track {:>3}: {:>7.1}-{:<7.1}s  center {:>8.2} Hz  beat {:>7.3} ± {:.3} Hz  pulse {}  ({} windows)",
        track.track_id,
        track.first_time_sec,
        track.last_time_sec,
        track.mean_center_hz,
        track.mean_binaural_hz,
        track.binaural_std_hz,
        pulse,
        track.observations,
    );
}

/// `time | track | binaural_hz | pulse_hz | confidence`, with a track summary.
pub fn render_table(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>9} | {:>5} | {:>11} | {:>13} | {}",
        "time", "track", "binaural_hz", "pulse_hz", "confidence"
    );
    let _ = writeln!(out, "{}", "-".repeat(62));

    for window in &report.windows {
        if window.records.is_empty() {
            let _ = writeln!(
                out,
                "{:>9.1} | {:>5} | {:>11} | {:>13} | -",
                window.time_sec, "-", "-", "-"
            );
            continue;
        }
        for record in &window.records {
            record_row(&mut out, record);
        }
    }

    let _ = writeln!(out);
    if report.tracks.is_empty() {
        let _ = writeln!(out, "No carrier pairs detected.");
    } else {
        let _ = writeln!(out, "Tracks:");
        for track in &report.tracks {
            summary_row(&mut out, track);
        }
    }
    out
}

/// One CSV row per record; an absent pulse is an empty cell.
pub fn render_csv(report: &AnalysisReport) -> String {
    let cell = |p: Option<f64>| p.map_or_else(String::new, |v| format!("{v:.4}"));
    let mut out = String::from("time_sec,binaural_hz,pulse_left_hz,pulse_right_hz\n");
    for record in report.records() {
        let _ = writeln!(
            out,
            "{:.3},{:.4},{},{}",
            record.time_sec,
            record.binaural_hz,
            cell(record.pulse_left_hz),
            cell(record.pulse_right_hz),
        );
    }
    out
}

/// Pretty-printed JSON array of every record.
pub fn render_json(report: &AnalysisReport) -> anyhow::Result<String> {
    let records: Vec<&ReportRecord> = report.records().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
