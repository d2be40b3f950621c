//! Report assembly.
//!
//! Joins the finished tracks and the pulse measurements into one flat
//! record per (window, track), grouped by window, plus summary statistics
//! per track.

use serde::Serialize;
use std::collections::HashMap;

use crate::isochronic::{Channel, IsochronicMeasurement};
use crate::tracker::{CarrierTrack, TrackId};

/// What happened to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    /// At least one carrier pair was detected.
    Analyzed,
    /// No pair passed detection; tracks count a miss.
    NoCarrierDetected,
    /// Truncated trailing window; left out of detection and tracking.
    Skipped,
}

/// One track's state in one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportRecord {
    /// Window start, seconds.
    pub time_sec: f64,
    /// Track the pair belongs to.
    pub track_id: TrackId,
    /// Carrier center, Hz.
    pub center_hz: f64,
    /// Binaural beat, Hz.
    pub binaural_hz: f64,
    /// Left carrier, Hz.
    pub left_freq_hz: f64,
    /// Right carrier, Hz.
    pub right_freq_hz: f64,
    /// Left-channel pulse rate, if detected.
    pub pulse_left_hz: Option<f64>,
    /// Right-channel pulse rate, if detected.
    pub pulse_right_hz: Option<f64>,
    /// Left-channel demodulation confidence.
    pub confidence_left: f64,
    /// Right-channel demodulation confidence.
    pub confidence_right: f64,
}

/// Per-window section of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    /// Window position.
    pub index: usize,
    /// Window start, seconds.
    pub time_sec: f64,
    /// Outcome.
    pub status: WindowStatus,
    /// Records ordered by track id.
    pub records: Vec<ReportRecord>,
}

/// Summary statistics over one track's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackSummary {
    /// Track id.
    pub track_id: TrackId,
    /// Start of the first observed window, seconds.
    pub first_time_sec: f64,
    /// Start of the last observed window, seconds.
    pub last_time_sec: f64,
    /// Number of observations.
    pub observations: usize,
    /// Mean carrier center, Hz.
    pub mean_center_hz: f64,
    /// Mean binaural beat, Hz.
    pub mean_binaural_hz: f64,
    /// Population standard deviation of the beat, Hz.
    pub binaural_std_hz: f64,
    /// Mean of the detected left pulses.
    pub mean_pulse_left_hz: Option<f64>,
    /// Mean of the detected right pulses.
    pub mean_pulse_right_hz: Option<f64>,
}

/// Complete result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Input sample rate, Hz.
    pub sample_rate: f64,
    /// Input duration, seconds.
    pub duration_sec: f64,
    /// Number of windows, skipped ones included.
    pub window_count: usize,
    /// Windows in time order.
    pub windows: Vec<WindowSummary>,
    /// One summary per surviving (non-merged) track, by id.
    pub tracks: Vec<TrackSummary>,
}

impl AnalysisReport {
    /// Every record, in window then track order.
    pub fn records(&self) -> impl Iterator<Item = &ReportRecord> {
        self.windows.iter().flat_map(|w| w.records.iter())
    }

    /// Number of windows with the given status.
    pub fn count_status(&self, status: WindowStatus) -> usize {
        self.windows.iter().filter(|w| w.status == status).count()
    }

    /// Summary of one track.
    pub fn track(&self, id: TrackId) -> Option<&TrackSummary> {
        self.tracks.iter().find(|t| t.track_id == id)
    }
}

/// Window identity and outcome, as known before assembly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowOutline {
    /// Window position.
    pub index: usize,
    /// Window start, seconds.
    pub time_sec: f64,
    /// Outcome of detection.
    pub status: WindowStatus,
}

/// Builds an [`AnalysisReport`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportAssembler {
    sample_rate: f64,
    duration_sec: f64,
}

type MeasurementKey = (TrackId, usize, Channel);

impl ReportAssembler {
    /// Create an assembler for a run over the given input.
    pub fn new(sample_rate: f64, duration_sec: f64) -> Self {
        Self {
            sample_rate,
            duration_sec,
        }
    }

    /// Join tracks and measurements into the final report.
    ///
    /// `windows` must be indexed by position. Merged tracks carry no
    /// observations and contribute nothing.
    pub fn assemble(
        &self,
        windows: &[WindowOutline],
        tracks: &[CarrierTrack],
        measurements: &[IsochronicMeasurement],
    ) -> AnalysisReport {
        let by_key: HashMap<MeasurementKey, &IsochronicMeasurement> = measurements
            .iter()
            .map(|m| ((m.track_id, m.window_index, m.channel), m))
            .collect();
        let lookup = |id: TrackId, w: usize, channel: Channel| {
            by_key
                .get(&(id, w, channel))
                .map_or((None, 0.0), |m| (m.pulse_hz, m.confidence))
        };

        let mut summaries: Vec<WindowSummary> = windows
            .iter()
            .map(|w| WindowSummary {
                index: w.index,
                time_sec: w.time_sec,
                status: w.status,
                records: Vec::new(),
            })
            .collect();

        let mut track_summaries = Vec::new();
        for track in tracks {
            if track.observations.is_empty() {
                continue;
            }
            let mut records = Vec::with_capacity(track.observations.len());
            for &(w, pair) in &track.observations {
                let Some(summary) = summaries.get_mut(w) else {
                    tracing::warn!(track = %track.id, window = w, "observation outside window range");
                    continue;
                };
                let (pulse_left_hz, confidence_left) = lookup(track.id, w, Channel::Left);
                let (pulse_right_hz, confidence_right) = lookup(track.id, w, Channel::Right);
                let record = ReportRecord {
                    time_sec: summary.time_sec,
                    track_id: track.id,
                    center_hz: pair.center_hz,
                    binaural_hz: pair.binaural_hz,
                    left_freq_hz: pair.left_freq_hz,
                    right_freq_hz: pair.right_freq_hz,
                    pulse_left_hz,
                    pulse_right_hz,
                    confidence_left,
                    confidence_right,
                };
                summary.records.push(record);
                records.push(record);
            }
            if let Some(summary) = summarize(track.id, &records) {
                track_summaries.push(summary);
            }
        }

        for summary in &mut summaries {
            summary.records.sort_by_key(|r| r.track_id);
        }

        AnalysisReport {
            sample_rate: self.sample_rate,
            duration_sec: self.duration_sec,
            window_count: windows.len(),
            windows: summaries,
            tracks: track_summaries,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

fn summarize(track_id: TrackId, records: &[ReportRecord]) -> Option<TrackSummary> {
    let first = records.first()?;
    let last = records.last()?;
    let mean_binaural_hz = mean(records.iter().map(|r| r.binaural_hz))?;
    let variance = mean(records.iter().map(|r| (r.binaural_hz - mean_binaural_hz).powi(2)))?;

    Some(TrackSummary {
        track_id,
        first_time_sec: first.time_sec,
        last_time_sec: last.time_sec,
        observations: records.len(),
        mean_center_hz: mean(records.iter().map(|r| r.center_hz))?,
        mean_binaural_hz,
        binaural_std_hz: variance.sqrt(),
        mean_pulse_left_hz: mean(records.iter().filter_map(|r| r.pulse_left_hz)),
        mean_pulse_right_hz: mean(records.iter().filter_map(|r| r.pulse_right_hz)),
    })
}
