//! End-to-end analysis pipeline.
//!
//! ```text
//! StereoBuffer -> windows -> peaks -> pairs -> tracks -> pulses -> report
//!                  (parallel per window)    (fold)   (parallel per job)
//! ```
//!
//! Detection is independent per window and runs on the rayon pool;
//! results are collected back in window order before the tracker folds
//! them. Demodulation jobs are independent per (track, window, channel)
//! and are likewise collected in a fixed order, so a run is deterministic
//! regardless of thread count.

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::AnalysisConfig;
use crate::error::{ConfigError, Result};
use crate::fft::Fft;
use crate::isochronic::{Channel, IsochronicDemodulator, IsochronicMeasurement};
use crate::pairs::{CarrierPair, CarrierPairDetector};
use crate::report::{AnalysisReport, ReportAssembler, WindowOutline, WindowStatus};
use crate::spectral::{ChannelSpectrum, PeakSearch};
use crate::tracker::{CarrierTrack, CarrierTracker, TrackId, TrackerParams};
use crate::window::{AnalysisWindow, StereoBuffer, WindowSampler};

/// Shortest usable window, in samples.
pub const MIN_WINDOW_SAMPLES: usize = 64;

/// How carriers are found in each window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionMode {
    /// Full-range peak scan in every window.
    Sliding,
    /// Discover clusters once from the leading `sample_sec` seconds, then
    /// re-measure them inside their search ranges.
    Discovery {
        /// Length of the discovery excerpt, seconds.
        sample_sec: f64,
    },
}

/// Outcome of detection for one window.
#[derive(Debug, Clone, PartialEq)]
struct Detection {
    status: WindowStatus,
    pairs: Vec<CarrierPair>,
}

/// One pulse measurement to perform.
#[derive(Debug, Clone, Copy)]
struct DemodJob {
    track_id: TrackId,
    window_index: usize,
    channel: Channel,
    carrier_hz: f64,
}

/// Runs the full carrier tracking pipeline over a stereo buffer.
///
/// # Example
///
/// ```rust,ignore
/// use binaura_analysis::{AnalysisConfig, Analyzer, StereoBuffer};
///
/// let buffer = StereoBuffer::new(left, right, 44100.0)?;
/// let report = Analyzer::new(AnalysisConfig::default())?.analyze(&buffer)?;
/// for record in report.records() {
///     println!("{:.1}s  {:.2} Hz", record.time_sec, record.binaural_hz);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    /// Create an analyzer, validating the configuration.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Detection mode selected by the configuration.
    pub fn detection_mode(&self) -> DetectionMode {
        match self.config.discovery_sec {
            Some(sample_sec) => DetectionMode::Discovery { sample_sec },
            None => DetectionMode::Sliding,
        }
    }

    fn peak_search(&self) -> PeakSearch {
        PeakSearch {
            freq_min: self.config.freq_min,
            freq_max: self.config.freq_max,
            min_snr_db: self.config.min_snr_db,
            guard_hz: self.config.guard_hz,
        }
    }

    /// Analyze a buffer.
    pub fn analyze(&self, buffer: &StereoBuffer) -> Result<AnalysisReport> {
        self.analyze_with_progress(buffer, |_| {})
    }

    /// Analyze a buffer, calling `progress` with each window's index once
    /// that window has been through detection. Calls may arrive out of
    /// order from worker threads.
    pub fn analyze_with_progress<F>(&self, buffer: &StereoBuffer, progress: F) -> Result<AnalysisReport>
    where
        F: Fn(usize) + Sync,
    {
        let sample_rate = buffer.sample_rate();
        let sampler = WindowSampler::new(sample_rate, self.config.window_sec, self.config.step_sec);
        if sampler.window_len() < MIN_WINDOW_SAMPLES {
            return Err(ConfigError::invalid(
                "window_sec",
                format!(
                    "{} s is only {} samples at {sample_rate} Hz; need at least {MIN_WINDOW_SAMPLES}",
                    self.config.window_sec,
                    sampler.window_len()
                ),
            )
            .into());
        }
        if self.config.freq_max > sample_rate / 2.0 {
            tracing::warn!(
                freq_max = self.config.freq_max,
                nyquist = sample_rate / 2.0,
                "freq_max above Nyquist; search is clipped"
            );
        }

        let windows = sampler.windows(buffer);
        tracing::info!(
            windows = windows.len(),
            window_len = sampler.window_len(),
            step_len = sampler.step_len(),
            sample_rate,
            mode = ?self.detection_mode(),
            "starting analysis"
        );

        let known = match self.detection_mode() {
            DetectionMode::Sliding => None,
            DetectionMode::Discovery { sample_sec } => Some(self.discover(buffer, sample_sec)),
        };

        // Every complete window has the same length, so one plan serves all
        let plan = Fft::new(sampler.window_len());
        let done = AtomicUsize::new(0);
        let detections: Vec<Detection> = windows
            .par_iter()
            .map(|window| {
                let detection = self.detect_window(window, &plan, sample_rate, known.as_deref());
                done.fetch_add(1, Ordering::Relaxed);
                progress(window.index);
                detection
            })
            .collect();
        tracing::debug!(windows = done.load(Ordering::Relaxed), "detection finished");

        let tracks = self.track(&detections);
        let measurements = self.demodulate(&windows, &tracks, plan, sample_rate);

        let outlines: Vec<WindowOutline> = windows
            .iter()
            .zip(&detections)
            .map(|(window, detection)| WindowOutline {
                index: window.index,
                time_sec: window.time_sec,
                status: detection.status,
            })
            .collect();

        let report = ReportAssembler::new(sample_rate, buffer.duration_sec()).assemble(
            &outlines,
            &tracks,
            &measurements,
        );
        tracing::info!(
            tracks = report.tracks.len(),
            records = report.records().count(),
            skipped = report.count_status(WindowStatus::Skipped),
            "analysis complete"
        );
        Ok(report)
    }

    /// Clusters found in the leading `sample_sec` seconds of the buffer.
    fn discover(&self, buffer: &StereoBuffer, sample_sec: f64) -> Vec<CarrierPair> {
        let end = ((sample_sec * buffer.sample_rate()).round() as usize).clamp(1, buffer.len());
        let sample_rate = buffer.sample_rate();
        let left = ChannelSpectrum::compute(&buffer.left()[..end], sample_rate);
        let right = ChannelSpectrum::compute(&buffer.right()[..end], sample_rate);
        let clusters = self.pairs_from_spectra(&left, &right, None);
        tracing::info!(clusters = clusters.len(), sample_sec, "discovery finished");
        clusters
    }

    /// Peak extraction and pairing for two channel spectra.
    ///
    /// With `known` clusters, each is re-measured in its search range;
    /// otherwise the full range is scanned.
    fn pairs_from_spectra(
        &self,
        left: &ChannelSpectrum,
        right: &ChannelSpectrum,
        known: Option<&[CarrierPair]>,
    ) -> Vec<CarrierPair> {
        let detector = CarrierPairDetector::new(&self.config);
        let search = self.peak_search();
        match known {
            Some(clusters) => detector.remeasure(clusters, left, right, &search),
            None => {
                let threshold = self.config.peak_threshold_db;
                let max_peaks = self.config.max_peaks;
                let left_peaks = left.top_peaks(&search, threshold, max_peaks);
                let right_peaks = right.top_peaks(&search, threshold, max_peaks);
                detector.detect(&left_peaks, &right_peaks)
            }
        }
    }

    /// Detect carrier pairs in one window.
    fn detect_window(
        &self,
        window: &AnalysisWindow<'_>,
        plan: &Fft,
        sample_rate: f64,
        known: Option<&[CarrierPair]>,
    ) -> Detection {
        if !window.complete {
            tracing::debug!(window = window.index, len = window.len(), "truncated window skipped");
            return Detection {
                status: WindowStatus::Skipped,
                pairs: Vec::new(),
            };
        }

        let left = ChannelSpectrum::compute_with(plan, window.left, sample_rate);
        let right = ChannelSpectrum::compute_with(plan, window.right, sample_rate);
        let pairs = self.pairs_from_spectra(&left, &right, known);
        tracing::debug!(window = window.index, pairs = pairs.len(), "window detected");

        Detection {
            status: if pairs.is_empty() {
                WindowStatus::NoCarrierDetected
            } else {
                WindowStatus::Analyzed
            },
            pairs,
        }
    }

    /// Fold detections into tracks. Skipped windows are not observed.
    fn track(&self, detections: &[Detection]) -> Vec<CarrierTrack> {
        let mut tracker = CarrierTracker::new(TrackerParams::from(&self.config));
        for (index, detection) in detections.iter().enumerate() {
            if detection.status != WindowStatus::Skipped {
                tracker.observe(index, &detection.pairs);
            }
        }
        tracker.finish()
    }

    /// Measure the pulse on both carriers of every observation.
    fn demodulate(
        &self,
        windows: &[AnalysisWindow<'_>],
        tracks: &[CarrierTrack],
        plan: Fft,
        sample_rate: f64,
    ) -> Vec<IsochronicMeasurement> {
        let jobs: Vec<DemodJob> = tracks
            .iter()
            .flat_map(|track| {
                track.observations.iter().flat_map(move |&(window_index, pair)| {
                    [
                        (Channel::Left, pair.left_freq_hz),
                        (Channel::Right, pair.right_freq_hz),
                    ]
                    .map(|(channel, carrier_hz)| DemodJob {
                        track_id: track.id,
                        window_index,
                        channel,
                        carrier_hz,
                    })
                })
            })
            .collect();

        let demodulator = IsochronicDemodulator::new(sample_rate, &self.config).with_plan(plan);
        let measurements: Vec<IsochronicMeasurement> = jobs
            .par_iter()
            .filter_map(|job| {
                let window = windows.get(job.window_index)?;
                let samples = match job.channel {
                    Channel::Left => window.left,
                    Channel::Right => window.right,
                };
                Some(demodulator.measure(
                    samples,
                    job.carrier_hz,
                    job.track_id,
                    job.channel,
                    job.window_index,
                ))
            })
            .collect();
        tracing::debug!(
            jobs = jobs.len(),
            pulses = measurements.iter().filter(|m| m.pulse_hz.is_some()).count(),
            "demodulation finished"
        );
        measurements
    }
}
