//! Carrier tracking command.

use anyhow::Context;
use binaura_analysis::{AnalysisConfig, Analyzer, StereoBuffer, WindowSampler};
use binaura_io::read_wav_channels;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::format::{OutputFormat, render};

/// Analyze a stereo WAV file.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input stereo WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Analysis configuration (TOML); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Window length in seconds
    #[arg(long)]
    window_sec: Option<f64>,

    /// Hop between windows in seconds
    #[arg(long)]
    step_sec: Option<f64>,

    /// Lowest carrier frequency searched (Hz)
    #[arg(long)]
    freq_min: Option<f64>,

    /// Highest carrier frequency searched (Hz)
    #[arg(long)]
    freq_max: Option<f64>,

    /// Smallest accepted binaural beat (Hz)
    #[arg(long)]
    beat_min: Option<f64>,

    /// Largest accepted binaural beat (Hz)
    #[arg(long)]
    beat_max: Option<f64>,

    /// Bandpass half-width around each carrier for demodulation (Hz)
    #[arg(long)]
    bandwidth: Option<f64>,

    /// Minimum peak SNR (dB)
    #[arg(long)]
    min_snr: Option<f64>,

    /// Minimum pulse confidence (peak/median)
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Maximum track assignment cost
    #[arg(long)]
    max_cost: Option<f64>,

    /// Windows a track may miss before it terminates
    #[arg(long)]
    missed_limit: Option<u32>,

    /// Discover carriers from the first N seconds, then only re-measure them
    #[arg(long, value_name = "SECONDS")]
    discovery_sec: Option<f64>,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

fn apply_overrides(config: &mut AnalysisConfig, args: &AnalyzeArgs) {
    let set = |slot: &mut f64, value: Option<f64>| {
        if let Some(v) = value {
            *slot = v;
        }
    };
    set(&mut config.window_sec, args.window_sec);
    set(&mut config.step_sec, args.step_sec);
    set(&mut config.freq_min, args.freq_min);
    set(&mut config.freq_max, args.freq_max);
    set(&mut config.beat_min, args.beat_min);
    set(&mut config.beat_max, args.beat_max);
    set(&mut config.bandwidth_hz, args.bandwidth);
    set(&mut config.min_snr_db, args.min_snr);
    set(&mut config.min_confidence, args.min_confidence);
    set(&mut config.max_assignment_cost, args.max_cost);
    if let Some(limit) = args.missed_limit {
        config.missed_window_limit = limit;
    }
    if args.discovery_sec.is_some() {
        config.discovery_sec = args.discovery_sec;
    }
}

/// Run the analyze command.
pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    apply_overrides(&mut config, &args);
    let analyzer = Analyzer::new(config)?;

    let (channels, spec) = read_wav_channels(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let buffer = StereoBuffer::from_channels(channels, f64::from(spec.sample_rate))?;
    tracing::info!(
        input = %args.input.display(),
        sample_rate = spec.sample_rate,
        duration_sec = buffer.duration_sec(),
        "loaded input"
    );

    let config = analyzer.config();
    let window_count = WindowSampler::new(buffer.sample_rate(), config.window_sec, config.step_sec)
        .window_count(buffer.len());

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(window_count as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} windows ({eta})")?
            .progress_chars("##-"),
    );

    let report = analyzer.analyze_with_progress(&buffer, |_| pb.inc(1))?;
    pb.finish_and_clear();

    let rendered = render(&report, args.format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} records from {} tracks to {}",
                report.records().count(),
                report.tracks.len(),
                path.display()
            );
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
