//! Integration tests for binaura-io WAV decoding.

use binaura_io::{Error, WavFormat, WavSpec, read_wav_channels, read_wav_info, write_wav_channels};
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sine_wave(sample_rate: u32, freq_hz: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate as f32).sin() * 0.5)
        .collect()
}

/// Write a file directly with hound, bypassing our encoder.
fn write_raw_i16(path: &std::path::Path, channels: u16, interleaved: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in interleaved {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

// ---------------------------------------------------------------------------
// Channel preservation
// ---------------------------------------------------------------------------

#[test]
fn stereo_channels_kept_apart() {
    let sr = 44100;
    let left = sine_wave(sr, 200.0, sr as usize);
    let right = sine_wave(sr, 210.0, sr as usize);

    let file = NamedTempFile::new().unwrap();
    write_wav_channels(file.path(), &[left.clone(), right.clone()], WavSpec::default()).unwrap();

    let (channels, spec) = read_wav_channels(file.path()).unwrap();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, sr);
    assert_eq!(channels[0], left);
    assert_eq!(channels[1], right);
}

#[test]
fn interleaved_pcm_deinterleaved_in_order() {
    let file = NamedTempFile::new().unwrap();
    // Left ramps up, right holds a constant
    let interleaved: Vec<i16> = (0..100).flat_map(|i| [i as i16 * 100, -16384]).collect();
    write_raw_i16(file.path(), 2, &interleaved);

    let (channels, spec) = read_wav_channels(file.path()).unwrap();
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].len(), 100);
    assert!((channels[0][10] - 1000.0 / 32768.0).abs() < 1e-6);
    assert!(channels[1].iter().all(|&s| (s + 0.5).abs() < 1e-6));
}

#[test]
fn multichannel_count_preserved() {
    let file = NamedTempFile::new().unwrap();
    let interleaved: Vec<i16> = (0..30).map(|i| i as i16).collect();
    write_raw_i16(file.path(), 3, &interleaved);

    let (channels, _) = read_wav_channels(file.path()).unwrap();
    assert_eq!(channels.len(), 3);
    assert!(channels.iter().all(|c| c.len() == 10));
}

#[test]
fn mono_not_expanded() {
    let file = NamedTempFile::new().unwrap();
    write_raw_i16(file.path(), 1, &[0, 1, 2, 3]);

    let (channels, _) = read_wav_channels(file.path()).unwrap();
    assert_eq!(channels.len(), 1);
}

// ---------------------------------------------------------------------------
// Metadata and errors
// ---------------------------------------------------------------------------

#[test]
fn info_reports_header() {
    let file = NamedTempFile::new().unwrap();
    write_raw_i16(file.path(), 2, &vec![0; 2 * 22050 * 3]);

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 22050);
    assert_eq!(info.num_frames, 22050 * 3);
    assert_eq!(info.format, WavFormat::Pcm);
    assert!((info.duration_secs - 3.0).abs() < 1e-9);
}

#[test]
fn missing_file_is_an_error() {
    // Open failures surface through hound
    let result = read_wav_channels("/nonexistent/definitely_missing.wav");
    assert!(matches!(result, Err(Error::Wav(hound::Error::IoError(_)))));
}

#[test]
fn garbage_file_is_an_error() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"not a wav file at all").unwrap();
    assert!(read_wav_channels(file.path()).is_err());
}
