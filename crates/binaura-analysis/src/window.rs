//! Stereo input buffer and overlapping window slicing.

use crate::error::{AnalysisError, Result};

/// A decoded stereo recording.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: f64,
}

impl StereoBuffer {
    /// Build from separate left and right channels.
    pub fn new(left: Vec<f32>, right: Vec<f32>, sample_rate: f64) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        if left.len() != right.len() {
            return Err(AnalysisError::ChannelLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        if left.is_empty() {
            return Err(AnalysisError::EmptyBuffer);
        }
        Ok(Self { left, right, sample_rate })
    }

    /// Build from a decoder's per-channel output.
    ///
    /// Anything but exactly two channels fails with
    /// [`AnalysisError::UnsupportedChannelLayout`].
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: f64) -> Result<Self> {
        let count = channels.len();
        let mut iter = channels.into_iter();
        match (iter.next(), iter.next(), iter.next()) {
            (Some(left), Some(right), None) => Self::new(left, right, sample_rate),
            _ => Err(AnalysisError::UnsupportedChannelLayout { channels: count }),
        }
    }

    /// Left channel samples.
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// Right channel samples.
    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Always false for a constructed buffer; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.len() as f64 / self.sample_rate
    }
}

/// A borrowed view of one analysis window.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisWindow<'a> {
    /// Position in the window sequence.
    pub index: usize,
    /// First sample of the window.
    pub start_sample: usize,
    /// Window start time in seconds.
    pub time_sec: f64,
    /// Left channel samples.
    pub left: &'a [f32],
    /// Right channel samples.
    pub right: &'a [f32],
    /// False for a truncated trailing window.
    pub complete: bool,
}

impl AnalysisWindow<'_> {
    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True when the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Slices a stereo buffer into fixed-length, overlapping windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSampler {
    window_len: usize,
    step_len: usize,
}

impl WindowSampler {
    /// Create a sampler from durations in seconds.
    pub fn new(sample_rate: f64, window_sec: f64, step_sec: f64) -> Self {
        Self::from_samples(
            (window_sec * sample_rate).round() as usize,
            (step_sec * sample_rate).round() as usize,
        )
    }

    /// Create a sampler from lengths in samples. A zero step is raised to one.
    pub fn from_samples(window_len: usize, step_len: usize) -> Self {
        Self {
            window_len: window_len.max(1),
            step_len: step_len.max(1),
        }
    }

    /// Window length in samples.
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Hop length in samples.
    pub fn step_len(&self) -> usize {
        self.step_len
    }

    /// Number of windows produced for a buffer of `len` samples,
    /// including a trailing truncated window when one exists.
    pub fn window_count(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        if len < self.window_len {
            return 1;
        }
        let full = (len - self.window_len) / self.step_len + 1;
        let last_end = (full - 1) * self.step_len + self.window_len;
        let next_start = full * self.step_len;
        if last_end < len && next_start < len {
            full + 1
        } else {
            full
        }
    }

    /// Slice the buffer into windows in time order.
    pub fn windows<'a>(&self, buffer: &'a StereoBuffer) -> Vec<AnalysisWindow<'a>> {
        let len = buffer.len();
        let sample_rate = buffer.sample_rate();
        (0..self.window_count(len))
            .map(|index| {
                let start = index * self.step_len;
                let end = (start + self.window_len).min(len);
                AnalysisWindow {
                    index,
                    start_sample: start,
                    time_sec: start as f64 / sample_rate,
                    left: &buffer.left()[start..end],
                    right: &buffer.right()[start..end],
                    complete: end - start == self.window_len,
                }
            })
            .collect()
    }
}

/// Convert a channel slice to `f64` for spectral work.
pub fn to_f64(samples: &[f32]) -> Vec<f64> {
    samples.iter().map(|&s| f64::from(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(len: usize) -> StereoBuffer {
        StereoBuffer::new(vec![0.0; len], vec![0.0; len], 10.0).unwrap()
    }

    #[test]
    fn mono_is_rejected() {
        let err = StereoBuffer::from_channels(vec![vec![0.0; 10]], 44100.0).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedChannelLayout { channels: 1 }));

        let err = StereoBuffer::from_channels(vec![vec![0.0; 10]; 3], 44100.0).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedChannelLayout { channels: 3 }));
    }

    #[test]
    fn invalid_buffers_rejected() {
        assert!(matches!(
            StereoBuffer::new(vec![0.0; 4], vec![0.0; 4], 0.0),
            Err(AnalysisError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            StereoBuffer::new(vec![0.0; 4], vec![0.0; 3], 8000.0),
            Err(AnalysisError::ChannelLengthMismatch { left: 4, right: 3 })
        ));
        assert!(matches!(
            StereoBuffer::new(Vec::new(), Vec::new(), 8000.0),
            Err(AnalysisError::EmptyBuffer)
        ));
    }

    #[test]
    fn exact_fit_has_no_trailing_window() {
        // 100 samples, window 40, step 20: starts 0, 20, 40, 60
        let sampler = WindowSampler::from_samples(40, 20);
        let buf = buffer(100);
        let windows = sampler.windows(&buf);

        assert_eq!(windows.len(), 4);
        assert!(windows.iter().all(|w| w.complete && w.len() == 40));
        assert_eq!(windows[3].start_sample, 60);
        assert!((windows[1].time_sec - 2.0).abs() < 1e-12);
    }

    #[test]
    fn leftover_produces_truncated_window() {
        // 110 samples: full windows at 0..60, then a truncated one at 80
        let sampler = WindowSampler::from_samples(40, 20);
        let buf = buffer(110);
        let windows = sampler.windows(&buf);

        assert_eq!(windows.len(), 5);
        let last = windows.last().unwrap();
        assert!(!last.complete);
        assert_eq!(last.start_sample, 80);
        assert_eq!(last.len(), 30);
    }

    #[test]
    fn short_buffer_is_one_truncated_window() {
        let sampler = WindowSampler::from_samples(40, 20);
        let buf = buffer(25);
        let windows = sampler.windows(&buf);

        assert_eq!(windows.len(), 1);
        assert!(!windows[0].complete);
    }

    #[test]
    fn step_longer_than_window() {
        // Windows at 0 and 50; the next start (100) is past the end
        let sampler = WindowSampler::from_samples(30, 50);
        assert_eq!(sampler.window_count(100), 2);
        assert_eq!(sampler.window_count(120), 3);
    }
}
