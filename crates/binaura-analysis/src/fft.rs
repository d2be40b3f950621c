//! FFT wrapper with Hann windowing

use rustfft::{FftPlanner, num_complex::Complex};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// Floor added to magnitudes before taking logarithms.
pub const DB_EPSILON: f64 = 1e-12;

/// Apply a periodic Hann window (raised cosine) in place.
pub fn hann_window(buffer: &mut [f64]) {
    let n = buffer.len();
    if n == 0 {
        return;
    }
    for (i, sample) in buffer.iter_mut().enumerate() {
        let w = 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos());
        *sample *= w;
    }
}

/// Forward/inverse FFT pair planned for one size.
///
/// Plans are shared through `Arc`, so a planned `Fft` is cheap to clone
/// and safe to use from several worker threads.
#[derive(Clone)]
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f64>>,
    ifft: Arc<dyn rustfft::Fft<f64>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);

        Self { fft, ifft, size }
    }

    /// Get FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Frequency spacing between bins for a given sample rate.
    pub fn bin_width(&self, sample_rate: f64) -> f64 {
        sample_rate / self.size as f64
    }

    /// Perform forward FFT on real input
    ///
    /// Input is zero-padded or truncated to the FFT size. Returns the
    /// positive-frequency half (size/2 + 1 bins, DC to Nyquist).
    pub fn forward(&self, input: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> = input
            .iter()
            .take(self.size)
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer.truncate(self.size / 2 + 1);
        buffer
    }

    /// Magnitude spectrum of a Hann-windowed real block.
    ///
    /// The block is truncated to the FFT size and windowed over its own
    /// length before zero padding.
    pub fn hann_magnitude(&self, block: &[f64]) -> Vec<f64> {
        let mut windowed = block[..block.len().min(self.size)].to_vec();
        hann_window(&mut windowed);
        self.forward(&windowed).iter().map(|c| c.norm()).collect()
    }

    /// Perform forward FFT on complex input (in-place)
    pub fn forward_complex(&self, buffer: &mut [Complex<f64>]) {
        self.fft.process(buffer);
    }

    /// Perform inverse FFT on complex buffer (in-place, normalized)
    pub fn inverse_complex(&self, buffer: &mut [Complex<f64>]) {
        self.ifft.process(buffer);

        let scale = 1.0 / self.size as f64;
        for c in buffer.iter_mut() {
            *c *= scale;
        }
    }
}

impl fmt::Debug for Fft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft").field("size", &self.size).finish()
    }
}

/// Magnitude spectrum of a Hann-windowed real block, one bin per
/// `sample_rate / block.len()` Hz. Plans a transform for this call only;
/// use [`Fft::hann_magnitude`] when many blocks share a length.
pub fn hann_magnitude_spectrum(block: &[f64]) -> Vec<f64> {
    Fft::new(block.len()).hann_magnitude(block)
}

/// Convert a linear magnitude to dB.
#[inline]
pub fn magnitude_to_db(magnitude: f64) -> f64 {
    20.0 * (magnitude + DB_EPSILON).log10()
}
