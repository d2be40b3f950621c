//! Hilbert transform for amplitude envelopes.
//!
//! The analytic signal is computed with the FFT method:
//! 1. FFT of the real signal
//! 2. Zero the negative frequencies (bins N/2+1 to N-1)
//! 3. Double the positive frequencies (bins 1 to N/2-1)
//! 4. Keep DC and Nyquist unchanged
//! 5. Inverse FFT
//!
//! The magnitude of the analytic signal is the instantaneous amplitude,
//! i.e. the envelope that isochronic pulses modulate.
//!
//! # Example
//!
//! ```rust
//! use binaura_analysis::hilbert::HilbertTransform;
//! use std::f64::consts::PI;
//!
//! let hilbert = HilbertTransform::new(1024);
//! let signal: Vec<f64> = (0..1024)
//!     .map(|i| (2.0 * PI * 10.0 * i as f64 / 1024.0).sin())
//!     .collect();
//!
//! let envelope = hilbert.envelope(&signal);
//! assert_eq!(envelope.len(), signal.len());
//! ```

use crate::fft::Fft;
use rustfft::num_complex::Complex;

/// FFT-based Hilbert transform processor.
pub struct HilbertTransform {
    fft: Fft,
    fft_size: usize,
}

impl HilbertTransform {
    /// Create a processor for signals up to `fft_size` samples.
    ///
    /// Longer inputs are truncated, shorter inputs zero-padded.
    pub fn new(fft_size: usize) -> Self {
        Self {
            fft: Fft::new(fft_size),
            fft_size,
        }
    }

    /// Reuse an already planned transform; its size becomes the FFT size.
    pub fn with_fft(fft: Fft) -> Self {
        let fft_size = fft.size();
        Self { fft, fft_size }
    }

    /// Get the FFT size.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Compute the analytic signal `z(t) = x(t) + i*H{x(t)}`.
    ///
    /// The result has the input's length (capped at the FFT size).
    pub fn analytic_signal(&self, signal: &[f64]) -> Vec<Complex<f64>> {
        let n = signal.len().min(self.fft_size);

        let mut buffer: Vec<Complex<f64>> =
            signal[..n].iter().map(|&x| Complex::new(x, 0.0)).collect();
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.fft.forward_complex(&mut buffer);

        let half = self.fft_size / 2;
        for sample in buffer.iter_mut().take(half).skip(1) {
            *sample *= 2.0;
        }
        for sample in buffer.iter_mut().skip(half + 1) {
            *sample = Complex::new(0.0, 0.0);
        }

        self.fft.inverse_complex(&mut buffer);

        buffer.truncate(n);
        buffer
    }

    /// Instantaneous amplitude (envelope) for each sample.
    pub fn envelope(&self, signal: &[f64]) -> Vec<f64> {
        self.analytic_signal(signal).iter().map(|c| c.norm()).collect()
    }
}
