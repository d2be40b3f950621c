//! Butterworth bandpass built from biquad sections, with zero-phase
//! (forward-backward) filtering.
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas. A
//! 4th-order Butterworth response is two cascaded 2nd-order sections with
//! Q values 0.5412 and 1.3066; the bandpass cascades a 4th-order high-pass
//! at the lower cutoff with a 4th-order low-pass at the upper cutoff.
//!
//! # Example
//!
//! ```rust
//! use binaura_analysis::filter::ButterworthBandpass;
//!
//! let band = ButterworthBandpass::new(44100.0, 170.0, 230.0).unwrap();
//! let signal = vec![0.0; 4410];
//! let filtered = band.filtfilt(&signal);
//! assert_eq!(filtered.len(), signal.len());
//! ```

use std::f64::consts::PI;

/// Q values of the two sections of a 4th-order Butterworth filter.
const BUTTERWORTH_Q: [f64; 2] = [0.541_196_1, 1.306_563];

/// Second-order IIR section.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Build a section from raw coefficients, normalizing by `a0`.
    pub fn from_coefficients(coefficients: BiquadCoefficients) -> Self {
        let BiquadCoefficients { b0, b1, b2, a0, a1, a2 } = coefficients;
        let a0_inv = 1.0 / a0;
        Self {
            b0: b0 * a0_inv,
            b1: b1 * a0_inv,
            b2: b2 * a0_inv,
            a1: a1 * a0_inv,
            a2: a2 * a0_inv,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the delay lines without touching the coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Unnormalized biquad coefficients `(b0, b1, b2, a0, a1, a2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward coefficients
    pub b0: f64,
    /// Feedforward coefficients
    pub b1: f64,
    /// Feedforward coefficients
    pub b2: f64,
    /// Feedback coefficients
    pub a0: f64,
    /// Feedback coefficients
    pub a1: f64,
    /// Feedback coefficients
    pub a2: f64,
}

/// RBJ cookbook low-pass.
pub fn lowpass_coefficients(frequency: f64, q: f64, sample_rate: f64) -> BiquadCoefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = omega.cos();
    let alpha = omega.sin() / (2.0 * q);

    BiquadCoefficients {
        b0: (1.0 - cos_omega) / 2.0,
        b1: 1.0 - cos_omega,
        b2: (1.0 - cos_omega) / 2.0,
        a0: 1.0 + alpha,
        a1: -2.0 * cos_omega,
        a2: 1.0 - alpha,
    }
}

/// RBJ cookbook high-pass.
pub fn highpass_coefficients(frequency: f64, q: f64, sample_rate: f64) -> BiquadCoefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = omega.cos();
    let alpha = omega.sin() / (2.0 * q);

    BiquadCoefficients {
        b0: (1.0 + cos_omega) / 2.0,
        b1: -(1.0 + cos_omega),
        b2: (1.0 + cos_omega) / 2.0,
        a0: 1.0 + alpha,
        a1: -2.0 * cos_omega,
        a2: 1.0 - alpha,
    }
}

/// 4th-order Butterworth bandpass in second-order-sections form.
#[derive(Debug, Clone)]
pub struct ButterworthBandpass {
    sections: Vec<Biquad>,
    low_hz: f64,
    high_hz: f64,
}

impl ButterworthBandpass {
    /// Design a bandpass for `[low_hz, high_hz]`.
    ///
    /// Returns `None` when the band is degenerate: non-finite edges,
    /// `low_hz <= 0`, `high_hz >= nyquist`, or `low_hz >= high_hz`.
    pub fn new(sample_rate: f64, low_hz: f64, high_hz: f64) -> Option<Self> {
        let nyquist = sample_rate / 2.0;
        if !(low_hz.is_finite() && high_hz.is_finite())
            || low_hz <= 0.0
            || high_hz >= nyquist
            || low_hz >= high_hz
        {
            return None;
        }

        let mut sections = Vec::with_capacity(4);
        for q in BUTTERWORTH_Q {
            sections.push(Biquad::from_coefficients(highpass_coefficients(low_hz, q, sample_rate)));
        }
        for q in BUTTERWORTH_Q {
            sections.push(Biquad::from_coefficients(lowpass_coefficients(high_hz, q, sample_rate)));
        }

        Some(Self { sections, low_hz, high_hz })
    }

    /// Design a bandpass centered on `carrier_hz` with `±bandwidth_hz`,
    /// edges clipped to `(1, nyquist - 1)`.
    pub fn around_carrier(sample_rate: f64, carrier_hz: f64, bandwidth_hz: f64) -> Option<Self> {
        let nyquist = sample_rate / 2.0;
        let low = (carrier_hz - bandwidth_hz).max(1.0);
        let high = (carrier_hz + bandwidth_hz).min(nyquist - 1.0);
        Self::new(sample_rate, low, high)
    }

    /// Lower cutoff in Hz.
    pub fn low_hz(&self) -> f64 {
        self.low_hz
    }

    /// Upper cutoff in Hz.
    pub fn high_hz(&self) -> f64 {
        self.high_hz
    }

    fn reset(&mut self) {
        for section in &mut self.sections {
            section.clear();
        }
    }

    fn run(&mut self, signal: &mut [f64]) {
        self.reset();
        for sample in signal.iter_mut() {
            let mut x = *sample;
            for section in &mut self.sections {
                x = section.process(x);
            }
            *sample = x;
        }
    }

    /// Zero-phase forward-backward filtering.
    ///
    /// The signal is extended at both ends by odd reflection before the
    /// two passes so the start-up transients fall outside the returned
    /// samples.
    pub fn filtfilt(&self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n < 2 {
            return signal.to_vec();
        }
        let pad = (3 * (2 * self.sections.len() + 1)).min(n - 1);

        let first = signal[0];
        let last = signal[n - 1];
        let mut extended = Vec::with_capacity(n + 2 * pad);
        extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
        extended.extend_from_slice(signal);
        extended.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));

        let mut state = self.clone();
        state.run(&mut extended);
        extended.reverse();
        state.run(&mut extended);
        extended.reverse();

        extended[pad..pad + n].to_vec()
    }
}
