use realfft::{num_complex::Complex, FftError, RealFftPlanner};
use thiserror::Error;

/// Zero-padding factor used when nothing else is configured.
pub const DEFAULT_OVERSAMPLE: usize = 64;

/// Added to every bin magnitude so an exactly-zero bin still has a finite dB value.
pub const DEFAULT_EPSILON: f64 = 1e-30;

#[derive(Debug, Error)]
pub enum SpectrumError {
    #[error("cannot estimate the spectrum of an empty signal")]
    EmptySignal,
    #[error("oversample factor must be at least 1 (got {0})")]
    InvalidOversample(usize),
    #[error("epsilon floor must be finite and positive (got {0})")]
    InvalidEpsilon(f64),
    #[error("signal sample {index} is not finite")]
    NonFiniteSample { index: usize },
    #[error("FFT failed: {0}")]
    Transform(#[from] FftError),
}

/// Oversampled one-sided log-magnitude spectrum, relative to the zero-frequency bin.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    /// Fractional bin index of each value (`k / oversample`)
    pub bins: Vec<f64>,
    /// Magnitude in dB, `magnitude_db[0] == 0.0`
    pub magnitude_db: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

pub struct SpectrumEstimator {
    planner: RealFftPlanner<f64>,
    oversample: usize,
    epsilon: f64,
}

impl SpectrumEstimator {
    pub fn new(oversample: usize) -> Result<Self, SpectrumError> {
        Self::with_epsilon(oversample, DEFAULT_EPSILON)
    }

    pub fn with_epsilon(oversample: usize, epsilon: f64) -> Result<Self, SpectrumError> {
        if oversample < 1 {
            return Err(SpectrumError::InvalidOversample(oversample));
        }
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(SpectrumError::InvalidEpsilon(epsilon));
        }
        Ok(Self {
            planner: RealFftPlanner::new(),
            oversample,
            epsilon,
        })
    }

    pub fn oversample(&self) -> usize {
        self.oversample
    }

    /// Number of bins produced for a signal of `signal_len` samples.
    pub fn bin_count(&self, signal_len: usize) -> usize {
        signal_len * self.oversample / 2 + 1
    }

    /// Zero-pad `signal` to `oversample` times its length, take the real FFT and
    /// convert to dB relative to bin 0.
    pub fn estimate(&mut self, signal: &[f64]) -> Result<Spectrum, SpectrumError> {
        if signal.is_empty() {
            return Err(SpectrumError::EmptySignal);
        }
        if let Some(index) = signal.iter().position(|s| !s.is_finite()) {
            return Err(SpectrumError::NonFiniteSample { index });
        }

        // The DC sum of samples near f64::MAX overflows, so bring them down to
        // unit peak first. The output is relative to bin 0 either way.
        let peak = signal.iter().fold(0.0f64, |m, s| m.max(s.abs()));
        let headroom = f64::MAX / (4.0 * signal.len() as f64);
        let divisor = if peak > headroom { peak } else { 1.0 };

        let padded_len = signal.len() * self.oversample;
        let mut padded = vec![0.0; padded_len];
        for (slot, &s) in padded.iter_mut().zip(signal) {
            *slot = s / divisor;
        }

        let fft = self.planner.plan_fft_forward(padded_len);
        let mut output = fft.make_output_vec();
        fft.process(&mut padded, &mut output)?;
        debug_assert_eq!(output.len(), self.bin_count(signal.len()));

        let mut magnitude_db: Vec<f64> = output
            .iter()
            .map(|c: &Complex<f64>| 20.0 * (c.norm() + self.epsilon).log10())
            .collect();

        let reference = magnitude_db[0];
        for db in magnitude_db.iter_mut() {
            *db -= reference;
        }

        let step = 1.0 / self.oversample as f64;
        let bins = (0..magnitude_db.len()).map(|k| k as f64 * step).collect();

        Ok(Spectrum { bins, magnitude_db })
    }
}

/// One-off estimate with the default epsilon floor.
#[allow(dead_code)]
pub fn estimate_spectrum(signal: &[f64], oversample: usize) -> Result<Spectrum, SpectrumError> {
    SpectrumEstimator::new(oversample)?.estimate(signal)
}
