//! Kaiser windows for STFT analysis.
//!
//! The STFT window is a Kaiser window whose bandwidth follows the overlap ratio,
//! normalised so that the squared, overlapped windows sum to exactly one.

use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum KaiserError {
    #[error("window size must be non-zero")]
    EmptyWindow,
    #[error("interval must be between 1 and the window size {window_size} (got {interval})")]
    InvalidInterval { window_size: usize, interval: usize },
}

#[derive(Clone, Copy, Debug)]
pub struct Kaiser {
    beta: f64,
    inv_b0: f64,
}

impl Kaiser {
    pub fn new(beta: f64) -> Self {
        Self {
            beta,
            inv_b0: 1.0 / bessel0(beta),
        }
    }

    /// Kaiser window whose main lobe is roughly `bandwidth` bins wide.
    pub fn with_bandwidth(bandwidth: f64, heuristic_optimal: bool) -> Self {
        Self::new(Self::bandwidth_to_beta(bandwidth, heuristic_optimal))
    }

    pub fn bandwidth_to_beta(bandwidth: f64, heuristic_optimal: bool) -> f64 {
        if heuristic_optimal {
            // Fitted against a numerical search for the lowest aliasing
            return bandwidth
                + 8.0 / ((bandwidth + 3.0) * (bandwidth + 3.0))
                + 0.25 * (3.0 - bandwidth).max(0.0);
        }
        let bandwidth = bandwidth.max(2.0);
        let alpha = (bandwidth * bandwidth * 0.25 - 1.0).sqrt();
        alpha * PI
    }

    #[allow(dead_code)]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Fill `data` with the window, sampled at the centre of each of its slots.
    pub fn fill(&self, data: &mut [f64]) {
        let inv_size = 1.0 / data.len() as f64;
        for (i, w) in data.iter_mut().enumerate() {
            let r = (2 * i + 1) as f64 * inv_size - 1.0;
            let arg = (1.0 - r * r).max(0.0).sqrt();
            *w = bessel0(self.beta * arg) * self.inv_b0;
        }
    }
}

/// Scale `data` so that copies spaced `interval` apart have squares summing to 1.
pub fn force_perfect_reconstruction(data: &mut [f64], window_size: usize, interval: usize) {
    let window_size = window_size.min(data.len());
    for phase in 0..interval.min(window_size) {
        let sum2: f64 = (phase..window_size)
            .step_by(interval)
            .map(|i| data[i] * data[i])
            .sum();
        if sum2 <= 0.0 {
            continue;
        }
        let factor = 1.0 / sum2.sqrt();
        for i in (phase..window_size).step_by(interval) {
            data[i] *= factor;
        }
    }
}

/// Perfect-reconstruction Kaiser window for an STFT with the given hop.
pub fn kaiser_stft_window(window_size: usize, interval: usize) -> Result<Vec<f64>, KaiserError> {
    if window_size == 0 {
        return Err(KaiserError::EmptyWindow);
    }
    if interval == 0 || interval > window_size {
        return Err(KaiserError::InvalidInterval {
            window_size,
            interval,
        });
    }

    let overlap = window_size as f64 / interval as f64;
    let mut window = vec![0.0; window_size];
    Kaiser::with_bandwidth(overlap, true).fill(&mut window);
    force_perfect_reconstruction(&mut window, window_size, interval);
    Ok(window)
}

/// Zeroth-order modified Bessel function of the first kind.
fn bessel0(x: f64) -> f64 {
    let quarter_x2 = x * x * 0.25;
    let mut result = 0.0;
    let mut term = 1.0;
    let mut m = 0.0;
    while term > result * 1e-16 {
        result += term;
        m += 1.0;
        term *= quarter_x2 / (m * m);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bessel0_known_values() {
        assert_eq!(bessel0(0.0), 1.0);
        assert!((bessel0(1.0) - 1.266_065_877_752_008).abs() < 1e-12);
        assert!((bessel0(5.0) - 27.239_871_823_604_44).abs() < 1e-9);
    }

    #[test]
    fn test_bandwidth_to_beta() {
        // Below 2 bins the direct formula clamps to a rectangular window
        assert_eq!(Kaiser::bandwidth_to_beta(1.0, false), 0.0);
        let beta = Kaiser::bandwidth_to_beta(4.0, false);
        assert!((beta - 3.0f64.sqrt() * PI).abs() < 1e-12);

        let heuristic = Kaiser::bandwidth_to_beta(3.0, true);
        assert!((heuristic - (3.0 + 8.0 / 36.0)).abs() < 1e-12);
        assert!(Kaiser::bandwidth_to_beta(8.0, true) > Kaiser::bandwidth_to_beta(4.0, true));
    }

    #[test]
    fn test_window_is_symmetric_and_peaked() {
        let mut window = vec![0.0; 65];
        Kaiser::new(6.0).fill(&mut window);

        assert!((window[32] - 1.0).abs() < 1e-12);
        for i in 0..window.len() {
            assert!((window[i] - window[window.len() - 1 - i]).abs() < 1e-12);
            assert!(window[i] <= 1.0 + 1e-12);
        }
        assert!(window[0] < 0.05);
    }

    #[test]
    fn test_beta_zero_is_rectangular() {
        let mut window = vec![0.0; 16];
        Kaiser::new(0.0).fill(&mut window);
        assert!(window.iter().all(|&w| (w - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_perfect_reconstruction() {
        for (size, interval) in [(256, 64), (257, 40), (70, 70), (128, 11)] {
            let window = kaiser_stft_window(size, interval).unwrap();
            for phase in 0..interval {
                let sum2: f64 = (phase..size).step_by(interval).map(|i| window[i] * window[i]).sum();
                assert!((sum2 - 1.0).abs() < 1e-9, "size {size} interval {interval} phase {phase}");
            }
        }
    }

    #[test]
    fn test_stft_window_rejects_bad_sizes() {
        assert_eq!(kaiser_stft_window(0, 1), Err(KaiserError::EmptyWindow));
        assert_eq!(
            kaiser_stft_window(16, 0),
            Err(KaiserError::InvalidInterval {
                window_size: 16,
                interval: 0
            })
        );
        assert!(kaiser_stft_window(16, 17).is_err());
    }
}
