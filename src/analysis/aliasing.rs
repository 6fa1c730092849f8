use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use super::kaiser::{kaiser_stft_window, KaiserError};
use crate::data::table::{Table, TableError};

/// Energy ratio floor, keeps a perfectly band-limited window at a finite level.
const ENERGY_FLOOR: f64 = 1e-30;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AliasingPoint {
    pub window_size: usize,
    pub interval: usize,
    /// Out-of-band energy relative to total window energy (dB)
    pub aliasing_db: f64,
}

impl AliasingPoint {
    pub fn overlap_ratio(&self) -> f64 {
        self.window_size as f64 / self.interval as f64
    }
}

/// Aliasing level of an STFT band using `window` with hop `interval`.
///
/// Each band is resampled once per hop, so window-spectrum energy beyond
/// `1/(2*interval)` cycles/sample folds back into the band.
pub fn aliasing_db(
    planner: &mut FftPlanner<f64>,
    window: &[f64],
    interval: usize,
    oversample: usize,
) -> f64 {
    let fft_size = window.len() * oversample.max(1);
    let fft = planner.plan_fft_forward(fft_size);

    let mut buffer = vec![Complex::new(0.0, 0.0); fft_size];
    for (slot, &w) in buffer.iter_mut().zip(window) {
        *slot = Complex::new(w, 0.0);
    }
    fft.process(&mut buffer);

    let nyquist = 0.5 / interval as f64;
    let mut total = 0.0;
    let mut outside = 0.0;
    for (k, bin) in buffer.iter().enumerate() {
        let power = bin.norm_sqr();
        let signed_k = if k <= fft_size / 2 {
            k as f64
        } else {
            k as f64 - fft_size as f64
        };
        let freq = signed_k / fft_size as f64;
        total += power;
        if freq.abs() > nyquist {
            outside += power;
        }
    }

    if total <= 0.0 {
        return 10.0 * ENERGY_FLOOR.log10();
    }
    10.0 * (outside / total + ENERGY_FLOOR).log10()
}

/// Sweep every hop from `window_size` down to `window_size / max_overlap`.
///
/// Points come back ordered by increasing overlap ratio.
pub fn simulate(
    window_size: usize,
    max_overlap: f64,
    oversample: usize,
) -> Result<Vec<AliasingPoint>, KaiserError> {
    if window_size == 0 {
        return Err(KaiserError::EmptyWindow);
    }
    let min_interval = ((window_size as f64 / max_overlap.max(1.0)).ceil() as usize).max(1);
    let intervals: Vec<usize> = (min_interval..=window_size).rev().collect();

    intervals
        .into_par_iter()
        .map(|interval| -> Result<AliasingPoint, KaiserError> {
            let window = kaiser_stft_window(window_size, interval)?;
            // Per-task FFT planner (rayon-safe)
            let mut planner = FftPlanner::<f64>::new();
            let aliasing_db = aliasing_db(&mut planner, &window, interval, oversample);
            Ok(AliasingPoint {
                window_size,
                interval,
                aliasing_db,
            })
        })
        .collect()
}

pub fn to_table(points: &[AliasingPoint]) -> Result<Table, TableError> {
    Table::from_columns(
        vec!["window".into(), "interval".into(), "aliasing (dB)".into()],
        vec![
            points.iter().map(|p| p.window_size as f64).collect(),
            points.iter().map(|p| p.interval as f64).collect(),
            points.iter().map(|p| p.aliasing_db).collect(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_covers_requested_overlaps() {
        let points = simulate(70, 12.0, 8).unwrap();
        assert_eq!(points.first().unwrap().interval, 70);
        assert_eq!(points.last().unwrap().interval, 6);
        assert_eq!(points.len(), 65);
        for pair in points.windows(2) {
            assert!(pair[1].overlap_ratio() > pair[0].overlap_ratio());
        }
    }

    #[test]
    fn test_aliasing_drops_with_overlap() {
        let points = simulate(128, 12.0, 8).unwrap();
        let at = |interval: usize| {
            points
                .iter()
                .find(|p| p.interval == interval)
                .map(|p| p.aliasing_db)
                .unwrap()
        };
        assert!(points.iter().all(|p| p.aliasing_db.is_finite() && p.aliasing_db <= 0.0));
        assert!(at(64) > at(32));
        assert!(at(32) > at(16));
        assert!(at(16) < -40.0);
    }

    #[test]
    fn test_rectangular_window_aliases_heavily() {
        let mut planner = FftPlanner::new();
        let window = vec![1.0; 32];
        let level = aliasing_db(&mut planner, &window, 32, 16);
        assert!(level > -20.0, "got {level}");
    }

    #[test]
    fn test_table_layout() {
        let points = simulate(16, 4.0, 4).unwrap();
        let table = to_table(&points).unwrap();
        assert_eq!(table.columns(), ["window", "interval", "aliasing (dB)"]);
        assert_eq!(table.num_rows(), points.len());
        assert_eq!(table.column(0).unwrap()[0], 16.0);
        assert_eq!(table.column(1).unwrap()[0], 16.0);
    }

    #[test]
    fn test_empty_window_is_rejected() {
        assert_eq!(simulate(0, 12.0, 8), Err(KaiserError::EmptyWindow));
    }
}
