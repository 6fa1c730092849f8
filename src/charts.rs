//! The two STFT diagnostic figures and the files they are built from.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::kaiser::{kaiser_stft_window, KaiserError};
use crate::analysis::spectrum::{SpectrumError, SpectrumEstimator};
use crate::data::{Table, TableError};
use crate::render::Figure;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("{name} needs at least {needed} columns, found {found}")]
    TooFewColumns {
        name: &'static str,
        needed: usize,
        found: usize,
    },
    #[error("window column '{column}': {source}")]
    Spectrum {
        column: String,
        #[source]
        source: SpectrumError,
    },
    #[error(transparent)]
    Kaiser(#[from] KaiserError),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Right edge of the spectrum plot; bins beyond it are not kept.
const SPECTRUM_MAX_BIN: f64 = 6.0;

pub fn kaiser_windows_csv(dir: &Path) -> PathBuf {
    dir.join("stft-kaiser-windows.csv")
}

pub fn kaiser_windows_svg(dir: &Path) -> PathBuf {
    dir.join("stft-kaiser-windows.svg")
}

pub fn aliasing_csv(dir: &Path, size: usize) -> PathBuf {
    dir.join(format!("stft-aliasing-simulated-{}.csv", size))
}

pub fn aliasing_svg(dir: &Path) -> PathBuf {
    dir.join("stft-aliasing-simulated.svg")
}

/// Window shapes on top, their oversampled spectra below.
///
/// Column 0 of `table` is the time axis; every other column is one window,
/// named after its overlap ratio.
pub fn kaiser_windows_figure(
    table: &Table,
    estimator: &mut SpectrumEstimator,
) -> Result<Figure, ChartError> {
    if table.num_columns() < 2 {
        return Err(ChartError::TooFewColumns {
            name: "Kaiser window table",
            needed: 2,
            found: table.num_columns(),
        });
    }

    let mut figure = Figure::medium(2);
    figure.set_size_inches(6.5, 6.5);

    let time = table.column(0).unwrap_or_default().to_vec();
    for (i, name) in table.columns().iter().enumerate().skip(1) {
        let window = table.column(i).unwrap_or_default();
        figure.axes_mut(0).plot(
            time.clone(),
            window.to_vec(),
            Some(format!("{}x overlap", name)),
        );

        let spectrum = estimator
            .estimate(window)
            .map_err(|source| ChartError::Spectrum {
                column: name.clone(),
                source,
            })?;
        log::debug!("Window '{}': {} spectrum bins", name, spectrum.len());
        let (mut bins, mut magnitude_db) = (spectrum.bins, spectrum.magnitude_db);
        let visible = bins.iter().take_while(|b| **b <= SPECTRUM_MAX_BIN).count();
        bins.truncate(visible);
        magnitude_db.truncate(visible);
        figure.axes_mut(1).plot(bins, magnitude_db, None);
    }

    figure.axes_mut(0).set_ylim(-0.1, 1.1);
    figure
        .axes_mut(1)
        .set_ylim(-100.0, 1.0)
        .set_xlim(0.0, SPECTRUM_MAX_BIN)
        .set_xlabel("bin")
        .set_ylabel("dB");

    Ok(figure)
}

/// Aliasing level against overlap ratio, one line per window size.
///
/// Each table holds window length, interval and aliasing (dB) in its first
/// three columns.
pub fn aliasing_figure(tables: &[(usize, Table)]) -> Result<Figure, ChartError> {
    let mut figure = Figure::small();
    let axes = figure.axes_mut(0);

    for (size, table) in tables {
        if table.num_columns() < 3 {
            return Err(ChartError::TooFewColumns {
                name: "aliasing table",
                needed: 3,
                found: table.num_columns(),
            });
        }
        let window = table.column(0).unwrap_or_default();
        let interval = table.column(1).unwrap_or_default();
        let aliasing = table.column(2).unwrap_or_default();

        let overlap_ratio: Vec<f64> = window.iter().zip(interval).map(|(w, i)| w / i).collect();
        axes.plot(overlap_ratio, aliasing.to_vec(), Some(format!("N={}", size)));
    }

    axes.set_ylabel("aliasing (dB)")
        .set_xlabel("overlap ratio (window/interval)")
        .set_xlim(1.0, 12.0)
        .set_xticks((2..14).step_by(2).map(f64::from).collect())
        .set_ylim(-152.0, 0.0);

    Ok(figure)
}

/// Table of perfect-reconstruction Kaiser windows, one column per overlap.
///
/// Each window is scaled to a peak of 1 for display; the spectrum plot is
/// relative to its own DC bin so the scale does not affect it.
pub fn generate_kaiser_windows(window_size: usize, overlaps: &[usize]) -> Result<Table, ChartError> {
    let mut columns = vec!["time".to_string()];
    let mut data = vec![(0..window_size)
        .map(|i| (i as f64 + 0.5) / window_size as f64)
        .collect::<Vec<f64>>()];

    for &overlap in overlaps {
        let interval = if overlap == 0 { 0 } else { window_size / overlap };
        let mut window = kaiser_stft_window(window_size, interval)?;
        let peak = window.iter().copied().fold(0.0f64, f64::max);
        if peak > 0.0 {
            for w in window.iter_mut() {
                *w /= peak;
            }
        }
        columns.push(overlap.to_string());
        data.push(window);
    }

    Ok(Table::from_columns(columns, data)?)
}
