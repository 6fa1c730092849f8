mod analysis;
mod charts;
mod cli;
mod config;
mod data;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use analysis::aliasing;
use analysis::spectrum::SpectrumEstimator;
use cli::Cli;
use config::Config;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    if let Some(path) = config::find_config(cli.config.as_deref()) {
        match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                apply_config(&mut cli, cfg);
            }
            Err(err) => log::warn!("Ignoring config {}: {:#}", path.display(), err),
        }
    }

    run(&cli)
}

/// Config values apply only where the CLI is still at its default.
fn apply_config(cli: &mut Cli, cfg: Config) {
    if cli.analysis_dir == config::default_analysis_dir() {
        cli.analysis_dir = cfg.paths.analysis_dir;
    }
    if cli.oversample == config::default_oversample() {
        cli.oversample = cfg.spectrum.oversample;
    }
    if cli.epsilon == config::default_epsilon() {
        cli.epsilon = cfg.spectrum.epsilon;
    }
    if cli.sizes == config::default_sizes() {
        cli.sizes = cfg.aliasing.sizes;
    }
    if cli.max_overlap == config::default_max_overlap() {
        cli.max_overlap = cfg.aliasing.max_overlap;
    }
    if cli.window_size == config::default_window_size() {
        cli.window_size = cfg.generate.window_size;
    }
    if cli.overlaps == config::default_overlaps() {
        cli.overlaps = cfg.generate.overlaps;
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Bad oversample/epsilon is a configuration error; fail before touching files
    let mut estimator = SpectrumEstimator::with_epsilon(cli.oversample, cli.epsilon)
        .context("Invalid spectrum settings")?;

    let dir = cli.analysis_dir.as_path();
    log::info!("stft-plots - STFT window diagnostics");
    log::info!("Analysis directory: {}", dir.display());
    log::info!("Oversample: {}x, epsilon: {:e}", estimator.oversample(), cli.epsilon);

    // 1. Optionally synthesise the inputs
    if cli.generate {
        generate_inputs(cli, dir)?;
    }

    // 2. Kaiser windows and their spectra
    let windows_path = charts::kaiser_windows_csv(dir);
    log::info!("Loading {}", windows_path.display());
    let windows = data::read_csv(&windows_path)
        .with_context(|| format!("Failed to load window table: {}", windows_path.display()))?;
    log::info!(
        "{} windows x {} samples",
        windows.num_columns().saturating_sub(1),
        windows.num_rows()
    );
    let windows_figure = charts::kaiser_windows_figure(&windows, &mut estimator)
        .with_context(|| format!("Failed to plot {}", windows_path.display()))?;

    // 3. Simulated aliasing sweep
    let mut tables = Vec::with_capacity(cli.sizes.len());
    for &size in &cli.sizes {
        let path = charts::aliasing_csv(dir, size);
        let table = data::read_csv(&path)
            .with_context(|| format!("Failed to load aliasing table: {}", path.display()))?;
        log::info!("N={}: {} points", size, table.num_rows());
        tables.push((size, table));
    }
    let aliasing_figure =
        charts::aliasing_figure(&tables).context("Failed to plot aliasing sweep")?;

    // 4. Both figures built; write them out
    windows_figure.save(&charts::kaiser_windows_svg(dir))?;
    aliasing_figure.save(&charts::aliasing_svg(dir))?;

    log::info!("Done! Output: {}", dir.display());
    Ok(())
}

fn generate_inputs(cli: &Cli, dir: &Path) -> Result<()> {
    log::info!(
        "Generating Kaiser windows: size {}, overlaps {:?}",
        cli.window_size,
        cli.overlaps
    );
    let windows = charts::generate_kaiser_windows(cli.window_size, &cli.overlaps)
        .context("Failed to generate Kaiser windows")?;
    data::write_csv(&charts::kaiser_windows_csv(dir), &windows)?;

    log::info!(
        "Simulating aliasing up to {}x overlap for sizes {:?}",
        cli.max_overlap,
        cli.sizes
    );
    let pb = ProgressBar::new(cli.sizes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} sizes {msg}")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    for &size in &cli.sizes {
        pb.set_message(format!("N={}", size));
        let points = aliasing::simulate(size, cli.max_overlap, cli.oversample)
            .with_context(|| format!("Aliasing simulation failed for N={}", size))?;
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            log::debug!(
                "N={}: {} intervals, overlap {:.2}..{:.2}",
                size,
                points.len(),
                first.overlap_ratio(),
                last.overlap_ratio()
            );
        }
        let table = aliasing::to_table(&points)?;
        data::write_csv(&charts::aliasing_csv(dir, size), &table)?;
        pb.inc(1);
    }

    pb.finish_with_message("done");
    Ok(())
}
