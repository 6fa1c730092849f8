use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stft-plots", about = "Kaiser STFT window and aliasing diagnostic plots")]
pub struct Cli {
    /// Directory holding the input CSVs and receiving the SVGs
    #[arg(short, long, default_value = "out/analysis")]
    pub analysis_dir: PathBuf,

    /// Zero-padding factor for window spectra (1 = no padding)
    #[arg(long, default_value_t = 64)]
    pub oversample: usize,

    /// Magnitude floor added before converting to dB
    #[arg(long, default_value_t = 1e-30)]
    pub epsilon: f64,

    /// Window sizes of the aliasing sweep (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = [257, 163, 128, 70])]
    pub sizes: Vec<usize>,

    /// Write the input CSVs before plotting
    #[arg(short, long)]
    pub generate: bool,

    /// Window length for generated Kaiser windows
    #[arg(long, default_value_t = 256)]
    pub window_size: usize,

    /// Overlap ratios for generated Kaiser windows (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = [2, 4, 6, 8])]
    pub overlaps: Vec<usize>,

    /// Largest overlap ratio in the generated aliasing sweep
    #[arg(long, default_value_t = 12.0)]
    pub max_overlap: f64,

    /// Config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
