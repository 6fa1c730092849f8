use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analysis::spectrum::{DEFAULT_EPSILON, DEFAULT_OVERSAMPLE};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub aliasing: AliasingConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
}

#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_analysis_dir")]
    pub analysis_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SpectrumConfig {
    #[serde(default = "default_oversample")]
    pub oversample: usize,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

#[derive(Debug, Deserialize)]
pub struct AliasingConfig {
    #[serde(default = "default_sizes")]
    pub sizes: Vec<usize>,
    #[serde(default = "default_max_overlap")]
    pub max_overlap: f64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_overlaps")]
    pub overlaps: Vec<usize>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            analysis_dir: default_analysis_dir(),
        }
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            oversample: default_oversample(),
            epsilon: default_epsilon(),
        }
    }
}

impl Default for AliasingConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            max_overlap: default_max_overlap(),
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            overlaps: default_overlaps(),
        }
    }
}

pub fn default_analysis_dir() -> PathBuf { PathBuf::from("out/analysis") }
pub fn default_oversample() -> usize { DEFAULT_OVERSAMPLE }
pub fn default_epsilon() -> f64 { DEFAULT_EPSILON }
pub fn default_sizes() -> Vec<usize> { vec![257, 163, 128, 70] }
pub fn default_max_overlap() -> f64 { 12.0 }
pub fn default_window_size() -> usize { 256 }
pub fn default_overlaps() -> Vec<usize> { vec![2, 4, 6, 8] }

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Explicit path, then `./stft-plots.toml`, then the platform config directory.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("stft-plots.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("stft-plots").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
