use std::path::Path;

use super::svg;
use super::RenderError;

/// One plotted series.
#[derive(Clone, Debug)]
pub struct Line {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Axes {
    pub lines: Vec<Line>,
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    pub xticks: Option<Vec<f64>>,
}

impl Axes {
    pub fn plot(&mut self, x: Vec<f64>, y: Vec<f64>, label: Option<String>) -> &mut Self {
        self.lines.push(Line { x, y, label });
        self
    }

    pub fn set_xlim(&mut self, min: f64, max: f64) -> &mut Self {
        self.xlim = Some((min, max));
        self
    }

    pub fn set_ylim(&mut self, min: f64, max: f64) -> &mut Self {
        self.ylim = Some((min, max));
        self
    }

    pub fn set_xticks(&mut self, ticks: Vec<f64>) -> &mut Self {
        self.xticks = Some(ticks);
        self
    }

    pub fn set_xlabel(&mut self, label: &str) -> &mut Self {
        self.xlabel = Some(label.to_string());
        self
    }

    pub fn set_ylabel(&mut self, label: &str) -> &mut Self {
        self.ylabel = Some(label.to_string());
        self
    }

    #[allow(dead_code)]
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn has_legend(&self) -> bool {
        self.lines.iter().any(|l| l.label.is_some())
    }

    /// Explicit x limits, or the data range with a small margin.
    pub fn x_range(&self) -> (f64, f64) {
        self.xlim
            .unwrap_or_else(|| auto_range(self.lines.iter().flat_map(|l| l.x.iter().copied())))
    }

    pub fn y_range(&self) -> (f64, f64) {
        self.ylim
            .unwrap_or_else(|| auto_range(self.lines.iter().flat_map(|l| l.y.iter().copied())))
    }

    /// Explicit x ticks inside the x range, if any were set.
    pub fn x_ticks(&self) -> Option<Vec<f64>> {
        let (min, max) = self.x_range();
        self.xticks.as_ref().map(|ticks| {
            ticks
                .iter()
                .copied()
                .filter(|t| *t >= min.min(max) && *t <= min.max(max))
                .collect()
        })
    }
}

/// A vertical stack of axes with a fixed physical size.
#[derive(Clone, Debug)]
pub struct Figure {
    pub width_in: f64,
    pub height_in: f64,
    pub axes: Vec<Axes>,
}

impl Figure {
    pub fn new(rows: usize, width_in: f64, height_in: f64) -> Self {
        Self {
            width_in,
            height_in,
            axes: vec![Axes::default(); rows.max(1)],
        }
    }

    /// Single axes, sized for an inline diagram.
    pub fn small() -> Self {
        Self::new(1, 4.5, 3.0)
    }

    /// Full-width figure with `rows` stacked axes.
    pub fn medium(rows: usize) -> Self {
        let rows = rows.max(1);
        Self::new(rows, 6.5, 2.5 * rows as f64)
    }

    pub fn set_size_inches(&mut self, width: f64, height: f64) -> &mut Self {
        self.width_in = width;
        self.height_in = height;
        self
    }

    pub fn axes_mut(&mut self, index: usize) -> &mut Axes {
        &mut self.axes[index]
    }

    pub fn to_svg(&self) -> Result<String, RenderError> {
        svg::render(self)
    }

    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        let io_err = |source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let svg = self.to_svg()?;
        std::fs::write(path, svg).map_err(io_err)?;
        log::info!("Saved figure: {}", path.display());
        Ok(())
    }
}

fn auto_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    if max - min <= f64::EPSILON * max.abs().max(1.0) {
        return (min - 1.0, max + 1.0);
    }
    let margin = (max - min) * 0.05;
    (min - margin, max + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let small = Figure::small();
        assert_eq!(small.axes.len(), 1);
        let mut medium = Figure::medium(2);
        assert_eq!(medium.axes.len(), 2);
        medium.set_size_inches(6.5, 6.5);
        assert_eq!((medium.width_in, medium.height_in), (6.5, 6.5));
    }

    #[test]
    fn test_auto_range_adds_margin() {
        let mut axes = Axes::default();
        axes.plot(vec![0.0, 10.0], vec![-1.0, 1.0], None);
        assert_eq!(axes.x_range(), (-0.5, 10.5));
        let (lo, hi) = axes.y_range();
        assert!((lo + 1.1).abs() < 1e-12 && (hi - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_auto_range_edge_cases() {
        let mut axes = Axes::default();
        assert_eq!(axes.x_range(), (0.0, 1.0));
        axes.plot(vec![3.0, 3.0], vec![f64::NAN, 2.0], None);
        assert_eq!(axes.x_range(), (2.0, 4.0));
        assert_eq!(axes.y_range(), (1.0, 3.0));
    }

    #[test]
    fn test_explicit_limits_win() {
        let mut axes = Axes::default();
        axes.plot(vec![0.0, 100.0], vec![0.0, 100.0], None);
        axes.set_xlim(0.0, 6.0).set_ylim(-100.0, 1.0);
        assert_eq!(axes.x_range(), (0.0, 6.0));
        assert_eq!(axes.y_range(), (-100.0, 1.0));
    }

    #[test]
    fn test_explicit_ticks_are_clipped_to_range() {
        let mut axes = Axes::default();
        axes.set_xlim(1.0, 12.0)
            .set_xticks((2..14).step_by(2).map(f64::from).collect());
        assert_eq!(axes.x_ticks(), Some(vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0]));
        assert_eq!(Axes::default().x_ticks(), None);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let mut figure = Figure::small();
        figure.axes_mut(0).plot(vec![0.0, 1.0], vec![0.0, 1.0], None);
        let dir = std::env::temp_dir().join(format!("stft-plots-figure-{}", std::process::id()));
        let path = dir.join("nested").join("plot.svg");
        figure.save(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert!(written.contains("<svg"));
    }
}
