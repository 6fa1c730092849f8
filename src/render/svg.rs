use std::ops::Range;

use plotters::coord::combinators::{BindKeyPoints, WithKeyPoints};
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::figure::{Axes, Figure};
use super::RenderError;

/// Output pixels per inch of figure size.
const DPI: f64 = 100.0;

const FONT: &str = "sans-serif";
const FONT_SIZE: u32 = 12;
const TITLE_SIZE: u32 = 14;
const MARGIN: u32 = 10;
const X_LABEL_AREA: u32 = 36;
const Y_LABEL_AREA: u32 = 52;
const MAX_TICKS: usize = 8;

const PALETTE: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

/// `WithKeyPoints` axis that opts into plotters' default formatting so
/// `configure_mesh` type-checks; labels still come from `format_tick`.
struct KeyPointAxis(WithKeyPoints<RangedCoordf64>);

impl Ranged for KeyPointAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn range(&self) -> Range<f64> {
        self.0.range()
    }

    fn axis_pixel_range(&self, limit: (i32, i32)) -> Range<i32> {
        self.0.axis_pixel_range(limit)
    }
}

/// Pixel size of the SVG document for `figure`.
pub fn pixel_size(figure: &Figure) -> (u32, u32) {
    (
        (figure.width_in * DPI).round().max(1.0) as u32,
        (figure.height_in * DPI).round().max(1.0) as u32,
    )
}

/// Draw every axes of `figure`, stacked top to bottom, into an SVG document.
pub fn render(figure: &Figure) -> Result<String, RenderError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, pixel_size(figure)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let areas = root.split_evenly((figure.axes.len().max(1), 1));
        for (area, axes) in areas.iter().zip(&figure.axes) {
            draw_axes(area, axes)?;
        }
        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

fn draw_axes(area: &DrawingArea<SVGBackend<'_>, Shift>, axes: &Axes) -> Result<(), RenderError> {
    let (x0, x1) = axes.x_range();
    let (y0, y1) = axes.y_range();
    let x_ticks = axes
        .x_ticks()
        .unwrap_or_else(|| RangedCoordf64::from(x0..x1).key_points(MAX_TICKS));
    let y_ticks = RangedCoordf64::from(y0..y1).key_points(MAX_TICKS);

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA);
    if let Some(title) = &axes.title {
        builder.caption(title, (FONT, TITLE_SIZE));
    }
    let mut chart = builder
        .build_cartesian_2d(
            KeyPointAxis((x0..x1).with_key_points(x_ticks)),
            KeyPointAxis((y0..y1).with_key_points(y_ticks)),
        )
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(axes.xlabel.as_deref().unwrap_or_default())
        .y_desc(axes.ylabel.as_deref().unwrap_or_default())
        .x_label_formatter(&format_tick)
        .y_label_formatter(&format_tick)
        .label_style((FONT, FONT_SIZE))
        .draw()
        .map_err(draw_err)?;

    for (i, line) in axes.lines.iter().enumerate() {
        let style = PALETTE[i % PALETTE.len()].stroke_width(1);
        let points: Vec<(f64, f64)> = line.x.iter().copied().zip(line.y.iter().copied()).collect();
        let mut label = line.label.as_deref();

        // Non-finite points break the line; only the visible x span is drawn
        for run in points.split(|(x, y)| !x.is_finite() || !y.is_finite()) {
            let visible: Vec<(f64, f64)> = run
                .iter()
                .filter(|(x, _)| *x >= x0.min(x1) && *x <= x0.max(x1))
                .map(|&(x, y)| (x, y.clamp(y0.min(y1), y0.max(y1))))
                .collect();
            if visible.is_empty() {
                continue;
            }
            let series = chart
                .draw_series(LineSeries::new(visible, style))
                .map_err(draw_err)?;
            if let Some(text) = label.take() {
                series
                    .label(text)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
        }
    }

    if axes.has_legend() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT, FONT_SIZE))
            .draw()
            .map_err(draw_err)?;
    }

    Ok(())
}

fn draw_err(err: impl std::fmt::Display) -> RenderError {
    RenderError::Draw(err.to_string())
}

fn format_tick(value: &f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_document_size_follows_inches() {
        let figure = Figure::small();
        assert_eq!(pixel_size(&figure), (450, 300));
        let svg = figure.to_svg().unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("450"));
        assert!(svg.contains("300"));
    }

    #[test]
    fn test_lines_become_polylines() {
        let mut figure = Figure::small();
        figure
            .axes_mut(0)
            .plot(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0], None)
            .plot(vec![0.0, 2.0], vec![1.0, 1.0], None);
        let svg = figure.to_svg().unwrap();
        assert!(count(&svg, "<polyline") >= 2);
    }

    #[test]
    fn test_non_finite_points_split_lines() {
        let mut plain = Figure::small();
        plain
            .axes_mut(0)
            .plot(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![0.0, 1.0, 0.5, 1.0, 0.5], None)
            .set_xlim(0.0, 4.0)
            .set_ylim(-1.0, 2.0);
        let mut broken = Figure::small();
        broken
            .axes_mut(0)
            .plot(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![0.0, 1.0, f64::NAN, 1.0, 0.5], None)
            .set_xlim(0.0, 4.0)
            .set_ylim(-1.0, 2.0);
        let plain_lines = count(&plain.to_svg().unwrap(), "<polyline");
        let broken_lines = count(&broken.to_svg().unwrap(), "<polyline");
        assert_eq!(broken_lines, plain_lines + 1);
    }

    #[test]
    fn test_labels_and_legend_are_drawn() {
        let mut figure = Figure::small();
        figure
            .axes_mut(0)
            .plot(vec![0.0, 1.0], vec![0.0, 1.0], Some("N=70".into()))
            .plot(vec![0.0, 1.0], vec![1.0, 0.0], Some("N=128".into()))
            .set_xlabel("bin")
            .set_ylabel("dB");
        let svg = figure.to_svg().unwrap();
        assert!(svg.contains("N=70"));
        assert!(svg.contains("N=128"));
        assert!(svg.contains("bin"));
        assert!(svg.contains("dB"));
    }

    #[test]
    fn test_no_legend_without_labels() {
        let mut labelled = Figure::small();
        labelled.axes_mut(0).plot(vec![0.0, 1.0], vec![0.0, 1.0], Some("ramp".into()));
        let mut bare = Figure::small();
        bare.axes_mut(0).plot(vec![0.0, 1.0], vec![0.0, 1.0], None);
        let labelled_svg = labelled.to_svg().unwrap();
        let bare_svg = bare.to_svg().unwrap();
        assert!(labelled_svg.contains("ramp"));
        // Legend swatch
        assert!(count(&labelled_svg, "<polyline") > count(&bare_svg, "<polyline"));
    }

    #[test]
    fn test_explicit_ticks_are_labelled() {
        let mut figure = Figure::small();
        figure
            .axes_mut(0)
            .plot(vec![1.0, 12.0], vec![-152.0, 0.0], None)
            .set_xlim(1.0, 12.0)
            .set_ylim(-152.0, 0.0)
            .set_xticks(vec![2.0, 7.0, 12.0]);
        assert_eq!(figure.axes[0].x_ticks(), Some(vec![2.0, 7.0, 12.0]));
        let svg = figure.to_svg().unwrap();
        assert!(svg.contains(">7<"));
        assert!(!svg.contains(">4<"));
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(&0.0), "0");
        assert_eq!(format_tick(&-0.0), "0");
        assert_eq!(format_tick(&2.0), "2");
        assert_eq!(format_tick(&0.30000000000000004), "0.3");
        assert_eq!(format_tick(&-150.0), "-150");
    }
}
