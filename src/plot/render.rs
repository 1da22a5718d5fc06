//! Drawing plans with plotters, to SVG or PNG.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;

use super::bars::{BarKind, BarPlan};
use super::histogram::DistributionPlan;
use super::overlay::{BandKind, OverlayPlan};
use super::palette::{series_color, LABEL_COLOR, PREDICTION_COLOR, UNMAPPED_COLOR};

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("unsupported output format for {} (use .svg or .png)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("nothing to draw: {0}")]
    Empty(&'static str),

    #[error("drawing failed: {0}")]
    Draw(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Draw(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, PlotError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(PlotError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 600,
        }
    }
}

macro_rules! with_backend {
    ($path:expr, $options:expr, $draw:expr) => {{
        let size = ($options.width, $options.height);
        match OutputFormat::from_path($path)? {
            OutputFormat::Svg => $draw(SVGBackend::new($path, size).into_drawing_area()),
            OutputFormat::Png => $draw(BitMapBackend::new($path, size).into_drawing_area()),
        }
    }};
}

pub fn render_overlay(plan: &OverlayPlan, path: &Path, options: &RenderOptions) -> Result<(), PlotError> {
    if plan.series.is_empty() && plan.bands.is_empty() {
        return Err(PlotError::Empty("no series or ranges in the window"));
    }
    with_backend!(path, options, |root| draw_overlay(root, plan))
}

pub fn render_bars(plan: &BarPlan, path: &Path, options: &RenderOptions) -> Result<(), PlotError> {
    if plan.is_empty() {
        return Err(PlotError::Empty("no contributions"));
    }
    with_backend!(path, options, |root| draw_bars(root, plan))
}

pub fn render_distributions(
    plan: &DistributionPlan,
    path: &Path,
    options: &RenderOptions,
) -> Result<(), PlotError> {
    if plan.panels.is_empty() {
        return Err(PlotError::Empty("no sensors selected"));
    }
    with_backend!(path, options, |root| draw_distributions(root, plan))
}

fn time_label(plan: &OverlayPlan, x: f64) -> String {
    let ts = plan.window.start + TimeDelta::milliseconds((x * 1000.0) as i64);
    ts.format("%m-%d %H:%M").to_string()
}

fn draw_overlay<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, plan: &OverlayPlan) -> Result<(), PlotError> {
    root.fill(&WHITE)?;
    let root = root.titled(&plan.title, ("sans-serif", 24))?;

    // With no series, one empty panel still shows the bands
    let panels = plan.series.len().max(1);
    let areas = root.split_evenly((panels, 1));
    let x_max = plan.x_extent();

    for (i, area) in areas.iter().enumerate() {
        let series = plan.series.get(i);
        let (lo, hi) = series.and_then(|s| s.value_range()).unwrap_or((0.0, 1.0));
        let pad = ((hi - lo) * 0.05).max(1e-6);
        let (y_lo, y_hi) = (lo - pad, hi + pad);

        let mut chart = ChartBuilder::on(area)
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_max, y_lo..y_hi)?;
        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|x| time_label(plan, *x))
            .y_desc(series.map(|s| s.name.as_str()).unwrap_or(""))
            .draw()?;

        for kind in [BandKind::Label, BandKind::Prediction] {
            let color = match kind {
                BandKind::Label => LABEL_COLOR,
                BandKind::Prediction => PREDICTION_COLOR,
            };
            let rects: Vec<_> = plan
                .bands_of(kind)
                .map(|b| {
                    Rectangle::new(
                        [(plan.x_of(&b.range.start), y_lo), (plan.x_of(&b.range.end), y_hi)],
                        color.mix(0.3).filled(),
                    )
                })
                .collect();
            if rects.is_empty() {
                continue;
            }
            let drawn = chart.draw_series(rects)?;
            if i == 0 {
                drawn
                    .label(kind.legend())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.3).filled()));
            }
        }

        if let Some(series) = series {
            let color = series_color(i);
            chart
                .draw_series(LineSeries::new(
                    series.points.iter().map(|(ts, v)| (plan.x_of(ts), *v)),
                    color.stroke_width(1),
                ))?
                .label(series.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, plan: &BarPlan) -> Result<(), PlotError> {
    root.fill(&WHITE)?;

    let n = plan.bars.len();
    let x_max = (plan.max_value() * 1.1).max(f64::MIN_POSITIVE);

    let mut chart = ChartBuilder::on(&root)
        .caption(&plan.title, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(35)
        .y_label_area_size(160)
        .build_cartesian_2d(0f64..x_max, (0..n).into_segmented())?;

    // Row 0 is the bottom of the chart; the largest bar goes on top
    let labels: Vec<&str> = plan.bars.iter().rev().map(|b| b.label.as_str()).collect();
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|y| match y {
            SegmentValue::CenterOf(row) => labels.get(*row).map(|l| l.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc(if plan.normalized { "share of importance" } else { "importance" })
        .draw()?;

    chart.draw_series(plan.bars.iter().enumerate().map(|(idx, bar)| {
        let color = match bar.kind {
            BarKind::Component => PREDICTION_COLOR,
            BarKind::Sensor => series_color(0),
            BarKind::Unmapped => UNMAPPED_COLOR,
        };
        let row = n - 1 - idx;
        Rectangle::new(
            [(0.0, SegmentValue::Exact(row)), (bar.value, SegmentValue::Exact(row + 1))],
            color.filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn draw_distributions<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    plan: &DistributionPlan,
) -> Result<(), PlotError> {
    root.fill(&WHITE)?;
    let root = root.titled(&plan.title, ("sans-serif", 24))?;
    let areas = root.split_evenly(plan.grid(3));

    for (panel, area) in plan.panels.iter().zip(areas.iter()) {
        let (Some(&lo), Some(&hi)) = (panel.edges.first(), panel.edges.last()) else {
            continue;
        };
        let y_max = (DistributionPlan::y_max(panel) * 1.1).max(f64::MIN_POSITIVE);

        let mut chart = ChartBuilder::on(area)
            .caption(&panel.tag, ("sans-serif", 18))
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(lo..hi, 0f64..y_max)?;
        chart
            .configure_mesh()
            .y_desc(if panel.density { "density" } else { "count" })
            .draw()?;

        for (values, samples, color, label) in [
            (&panel.normal, panel.normal_samples, PREDICTION_COLOR, "normal"),
            (&panel.anomalous, panel.anomalous_samples, LABEL_COLOR, "anomalous"),
        ] {
            chart
                .draw_series(values.iter().enumerate().map(|(b, &h)| {
                    Rectangle::new([(panel.edges[b], 0.0), (panel.edges[b + 1], h)], color.mix(0.45).filled())
                }))?
                .label(format!("{label} (n={samples})"))
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.45).filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
