//! Scatter plots of the result tables.
//!
//! Normal rows are drawn blue and flagged rows red, on a white canvas with a
//! black frame. No font backend is compiled in, so plots carry no text.

use std::ops::Range;
use std::path::Path;

use callwatch_core::{CallwatchError, Result, ScoredCall, ScoredCaller};
use plotters::prelude::*;

const SIZE: (u32, u32) = (800, 600);
const POINT_RADIUS: i32 = 4;

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub anomaly: bool,
}

/// calls_per_hour against avg_duration.
pub fn caller_points(rows: &[ScoredCaller]) -> Vec<PlotPoint> {
    rows.iter()
        .map(|r| PlotPoint {
            x: r.calls_per_hour as f64,
            y: r.avg_duration,
            anomaly: r.anomaly,
        })
        .collect()
}

/// CallDuration against Hour.
pub fn call_points(rows: &[ScoredCall]) -> Vec<PlotPoint> {
    rows.iter()
        .map(|r| PlotPoint {
            x: r.call_duration,
            y: f64::from(r.hour),
            anomaly: r.anomaly,
        })
        .collect()
}

/// Padded axis range covering `values`. A single value or an empty set
/// still yields a non-empty range.
fn axis_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

fn plot_err(e: impl std::fmt::Display) -> CallwatchError {
    CallwatchError::Plot(e.to_string())
}

/// Render `points` to a PNG at `path`. Flagged points are drawn last so they
/// stay visible on top of dense normal clusters.
pub fn write_scatter(path: &Path, points: &[PlotPoint]) -> Result<()> {
    let x_range = axis_range(points.iter().map(|p| p.x));
    let y_range = axis_range(points.iter().map(|p| p.y));

    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(plot_err)?;

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(x_range.start, y_range.start), (x_range.end, y_range.end)],
            BLACK.stroke_width(1),
        )))
        .map_err(plot_err)?;

    for (anomaly, color) in [(false, BLUE), (true, RED)] {
        chart
            .draw_series(
                points
                    .iter()
                    .filter(|p| p.anomaly == anomaly)
                    .map(|p| Circle::new((p.x, p.y), POINT_RADIUS, color.mix(0.7).filled())),
            )
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}
