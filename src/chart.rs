//! Trend chart rendering for drop alerts.

use crate::models::Observation;
use anyhow::{bail, Context, Result};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 500;

/// Histories longer than this are stride-sampled before plotting.
const MAX_POINTS: usize = 1200;

/// Renders the full price history as a PNG line chart.
///
/// Deterministic for identical input. An empty history is an error;
/// callers send the alert without a chart instead of failing the
/// cycle. Degenerate ranges (single observation, constant price) are
/// padded so the axes never collapse.
pub fn render(history: &[Observation]) -> Result<Vec<u8>> {
    if history.is_empty() {
        bail!("price history is empty, nothing to plot");
    }

    let sampled = downsample(history);

    let origin_ms = sampled[0].recorded_at.timestamp_millis();
    let points: Vec<(f64, f64)> = sampled
        .iter()
        .map(|o| (((o.recorded_at.timestamp_millis() - origin_ms) as f64) / 1000.0, o.price))
        .collect();

    let mut x_max = points.last().map(|p| p.0).unwrap_or(0.0);
    if x_max <= 0.0 {
        // Single observation: give the time axis a minute of width.
        x_max = 60.0;
    }

    let (mut y_min, mut y_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    } else {
        let pad = (y_max - y_min) * 0.05;
        y_min -= pad;
        y_max += pad;
    }

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(24)
            .build_cartesian_2d(0.0..x_max, y_min..y_max)?;

        chart.draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))?;
        chart.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())))?;

        root.present()?;
    }

    let img = RgbImage::from_raw(WIDTH, HEIGHT, buffer)
        .context("chart buffer has unexpected size")?;

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("failed to encode chart as PNG")?;

    Ok(png)
}

/// Keeps the plot bounded for arbitrarily long histories: every
/// `stride`-th observation plus the most recent one.
fn downsample(history: &[Observation]) -> Vec<&Observation> {
    if history.len() <= MAX_POINTS {
        return history.iter().collect();
    }

    let stride = history.len().div_ceil(MAX_POINTS);
    let mut sampled: Vec<&Observation> = history.iter().step_by(stride).collect();

    if let Some(last) = history.last() {
        if sampled.last().map_or(true, |kept| !std::ptr::eq(*kept, last)) {
            sampled.push(last);
        }
    }

    sampled
}
