//! PNG charts of the wait time statistics.
//!
//! Both charts are drawn with `plotters` into an in-memory RGB buffer and encoded with the
//! [`image`] crate.  Categories sit at integer x positions and are labelled through the axis
//! formatter, so boxes and bars can be drawn with plain shapes.

use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use log::{debug, info};
use plotters::prelude::*;

use crate::dataset::{PatientRecord, Priority};
use crate::error::RenderError;
use crate::fonts::{self, CHART_FONT_FAMILY};
use crate::stats::{display_order, BoxSummary, PriorityStatistics};
use crate::text::transliterate;

/// Title of the wait time distribution chart.
pub const DISTRIBUTION_TITLE: &str = "Rozkład czasu oczekiwania według priorytetu";
/// Title of the mean wait time chart.
pub const MEAN_TITLE: &str = "Średni czas oczekiwania pacjentów";

/// Default canvas of the distribution chart in pixels.
pub const DISTRIBUTION_SIZE: (u32, u32) = (1000, 600);
/// Default canvas of the mean wait time chart in pixels.
pub const MEAN_SIZE: (u32, u32) = (800, 500);

const X_AXIS_LABEL: &str = "Priority";
const Y_AXIS_LABEL: &str = "WaitTime";
const BOX_HALF_WIDTH: f64 = 0.4;
const CAP_HALF_WIDTH: f64 = 0.2;

/// Set2 qualitative palette.
const PALETTE: [RGBColor; 3] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
];

fn palette(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

fn chart_error<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Chart(err.to_string())
}

/// One slot of the mean wait time chart.
#[derive(Clone, Debug, PartialEq)]
pub struct MeanBar {
    pub priority: Priority,
    /// `None` when the priority does not occur in the data; the slot is kept but no bar is drawn.
    pub mean: Option<f64>,
}

/// Reindexes group statistics onto the fixed `High, Medium, Low` order.
pub fn mean_bars(stats: &[PriorityStatistics]) -> Vec<MeanBar> {
    Priority::ALL
        .into_iter()
        .map(|priority| MeanBar {
            priority,
            mean: stats
                .iter()
                .find(|group| group.key == priority.as_str())
                .map(|group| group.mean),
        })
        .collect()
}

/// Box plot summaries per priority, known priorities first and any other labels after them.
pub fn distribution_series(records: &[PatientRecord]) -> Vec<BoxSummary> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.priority())
            .or_default()
            .push(record.wait_time());
    }

    let mut labels: Vec<&str> = groups.keys().copied().collect();
    labels.sort_by(|a, b| display_order(a, b));
    labels
        .into_iter()
        .filter_map(|label| BoxSummary::from_values(label, &groups[label]))
        .collect()
}

/// A chart written to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartArtifact {
    pub path: PathBuf,
    pub size: (u32, u32),
}

fn category_label(labels: &[String], x: f64) -> String {
    let index = x.round();
    if (x - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Pads a value range so degenerate or empty data still yields a drawable axis.
fn padded_range(low: f64, high: f64) -> (f64, f64) {
    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }
    let span = high - low;
    let pad = if span > f64::EPSILON { span * 0.05 } else { 1.0 };
    (low - pad, high + pad)
}

fn encode_png(buffer: Vec<u8>, (width, height): (u32, u32)) -> Result<Vec<u8>, RenderError> {
    let image = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| RenderError::Chart("pixel buffer does not match canvas size".into()))?;
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}

/// Bytes needed for an RGB canvas of `size` pixels.
fn rgb_buffer_len((width, height): (u32, u32)) -> usize {
    width as usize * height as usize * 3
}

fn write_png(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    fs::write(path, bytes).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Draws the distribution of wait times per priority as a box plot and returns PNG bytes.
pub fn draw_distribution_chart(
    records: &[PatientRecord],
    (width, height): (u32, u32),
) -> Result<Vec<u8>, RenderError> {
    fonts::register_chart_fonts()?;

    let series = distribution_series(records);
    let labels: Vec<String> = series
        .iter()
        .map(|summary| summary.label.clone())
        .collect();
    let outliers = || {
        series
            .iter()
            .flat_map(|summary| summary.outliers.iter().copied())
    };
    let (y_min, y_max) = padded_range(
        series
            .iter()
            .map(|summary| summary.lower_whisker)
            .chain(outliers())
            .fold(f64::INFINITY, f64::min),
        series
            .iter()
            .map(|summary| summary.upper_whisker)
            .chain(outliers())
            .fold(f64::NEG_INFINITY, f64::max),
    );
    let slots = series.len().max(1);

    let mut buffer = vec![0u8; rgb_buffer_len((width, height))];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let title = transliterate(DISTRIBUTION_TITLE);
        let mut chart = ChartBuilder::on(&root)
            .caption(title.as_str(), (CHART_FONT_FAMILY, 24).into_font())
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(slots as f64 - 0.5), y_min..y_max)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(slots)
            .x_label_formatter(&|x| category_label(&labels, *x))
            .x_desc(X_AXIS_LABEL)
            .y_desc(Y_AXIS_LABEL)
            .draw()
            .map_err(chart_error)?;

        let centre = |index: usize| index as f64;

        chart
            .draw_series(series.iter().enumerate().map(|(i, summary)| {
                Rectangle::new(
                    [
                        (centre(i) - BOX_HALF_WIDTH, summary.q1),
                        (centre(i) + BOX_HALF_WIDTH, summary.q3),
                    ],
                    palette(i).filled(),
                )
            }))
            .map_err(chart_error)?;

        chart
            .draw_series(series.iter().enumerate().map(|(i, summary)| {
                Rectangle::new(
                    [
                        (centre(i) - BOX_HALF_WIDTH, summary.q1),
                        (centre(i) + BOX_HALF_WIDTH, summary.q3),
                    ],
                    BLACK.stroke_width(1),
                )
            }))
            .map_err(chart_error)?;

        chart
            .draw_series(series.iter().enumerate().map(|(i, summary)| {
                PathElement::new(
                    vec![
                        (centre(i) - BOX_HALF_WIDTH, summary.median),
                        (centre(i) + BOX_HALF_WIDTH, summary.median),
                    ],
                    BLACK.stroke_width(2),
                )
            }))
            .map_err(chart_error)?;

        let whiskers = series.iter().enumerate().flat_map(|(i, summary)| {
            let x = centre(i);
            [
                vec![(x, summary.q3), (x, summary.upper_whisker)],
                vec![(x, summary.q1), (x, summary.lower_whisker)],
                vec![
                    (x - CAP_HALF_WIDTH, summary.upper_whisker),
                    (x + CAP_HALF_WIDTH, summary.upper_whisker),
                ],
                vec![
                    (x - CAP_HALF_WIDTH, summary.lower_whisker),
                    (x + CAP_HALF_WIDTH, summary.lower_whisker),
                ],
            ]
        });
        chart
            .draw_series(whiskers.map(|points| PathElement::new(points, BLACK.stroke_width(1))))
            .map_err(chart_error)?;

        chart
            .draw_series(series.iter().enumerate().flat_map(|(i, summary)| {
                summary
                    .outliers
                    .iter()
                    .map(move |value| Circle::new((centre(i), *value), 4, BLACK.stroke_width(1)))
            }))
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    debug!("Drew distribution chart with {} categories", series.len());
    encode_png(buffer, (width, height))
}

/// Draws the mean wait time per priority as a bar chart and returns PNG bytes.
pub fn draw_mean_chart(
    stats: &[PriorityStatistics],
    (width, height): (u32, u32),
) -> Result<Vec<u8>, RenderError> {
    fonts::register_chart_fonts()?;

    let bars = mean_bars(stats);
    let labels: Vec<String> = bars.iter().map(|bar| bar.priority.to_string()).collect();
    let tallest = bars
        .iter()
        .filter_map(|bar| bar.mean)
        .fold(0.0_f64, f64::max);
    let y_max = if tallest > f64::EPSILON {
        tallest * 1.1
    } else {
        1.0
    };

    let mut buffer = vec![0u8; rgb_buffer_len((width, height))];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let title = transliterate(MEAN_TITLE);
        let mut chart = ChartBuilder::on(&root)
            .caption(title.as_str(), (CHART_FONT_FAMILY, 24).into_font())
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(bars.len() as f64 - 0.5), 0.0..y_max)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len())
            .x_label_formatter(&|x| category_label(&labels, *x))
            .x_desc(X_AXIS_LABEL)
            .y_desc(Y_AXIS_LABEL)
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(bars.iter().enumerate().filter_map(|(i, bar)| {
                let mean = bar.mean?;
                let x = i as f64;
                Some(Rectangle::new(
                    [(x - BOX_HALF_WIDTH, 0.0), (x + BOX_HALF_WIDTH, mean)],
                    palette(i).filled(),
                ))
            }))
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    encode_png(buffer, (width, height))
}

/// Renders the distribution chart to `path`, replacing any existing file.
pub fn render_distribution_chart(
    records: &[PatientRecord],
    path: impl AsRef<Path>,
) -> Result<ChartArtifact, RenderError> {
    let path = path.as_ref();
    let bytes = draw_distribution_chart(records, DISTRIBUTION_SIZE)?;
    write_png(path, &bytes)?;
    info!("Wrote distribution chart to {}", path.display());
    Ok(ChartArtifact {
        path: path.to_path_buf(),
        size: DISTRIBUTION_SIZE,
    })
}

/// Renders the mean wait time chart to `path`, replacing any existing file.
pub fn render_mean_chart(
    stats: &[PriorityStatistics],
    path: impl AsRef<Path>,
) -> Result<ChartArtifact, RenderError> {
    let path = path.as_ref();
    let bytes = draw_mean_chart(stats, MEAN_SIZE)?;
    write_png(path, &bytes)?;
    info!("Wrote mean wait time chart to {}", path.display());
    Ok(ChartArtifact {
        path: path.to_path_buf(),
        size: MEAN_SIZE,
    })
}
