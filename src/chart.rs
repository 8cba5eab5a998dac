use plotters::prelude::*;
use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    error::PipelineError,
    report::{Chart, ChartKind, ReportSink},
};

const SIZE: (u32, u32) = (1000, 500);

/// Writes each chart to `<dir>/<slug>.svg`.
pub struct SvgSink {
    dir: PathBuf,
}

impl SvgSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self, PipelineError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| PipelineError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(SvgSink { dir })
    }

    pub fn path_for(&self, chart: &Chart) -> PathBuf {
        self.dir.join(format!("{}.svg", chart.slug()))
    }
}

impl ReportSink for SvgSink {
    fn render(&mut self, chart: &Chart) -> Result<(), PipelineError> {
        let path = self.path_for(chart);
        if chart.values.is_empty() {
            debug!(title = %chart.title, "nothing to plot");
            return Ok(());
        }

        match chart.kind {
            ChartKind::HorizontalBar => draw_horizontal_bars(&path, chart),
            ChartKind::Line => draw_line(&path, chart),
            ChartKind::Count => draw_columns(&path, chart),
        }
        .map_err(|message| PipelineError::Chart {
            path: path.clone(),
            message,
        })?;

        info!(path = %path.display(), "chart written");
        Ok(())
    }
}

fn upper_bound(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn segment_label(labels: &[String], value: &SegmentValue<i32>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Segment holding the bar of rank `rank` (0 is the largest), counted from the bottom,
/// so that the largest bar is drawn at the top.
fn top_down(n: usize, rank: usize) -> i32 {
    (n - 1 - rank) as i32
}

fn describe<E: Display>(err: E) -> String {
    err.to_string()
}

fn draw_horizontal_bars(path: &Path, chart: &Chart) -> Result<(), String> {
    let count = chart.values.len();
    let n = count as i32;
    let labels: Vec<String> = chart.labels.iter().rev().cloned().collect();
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(describe)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(220)
        .build_cartesian_2d(0.0..upper_bound(&chart.values), (0..n).into_segmented())
        .map_err(describe)?;

    ctx.configure_mesh()
        .disable_y_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .y_labels(chart.values.len())
        .y_label_formatter(&|v| segment_label(&labels, v))
        .draw()
        .map_err(describe)?;

    ctx.draw_series(chart.values.iter().enumerate().map(|(rank, value)| {
        let i = top_down(count, rank);
        Rectangle::new(
            [(0.0, SegmentValue::Exact(i)), (*value, SegmentValue::Exact(i + 1))],
            BLUE.mix(0.7).filled(),
        )
    }))
    .map_err(describe)?;

    root.present().map_err(describe)
}

fn draw_columns(path: &Path, chart: &Chart) -> Result<(), String> {
    let n = chart.values.len() as i32;
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(describe)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..upper_bound(&chart.values))
        .map_err(describe)?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_labels(chart.values.len())
        .x_label_formatter(&|v| segment_label(&chart.labels, v))
        .draw()
        .map_err(describe)?;

    ctx.draw_series(chart.values.iter().enumerate().map(|(i, value)| {
        let i = i as i32;
        Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
            GREEN.mix(0.7).filled(),
        )
    }))
    .map_err(describe)?;

    root.present().map_err(describe)
}

fn draw_line(path: &Path, chart: &Chart) -> Result<(), String> {
    let n = chart.values.len() as i32;
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(describe)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..upper_bound(&chart.values))
        .map_err(describe)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_labels(chart.values.len())
        .x_label_formatter(&|v| segment_label(&chart.labels, v))
        .draw()
        .map_err(describe)?;

    let points: Vec<(SegmentValue<i32>, f64)> = chart
        .values
        .iter()
        .enumerate()
        .map(|(i, value)| (SegmentValue::CenterOf(i as i32), *value))
        .collect();

    ctx.draw_series(LineSeries::new(points.clone(), &RED))
        .map_err(describe)?;
    ctx.draw_series(
        points
            .into_iter()
            .map(|point| Circle::new(point, 4, RED.filled())),
    )
    .map_err(describe)?;

    root.present().map_err(describe)
}
