use polars::prelude::*;
use std::{
    io::{self, Write},
    path::PathBuf,
};

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    HorizontalBar,
    Line,
    Count,
}

/// Labels and values handed to a sink, with the presentation text around them.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Chart {
    /// File-name friendly version of the title.
    pub fn slug(&self) -> String {
        self.title
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("_")
    }
}

pub trait ReportSink {
    fn render(&mut self, chart: &Chart) -> Result<(), PipelineError>;
}

pub fn category_chart(sales: &[(String, f64)]) -> Chart {
    Chart {
        kind: ChartKind::HorizontalBar,
        title: "Top 10 Product Categories by Sales".to_owned(),
        x_label: "Total Sales".to_owned(),
        y_label: "Category".to_owned(),
        labels: sales.iter().map(|(k, _)| k.clone()).collect(),
        values: sales.iter().map(|(_, v)| *v).collect(),
    }
}

pub fn monthly_chart(sales: &[(u32, f64)]) -> Chart {
    Chart {
        kind: ChartKind::Line,
        title: "Monthly Sales Trend".to_owned(),
        x_label: "Month".to_owned(),
        y_label: "Total Sales".to_owned(),
        labels: sales.iter().map(|(m, _)| m.to_string()).collect(),
        values: sales.iter().map(|(_, v)| *v).collect(),
    }
}

pub fn review_chart(counts: &[(u32, usize)]) -> Chart {
    Chart {
        kind: ChartKind::Count,
        title: "Customer Review Distribution".to_owned(),
        x_label: "Review Score".to_owned(),
        y_label: "Count".to_owned(),
        labels: counts.iter().map(|(s, _)| s.to_string()).collect(),
        values: counts.iter().map(|(_, c)| *c as f64).collect(),
    }
}

const BAR_WIDTH: usize = 40;

/// Renders charts as text bars.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        ConsoleSink { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        ConsoleSink { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_chart(&mut self, chart: &Chart) -> io::Result<()> {
        writeln!(self.out, "\n{}", chart.title)?;
        writeln!(self.out, "{} by {}", chart.x_label, chart.y_label)?;

        let label_width = chart
            .labels
            .iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0);
        let max = chart.values.iter().cloned().fold(0.0_f64, f64::max);

        for (label, value) in chart.labels.iter().zip(&chart.values) {
            let filled = if max > 0.0 {
                ((value / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            let glyph = match chart.kind {
                ChartKind::HorizontalBar => "#",
                ChartKind::Line => "*",
                ChartKind::Count => "=",
            };
            match chart.kind {
                ChartKind::Count => writeln!(
                    self.out,
                    "{label:>label_width$} | {} {value}",
                    glyph.repeat(filled)
                )?,
                _ => writeln!(
                    self.out,
                    "{label:>label_width$} | {} {value:.2}",
                    glyph.repeat(filled)
                )?,
            }
        }

        self.out.flush()
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn render(&mut self, chart: &Chart) -> Result<(), PipelineError> {
        self.write_chart(chart).map_err(|source| PipelineError::Io {
            path: PathBuf::from("<console>"),
            source,
        })
    }
}

/// Shape of the merged table, plus how many values each column actually holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub non_missing: Vec<(String, usize)>,
}

pub fn dataset_overview(merged: &DataFrame) -> Overview {
    Overview {
        rows: merged.height(),
        columns: merged.width(),
        non_missing: merged
            .get_columns()
            .iter()
            .map(|s| (s.name().to_owned(), s.len() - s.null_count()))
            .collect(),
    }
}

pub fn write_overview<W: Write>(out: &mut W, overview: &Overview) -> io::Result<()> {
    writeln!(out, "\nDataset Info:")?;
    writeln!(
        out,
        "{} rows x {} columns",
        overview.rows, overview.columns
    )?;
    let width = overview
        .non_missing
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (index, (name, count)) in overview.non_missing.iter().enumerate() {
        writeln!(out, "{index:>3}  {name:<width$}  {count} non-missing")?;
    }
    Ok(())
}

/// Prints the first `n` rows, one `column: value` line per field.
pub fn write_preview<W: Write>(out: &mut W, merged: &DataFrame, n: usize) -> io::Result<()> {
    writeln!(out, "\nSample Data:")?;
    let head = merged.head(Some(n));
    for index in 0..head.height() {
        writeln!(out, "[{index}]")?;
        for column in head.get_columns() {
            let shown = match column.get(index).map_err(io::Error::other)? {
                AnyValue::Null => "<missing>".to_owned(),
                AnyValue::String(s) => s.to_owned(),
                value => value.to_string(),
            };
            writeln!(out, "  {}: {shown}", column.name())?;
        }
    }
    Ok(())
}

pub fn write_ranking<W: Write>(
    out: &mut W,
    title: &str,
    ranking: &[(String, f64)],
) -> io::Result<()> {
    writeln!(out, "\n{title}")?;
    let width = ranking
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0);
    for (key, total) in ranking {
        writeln!(out, "{key:<width$}  {total:>12.2}")?;
    }
    Ok(())
}
