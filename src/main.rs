use anyhow::Context;
use clap::Parser;
use std::io::{self, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod chart;
mod clean;
mod config;
mod error;
mod features;
mod join;
mod records;
mod report;
mod writer;

use aggregate::{review_score_counts, sales_by_category, sales_by_customer, sales_by_month, TOP_N};
use chart::SvgSink;
use clean::clean_orders;
use config::Config;
use features::derive_features;
use join::merge;
use polars::prelude::DataFrame;
use records::load_tables;
use report::{
    category_chart, dataset_overview, monthly_chart, review_chart, write_overview, write_preview,
    write_ranking, ConsoleSink, ReportSink,
};
use writer::write_merged;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    run(&config)
}

fn run(config: &Config) -> anyhow::Result<()> {
    let mut tables = load_tables(&config.data_dir)
        .with_context(|| format!("loading datasets from {}", config.data_dir.display()))?;
    info!("all datasets loaded");

    let orders = clean_orders(std::mem::take(&mut tables.orders));
    let mut merged = derive_features(merge(&tables, &orders)?)?;

    let mut out = io::stdout();
    write_overview(&mut out, &dataset_overview(&merged))?;
    write_preview(&mut out, &merged, config.preview_rows)?;

    let mut sink: Box<dyn ReportSink> = match &config.charts_dir {
        Some(dir) => Box::new(SvgSink::new(dir.clone())?),
        None => Box::new(ConsoleSink::stdout()),
    };
    report(&merged, sink.as_mut(), &mut out)?;

    write_merged(&config.output, &mut merged)
        .with_context(|| format!("saving {}", config.output.display()))?;
    info!(path = %config.output.display(), "cleaned dataset saved");

    Ok(())
}

fn report<W: Write>(
    merged: &DataFrame,
    sink: &mut dyn ReportSink,
    out: &mut W,
) -> anyhow::Result<()> {
    let categories = sales_by_category(merged, TOP_N)?;
    write_ranking(out, "Top Product Categories:", &categories)?;
    sink.render(&category_chart(&categories))?;

    sink.render(&monthly_chart(&sales_by_month(merged)?))?;

    let customers = sales_by_customer(merged, TOP_N)?;
    write_ranking(out, "Top 10 Customers:", &customers)?;

    sink.render(&review_chart(&review_score_counts(merged)?))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Chart, ChartKind};
    use std::fs;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingSink {
        charts: Vec<Chart>,
    }

    impl ReportSink for RecordingSink {
        fn render(&mut self, chart: &Chart) -> Result<(), error::PipelineError> {
            self.charts.push(chart.clone());
            Ok(())
        }
    }

    #[test]
    fn report_renders_three_charts_in_order() {
        let tables = load_tables("test-inputs").unwrap();
        let merged =
            derive_features(merge(&tables, &clean_orders(tables.orders.clone())).unwrap()).unwrap();
        let mut sink = RecordingSink::default();
        let mut out = Vec::new();

        report(&merged, &mut sink, &mut out).unwrap();

        let kinds: Vec<ChartKind> = sink.charts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ChartKind::HorizontalBar, ChartKind::Line, ChartKind::Count]
        );
        assert_eq!(sink.charts[1].labels, vec!["7", "8", "10"]);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Top Product Categories:"));
        assert!(text.contains("Top 10 Customers:"));
        assert!(text.contains("computers_accessories"));
    }

    #[test]
    fn run_writes_output_and_charts() {
        let dir = tempdir().unwrap();
        let config = Config {
            data_dir: "test-inputs".into(),
            output: dir.path().join("cleaned_customer_data.csv"),
            charts_dir: Some(dir.path().join("charts")),
            preview_rows: 2,
        };

        run(&config).unwrap();

        let written = fs::read_to_string(&config.output).unwrap();
        assert_eq!(written.lines().count(), 8);
        assert!(dir
            .path()
            .join("charts")
            .join("monthly_sales_trend.svg")
            .exists());
    }

    #[test]
    fn run_aborts_on_missing_data_dir() {
        let dir = tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().join("nowhere"),
            output: dir.path().join("out.csv"),
            charts_dir: None,
            preview_rows: 5,
        };

        let err = run(&config).unwrap_err();

        assert!(err.to_string().contains("loading datasets"));
        assert!(!config.output.exists());
    }
}
