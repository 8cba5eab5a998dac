use clap::Parser;
use std::path::PathBuf;

/// Sales analysis over the Olist e-commerce order dataset.
#[derive(Parser, Debug, Clone)]
#[command(name = "olist-sales", version, about)]
pub struct Config {
    /// Directory holding the seven olist CSV files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Where the merged table is written
    #[arg(short, long, default_value = "cleaned_customer_data.csv")]
    pub output: PathBuf,

    /// Write charts as SVG files into this directory instead of drawing them on the console
    #[arg(long)]
    pub charts_dir: Option<PathBuf>,

    /// Number of merged rows shown in the sample preview
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,
}
