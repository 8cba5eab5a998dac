use polars::prelude::PolarsError;
use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed csv in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed writing csv to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed rendering chart {path}: {message}")]
    Chart { path: PathBuf, message: String },
}
