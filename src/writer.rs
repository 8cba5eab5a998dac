use polars::prelude::*;
use std::{fs::File, path::Path};
use tracing::info;

use crate::{clean::TIMESTAMP_FORMAT, error::PipelineError};

/// Writes the merged table with a header row and no index column. Missing values are
/// written as empty fields.
pub fn write_merged<P: AsRef<Path>>(path: P, merged: &mut DataFrame) -> Result<(), PipelineError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    CsvWriter::new(file)
        .include_header(true)
        .with_datetime_format(Some(TIMESTAMP_FORMAT.to_owned()))
        .finish(merged)
        .map_err(|source| PipelineError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    info!(path = %path.display(), rows = merged.height(), "merged table written");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_orders;
    use crate::features::derive_features;
    use crate::join::merge;
    use crate::records::load_tables;
    use std::fs;
    use tempfile::tempdir;

    fn fixture() -> DataFrame {
        let tables = load_tables("test-inputs").unwrap();
        derive_features(merge(&tables, &clean_orders(tables.orders.clone())).unwrap()).unwrap()
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cleaned_customer_data.csv");
        let mut merged = fixture();

        write_merged(&path, &mut merged).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.len(), merged.width());
        assert_eq!(&headers[0], "order_id");
        assert_eq!(&headers[headers.len() - 3], "TotalAmount");
        assert_eq!(&headers[headers.len() - 1], "Year");

        let records: Vec<csv::StringRecord> = rdr.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 7);
        assert_eq!(&records[0][0], "o1");
        assert_eq!(&records[0][3], "2017-10-02 10:56:33");
        assert_eq!(&records[0][headers.len() - 2], "10");
        assert_eq!(&records[0][headers.len() - 1], "2017");
    }

    #[test]
    fn missing_values_are_empty_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_merged(&path, &mut fixture()).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let english = rdr
            .headers()
            .unwrap()
            .iter()
            .position(|h| h == "product_category_name_english")
            .unwrap();
        let o2 = rdr
            .records()
            .map(Result::unwrap)
            .find(|r| &r[0] == "o2")
            .unwrap();
        assert_eq!(&o2[english], "");
        assert_eq!(&o2[3], "2018-07-24 20:41:37");
    }

    #[test]
    fn quoted_fields_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_merged(&path, &mut fixture()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"chegou antes, muito bom, recomendo\""));
        assert!(text.contains(",01310,"));
    }

    #[test]
    fn rewriting_is_byte_identical() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");

        write_merged(&first, &mut fixture()).unwrap();
        write_merged(&second, &mut fixture()).unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.csv");

        let err = write_merged(&path, &mut fixture()).unwrap_err();

        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
