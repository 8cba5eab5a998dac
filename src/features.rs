use polars::prelude::*;

use crate::records::{FREIGHT_VALUE, PRICE, PURCHASE_TIMESTAMP};

pub const TOTAL_AMOUNT: &str = "TotalAmount";
pub const MONTH: &str = "Month";
pub const YEAR: &str = "Year";

/// Appends `TotalAmount`, `Month` and `Year`. Missing operands stay missing.
pub fn derive_features(merged: DataFrame) -> PolarsResult<DataFrame> {
    merged
        .lazy()
        .with_columns([
            (col(PRICE) + col(FREIGHT_VALUE)).alias(TOTAL_AMOUNT),
            col(PURCHASE_TIMESTAMP)
                .dt()
                .month()
                .cast(DataType::UInt32)
                .alias(MONTH),
            col(PURCHASE_TIMESTAMP).dt().year().alias(YEAR),
        ])
        .collect()
}
