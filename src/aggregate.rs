use polars::prelude::*;

use crate::features::{MONTH, TOTAL_AMOUNT};
use crate::records::{CATEGORY_NAME_ENGLISH, CUSTOMER_ID, ORDER_ID, REVIEW_SCORE};

pub const TOP_N: usize = 10;

const REVIEWS: &str = "reviews";

pub fn sales_by_category(merged: &DataFrame, limit: usize) -> PolarsResult<Vec<(String, f64)>> {
    let top = top_n(sum_by(merged, CATEGORY_NAME_ENGLISH), CATEGORY_NAME_ENGLISH, limit).collect()?;
    labelled_totals(&top, CATEGORY_NAME_ENGLISH)
}

/// Every month present, in calendar order.
pub fn sales_by_month(merged: &DataFrame) -> PolarsResult<Vec<(u32, f64)>> {
    let months = sum_by(merged, MONTH)
        .sort([MONTH], SortMultipleOptions::default())
        .collect()?;

    let keys = months.column(MONTH)?.u32()?;
    let totals = months.column(TOTAL_AMOUNT)?.f64()?;
    Ok(keys
        .into_iter()
        .zip(totals.into_iter())
        .filter_map(|(month, total)| Some((month?, total.unwrap_or(0.0))))
        .collect())
}

pub fn sales_by_customer(merged: &DataFrame, limit: usize) -> PolarsResult<Vec<(String, f64)>> {
    let top = top_n(sum_by(merged, CUSTOMER_ID), CUSTOMER_ID, limit).collect()?;
    labelled_totals(&top, CUSTOMER_ID)
}

pub fn review_score_counts(merged: &DataFrame) -> PolarsResult<Vec<(u32, usize)>> {
    let counts = merged
        .clone()
        .lazy()
        .filter(col(REVIEW_SCORE).is_not_null())
        .group_by([col(REVIEW_SCORE)])
        .agg([col(ORDER_ID).count().cast(DataType::UInt64).alias(REVIEWS)])
        .sort([REVIEW_SCORE], SortMultipleOptions::default())
        .collect()?;

    let scores = counts.column(REVIEW_SCORE)?.u32()?;
    let totals = counts.column(REVIEWS)?.u64()?;
    Ok(scores
        .into_iter()
        .zip(totals.into_iter())
        .filter_map(|(score, n)| Some((score?, n? as usize)))
        .collect())
}

/// Sums `TotalAmount` per key. Rows with a missing key are skipped; a group whose amounts
/// are all missing sums to zero.
fn sum_by(merged: &DataFrame, key: &str) -> LazyFrame {
    merged
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([col(TOTAL_AMOUNT).sum()])
}

/// Largest totals first, ties by key so the output is stable.
fn top_n(sums: LazyFrame, key: &str, limit: usize) -> LazyFrame {
    sums.sort(
        [TOTAL_AMOUNT, key],
        SortMultipleOptions::default().with_order_descending_multi([true, false]),
    )
    .limit(limit as IdxSize)
}

fn labelled_totals(top: &DataFrame, key: &str) -> PolarsResult<Vec<(String, f64)>> {
    let keys = top.column(key)?.str()?;
    let totals = top.column(TOTAL_AMOUNT)?.f64()?;
    Ok(keys
        .into_iter()
        .zip(totals.into_iter())
        .filter_map(|(k, total)| Some((k?.to_owned(), total.unwrap_or(0.0))))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_orders;
    use crate::features::derive_features;
    use crate::join::merge;
    use crate::records::load_tables;

    fn fixture() -> DataFrame {
        let tables = load_tables("test-inputs").unwrap();
        derive_features(merge(&tables, &clean_orders(tables.orders.clone())).unwrap()).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn synthetic(customers: &[&str], categories: &[&str], totals: &[f64]) -> DataFrame {
        df!(
            CUSTOMER_ID => customers,
            CATEGORY_NAME_ENGLISH => categories,
            TOTAL_AMOUNT => totals
        )
        .unwrap()
    }

    #[test]
    fn category_sales() {
        let sales = sales_by_category(&fixture(), TOP_N).unwrap();

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].0, "computers_accessories");
        assert_close(sales[0].1, 110.0);
        assert_eq!(sales[1].0, "health_beauty");
        assert_close(sales[1].1, 29.99 + 8.72);
    }

    #[test]
    fn monthly_sales_in_calendar_order() {
        let sales = sales_by_month(&fixture()).unwrap();
        let months: Vec<u32> = sales.iter().map(|(m, _)| *m).collect();

        assert_eq!(months, vec![7, 8, 10]);
        // o2 fans out over two payments, so its single item counts twice.
        assert_close(sales[0].1, 110.0);
        assert_close(sales[1].1, 22.0);
        assert_close(sales[2].1, 29.99 + 8.72 + 110.0);
    }

    #[test]
    fn customer_sales() {
        let sales = sales_by_customer(&fixture(), TOP_N).unwrap();
        let customers: Vec<&str> = sales.iter().map(|(c, _)| c.as_str()).collect();

        assert_eq!(customers, vec!["c1", "c2", "c3", "c4"]);
        assert_close(sales[0].1, 29.99 + 8.72 + 110.0);
        assert_close(sales[3].1, 0.0);
    }

    #[test]
    fn review_distribution() {
        let counts = review_score_counts(&fixture()).unwrap();

        assert_eq!(counts, vec![(1, 1), (3, 1), (4, 2), (5, 2)]);
    }

    #[test]
    fn top_ten_is_sorted_and_bounded() {
        let customers: Vec<String> = (0..15).map(|i| format!("c{i:02}")).collect();
        let categories: Vec<String> = (0..15).map(|i| format!("cat{i:02}")).collect();
        let totals: Vec<f64> = (0..15).map(|i| f64::from(i) * 3.5).collect();
        let merged = df!(
            CUSTOMER_ID => customers,
            CATEGORY_NAME_ENGLISH => categories,
            TOTAL_AMOUNT => totals
        )
        .unwrap();

        for sales in [
            sales_by_category(&merged, TOP_N).unwrap(),
            sales_by_customer(&merged, TOP_N).unwrap(),
        ] {
            assert_eq!(sales.len(), TOP_N);
            assert!(sales.windows(2).all(|w| w[0].1 > w[1].1));
            assert_close(sales[0].1, 14.0 * 3.5);
        }
    }

    #[test]
    fn ties_break_by_key() {
        let merged = synthetic(&["b", "a"], &["toys", "garden"], &[5.0, 5.0]);

        let sales = sales_by_customer(&merged, TOP_N).unwrap();

        assert_eq!(sales[0].0, "a");
        assert_eq!(sales[1].0, "b");
    }

    #[test]
    fn rows_of_one_key_are_summed() {
        let merged = synthetic(&["a", "b", "a"], &["toys", "toys", "garden"], &[1.5, 2.0, 4.0]);

        let sales = sales_by_customer(&merged, TOP_N).unwrap();

        assert_eq!(sales, vec![("a".to_owned(), 5.5), ("b".to_owned(), 2.0)]);
    }
}
