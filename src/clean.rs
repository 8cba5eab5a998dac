use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, warn};

use crate::records::{text_series, IntoFrame, Order, CUSTOMER_ID, ORDER_ID, PURCHASE_TIMESTAMP};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// An order whose purchase timestamp has been coerced to a date/time.
#[derive(Debug, PartialEq, Clone)]
pub struct CleanOrder {
    pub order: Order,
    pub purchased_at: Option<NaiveDateTime>,
}

/// Coerces every purchase timestamp. Values that do not parse become missing instead of
/// failing the run.
pub fn clean_orders(orders: Vec<Order>) -> Vec<CleanOrder> {
    let mut coerced = 0usize;

    let cleaned: Vec<CleanOrder> = orders
        .into_iter()
        .map(|order| {
            let purchased_at = order
                .order_purchase_timestamp
                .as_deref()
                .and_then(parse_timestamp);

            if purchased_at.is_none() {
                coerced += 1;
                debug!(
                    order_id = %order.order_id,
                    raw = ?order.order_purchase_timestamp,
                    "purchase timestamp coerced to missing"
                );
            }

            CleanOrder {
                order,
                purchased_at,
            }
        })
        .collect();

    if coerced > 0 {
        warn!(coerced, "purchase timestamps could not be parsed");
    }

    cleaned
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl IntoFrame for CleanOrder {
    fn frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        let purchased_at = Series::new(
            PURCHASE_TIMESTAMP,
            rows.iter()
                .map(|r| r.purchased_at.map(|ts| ts.and_utc().timestamp_millis()))
                .collect::<Vec<_>>(),
        )
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        DataFrame::new(vec![
            text_series(ORDER_ID, rows, |r| Some(r.order.order_id.as_str())),
            text_series(CUSTOMER_ID, rows, |r| Some(r.order.customer_id.as_str())),
            text_series("order_status", rows, |r| r.order.order_status.as_deref()),
            purchased_at,
            text_series("order_approved_at", rows, |r| r.order.order_approved_at.as_deref()),
            text_series("order_delivered_carrier_date", rows, |r| {
                r.order.order_delivered_carrier_date.as_deref()
            }),
            text_series("order_delivered_customer_date", rows, |r| {
                r.order.order_delivered_customer_date.as_deref()
            }),
            text_series("order_estimated_delivery_date", rows, |r| {
                r.order.order_estimated_delivery_date.as_deref()
            }),
        ])
    }
}
