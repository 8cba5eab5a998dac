use polars::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use std::{fmt::Display, fs::File, path::Path, str::FromStr};

use crate::error::PipelineError;

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Order {
    #[serde(deserialize_with = "trim_string")]
    pub order_id: String,
    #[serde(deserialize_with = "trim_string")]
    pub customer_id: String,
    #[serde(deserialize_with = "trim_optional_string")]
    pub order_status: Option<String>,
    // Kept as raw text; coerced by the cleaning stage.
    #[serde(deserialize_with = "trim_optional_string")]
    pub order_purchase_timestamp: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub order_approved_at: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub order_delivered_carrier_date: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub order_delivered_customer_date: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub order_estimated_delivery_date: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Customer {
    #[serde(deserialize_with = "trim_string")]
    pub customer_id: String,
    #[serde(deserialize_with = "trim_optional_string")]
    pub customer_unique_id: Option<String>,
    // Text, so that leading zeros survive.
    #[serde(deserialize_with = "trim_optional_string")]
    pub customer_zip_code_prefix: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub customer_city: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub customer_state: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OrderItem {
    #[serde(deserialize_with = "trim_string")]
    pub order_id: String,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub order_item_id: Option<u32>,
    #[serde(deserialize_with = "trim_string")]
    pub product_id: String,
    #[serde(deserialize_with = "trim_optional_string")]
    pub seller_id: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub shipping_limit_date: Option<String>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub freight_value: Option<f64>,
}

/// Column names follow the published dataset, misspellings included.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Product {
    #[serde(deserialize_with = "trim_string")]
    pub product_id: String,
    #[serde(deserialize_with = "trim_optional_string")]
    pub product_category_name: Option<String>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub product_name_lenght: Option<f64>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub product_description_lenght: Option<f64>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub product_photos_qty: Option<f64>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub product_weight_g: Option<f64>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub product_length_cm: Option<f64>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub product_height_cm: Option<f64>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub product_width_cm: Option<f64>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CategoryTranslation {
    #[serde(deserialize_with = "trim_string")]
    pub product_category_name: String,
    #[serde(deserialize_with = "trim_optional_string")]
    pub product_category_name_english: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Payment {
    #[serde(deserialize_with = "trim_string")]
    pub order_id: String,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub payment_sequential: Option<u32>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub payment_type: Option<String>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub payment_installments: Option<u32>,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub payment_value: Option<f64>,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Review {
    #[serde(deserialize_with = "trim_optional_string")]
    pub review_id: Option<String>,
    #[serde(deserialize_with = "trim_string")]
    pub order_id: String,
    #[serde(deserialize_with = "trim_and_parse_optional")]
    pub review_score: Option<u8>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub review_comment_title: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub review_comment_message: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub review_creation_date: Option<String>,
    #[serde(deserialize_with = "trim_optional_string")]
    pub review_answer_timestamp: Option<String>,
}

/// The seven input tables, fully materialized.
#[derive(Debug, Default, Clone)]
pub struct Tables {
    pub orders: Vec<Order>,
    pub customers: Vec<Customer>,
    pub items: Vec<OrderItem>,
    pub products: Vec<Product>,
    pub categories: Vec<CategoryTranslation>,
    pub payments: Vec<Payment>,
    pub reviews: Vec<Review>,
}

pub const ORDERS_FILE: &str = "olist_orders_dataset.csv";
pub const CUSTOMERS_FILE: &str = "olist_customers_dataset.csv";
pub const ITEMS_FILE: &str = "olist_order_items_dataset.csv";
pub const PRODUCTS_FILE: &str = "olist_products_dataset.csv";
pub const PAYMENTS_FILE: &str = "olist_order_payments_dataset.csv";
pub const REVIEWS_FILE: &str = "olist_order_reviews_dataset.csv";
pub const CATEGORIES_FILE: &str = "product_category_name_translation.csv";

pub const ORDER_ID: &str = "order_id";
pub const CUSTOMER_ID: &str = "customer_id";
pub const PRODUCT_ID: &str = "product_id";
pub const CATEGORY_NAME: &str = "product_category_name";
pub const CATEGORY_NAME_ENGLISH: &str = "product_category_name_english";
pub const PURCHASE_TIMESTAMP: &str = "order_purchase_timestamp";
pub const PRICE: &str = "price";
pub const FREIGHT_VALUE: &str = "freight_value";
pub const REVIEW_SCORE: &str = "review_score";

/// Loads every input table from `data_dir`. Any missing or malformed file aborts the load.
pub fn load_tables<P: AsRef<Path>>(data_dir: P) -> Result<Tables, PipelineError> {
    let dir = data_dir.as_ref();

    Ok(Tables {
        orders: read_csv(dir.join(ORDERS_FILE))?,
        customers: read_csv(dir.join(CUSTOMERS_FILE))?,
        items: read_csv(dir.join(ITEMS_FILE))?,
        products: read_csv(dir.join(PRODUCTS_FILE))?,
        payments: read_csv(dir.join(PAYMENTS_FILE))?,
        reviews: read_csv(dir.join(REVIEWS_FILE))?,
        categories: read_csv(dir.join(CATEGORIES_FILE))?,
    })
}

pub fn read_csv<T, P>(path: P) -> Result<Vec<T>, PipelineError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| PipelineError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    // The CSV reader is buffered automatically, so it does not needed to
    // wrap rdr in a buffered reader like io::BufReader
    let mut rdr = csv::Reader::from_reader(file);

    let records = rdr
        .deserialize::<T>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| PipelineError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(path = %path.display(), rows = records.len(), "table loaded");

    Ok(records)
}

/// Field values read as missing. This is the set pandas treats as NA by default.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}

/// Builds the typed polars frame for one table. Column names are the dataset headers.
pub trait IntoFrame: Sized {
    fn frame(rows: &[Self]) -> PolarsResult<DataFrame>;
}

pub fn text_series<T>(name: &str, rows: &[T], get: impl Fn(&T) -> Option<&str>) -> Series {
    Series::new(name, rows.iter().map(get).collect::<Vec<_>>())
}

pub fn float_series<T>(name: &str, rows: &[T], get: impl Fn(&T) -> Option<f64>) -> Series {
    Series::new(name, rows.iter().map(get).collect::<Vec<_>>())
}

pub fn uint_series<T>(name: &str, rows: &[T], get: impl Fn(&T) -> Option<u32>) -> Series {
    Series::new(name, rows.iter().map(get).collect::<Vec<_>>())
}

impl IntoFrame for Customer {
    fn frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            text_series(CUSTOMER_ID, rows, |r| Some(r.customer_id.as_str())),
            text_series("customer_unique_id", rows, |r| r.customer_unique_id.as_deref()),
            text_series("customer_zip_code_prefix", rows, |r| {
                r.customer_zip_code_prefix.as_deref()
            }),
            text_series("customer_city", rows, |r| r.customer_city.as_deref()),
            text_series("customer_state", rows, |r| r.customer_state.as_deref()),
        ])
    }
}

impl IntoFrame for OrderItem {
    fn frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            text_series(ORDER_ID, rows, |r| Some(r.order_id.as_str())),
            uint_series("order_item_id", rows, |r| r.order_item_id),
            text_series(PRODUCT_ID, rows, |r| Some(r.product_id.as_str())),
            text_series("seller_id", rows, |r| r.seller_id.as_deref()),
            text_series("shipping_limit_date", rows, |r| r.shipping_limit_date.as_deref()),
            float_series(PRICE, rows, |r| r.price),
            float_series(FREIGHT_VALUE, rows, |r| r.freight_value),
        ])
    }
}

impl IntoFrame for Product {
    fn frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            text_series(PRODUCT_ID, rows, |r| Some(r.product_id.as_str())),
            text_series(CATEGORY_NAME, rows, |r| r.product_category_name.as_deref()),
            float_series("product_name_lenght", rows, |r| r.product_name_lenght),
            float_series("product_description_lenght", rows, |r| {
                r.product_description_lenght
            }),
            float_series("product_photos_qty", rows, |r| r.product_photos_qty),
            float_series("product_weight_g", rows, |r| r.product_weight_g),
            float_series("product_length_cm", rows, |r| r.product_length_cm),
            float_series("product_height_cm", rows, |r| r.product_height_cm),
            float_series("product_width_cm", rows, |r| r.product_width_cm),
        ])
    }
}

impl IntoFrame for CategoryTranslation {
    fn frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            text_series(CATEGORY_NAME, rows, |r| Some(r.product_category_name.as_str())),
            text_series(CATEGORY_NAME_ENGLISH, rows, |r| {
                r.product_category_name_english.as_deref()
            }),
        ])
    }
}

impl IntoFrame for Payment {
    fn frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            text_series(ORDER_ID, rows, |r| Some(r.order_id.as_str())),
            uint_series("payment_sequential", rows, |r| r.payment_sequential),
            text_series("payment_type", rows, |r| r.payment_type.as_deref()),
            uint_series("payment_installments", rows, |r| r.payment_installments),
            float_series("payment_value", rows, |r| r.payment_value),
        ])
    }
}

impl IntoFrame for Review {
    fn frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            text_series("review_id", rows, |r| r.review_id.as_deref()),
            text_series(ORDER_ID, rows, |r| Some(r.order_id.as_str())),
            uint_series(REVIEW_SCORE, rows, |r| r.review_score.map(u32::from)),
            text_series("review_comment_title", rows, |r| r.review_comment_title.as_deref()),
            text_series("review_comment_message", rows, |r| {
                r.review_comment_message.as_deref()
            }),
            text_series("review_creation_date", rows, |r| r.review_creation_date.as_deref()),
            text_series("review_answer_timestamp", rows, |r| {
                r.review_answer_timestamp.as_deref()
            }),
        ])
    }
}

fn trim_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    let trimmed = s.trim();
    if is_missing(trimmed) {
        return Err(serde::de::Error::custom(format!(
            "required key is missing (found {trimmed:?})"
        )));
    }
    Ok(trimmed.to_owned())
}

fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    let trimmed = s.trim();
    if is_missing(trimmed) {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_owned()))
    }
}

fn trim_and_parse_optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let s: String = String::deserialize(deserializer)?;
    let trimmed = s.trim();
    if is_missing(trimmed) {
        Ok(None)
    } else {
        trimmed
            .parse::<T>()
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
