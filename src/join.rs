use polars::prelude::*;
use tracing::info;

use crate::clean::CleanOrder;
use crate::records::{
    CategoryTranslation, Customer, IntoFrame, OrderItem, Payment, Product, Review, Tables,
    CATEGORY_NAME, CUSTOMER_ID, ORDER_ID, PRODUCT_ID,
};

const ORDER_ROW: &str = "__order_row";
const ITEM_ROW: &str = "__item_row";
const PAYMENT_ROW: &str = "__payment_row";
const REVIEW_ROW: &str = "__review_row";

/// Chains the six left-outer joins, starting from the cleaned orders.
///
/// Orders with several items, payments or reviews fan out into one row per combination.
/// Rows come out in order-table order, and matches for one order in the order they appear
/// in their own tables. Missing keys never match.
pub fn merge(tables: &Tables, orders: &[CleanOrder]) -> PolarsResult<DataFrame> {
    let orders = CleanOrder::frame(orders)?
        .lazy()
        .with_row_index(ORDER_ROW, None);
    let items = OrderItem::frame(&tables.items)?
        .lazy()
        .with_row_index(ITEM_ROW, None);
    let payments = Payment::frame(&tables.payments)?
        .lazy()
        .with_row_index(PAYMENT_ROW, None);
    let reviews = Review::frame(&tables.reviews)?
        .lazy()
        .with_row_index(REVIEW_ROW, None);

    let merged = orders
        .join(
            Customer::frame(&tables.customers)?.lazy(),
            [col(CUSTOMER_ID)],
            [col(CUSTOMER_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            items,
            [col(ORDER_ID)],
            [col(ORDER_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            Product::frame(&tables.products)?.lazy(),
            [col(PRODUCT_ID)],
            [col(PRODUCT_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            CategoryTranslation::frame(&tables.categories)?.lazy(),
            [col(CATEGORY_NAME)],
            [col(CATEGORY_NAME)],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            payments,
            [col(ORDER_ID)],
            [col(ORDER_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            reviews,
            [col(ORDER_ID)],
            [col(ORDER_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .sort(
            [ORDER_ROW, ITEM_ROW, PAYMENT_ROW, REVIEW_ROW],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .drop([ORDER_ROW, ITEM_ROW, PAYMENT_ROW, REVIEW_ROW])
        .collect()?;

    info!(rows = merged.height(), columns = merged.width(), "tables merged");

    Ok(merged)
}
