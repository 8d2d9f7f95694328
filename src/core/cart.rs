//! Cart views over the offer book.
//!
//! Records with status `InCart` form the cart. Lines are priced from the submitted
//! snapshot when it is set, otherwise from the working values.

use crate::core::catalog::{OfferStatus, round_cents};
use crate::core::offers::{OfferBook, OfferRecord};
use serde::Serialize;

/// Bucket name for records without a warehouse.
pub const UNASSIGNED_WAREHOUSE: &str = "Unassigned";

/// One SKU in the cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    /// Stock-keeping unit
    pub sku: String,
    /// Display model
    pub model: String,
    /// Variant description
    pub description: String,
    /// Committed quantity
    pub qty: u32,
    /// Committed unit price
    pub price: f64,
    /// `qty * price`
    pub line_total: f64,
}

impl CartLine {
    fn from_record(record: &OfferRecord) -> Self {
        let qty = if record.submitted_qty > 0 {
            record.submitted_qty
        } else {
            record.qty
        };
        let price = if record.submitted_price > 0.0 {
            record.submitted_price
        } else {
            record.working_price()
        };
        Self {
            sku: record.sku.clone(),
            model: record.model.clone(),
            description: record.description.clone(),
            qty,
            price,
            line_total: round_cents(price * f64::from(qty)),
        }
    }
}

/// Cart lines stocked at one warehouse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseCart {
    /// Warehouse name, or [`UNASSIGNED_WAREHOUSE`]
    pub warehouse: String,
    /// Lines in SKU order
    pub lines: Vec<CartLine>,
    /// Number of distinct SKUs
    pub unique_skus: usize,
    /// Sum of line quantities
    pub total_qty: u32,
    /// Sum of line totals
    pub total_value: f64,
}

/// Quantity and value of a selection of cart lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SelectionTotals {
    /// Sum of selected quantities
    pub qty: u32,
    /// Sum of selected line totals
    pub value: f64,
}

fn cart_records(book: &OfferBook) -> impl Iterator<Item = &OfferRecord> {
    book.as_map()
        .values()
        .filter(|r| r.offer_status == Some(OfferStatus::InCart))
}

fn warehouse_of(record: &OfferRecord) -> &str {
    if record.warehouse.is_empty() {
        UNASSIGNED_WAREHOUSE
    } else {
        &record.warehouse
    }
}

/// Every cart line, in SKU order.
#[must_use]
pub fn cart_lines(book: &OfferBook) -> Vec<CartLine> {
    cart_records(book).map(CartLine::from_record).collect()
}

/// Cart lines bucketed by warehouse, in order of first appearance.
#[must_use]
pub fn cart_by_warehouse(book: &OfferBook) -> Vec<WarehouseCart> {
    let mut carts: Vec<WarehouseCart> = Vec::new();
    for record in cart_records(book) {
        let warehouse = warehouse_of(record);
        let line = CartLine::from_record(record);
        let index = if let Some(index) = carts.iter().position(|c| c.warehouse == warehouse) {
            index
        } else {
            carts.push(WarehouseCart {
                warehouse: warehouse.to_string(),
                lines: Vec::new(),
                unique_skus: 0,
                total_qty: 0,
                total_value: 0.0,
            });
            carts.len() - 1
        };
        let cart = &mut carts[index];
        cart.unique_skus += 1;
        cart.total_qty = cart.total_qty.saturating_add(line.qty);
        cart.total_value = round_cents(cart.total_value + line.line_total);
        cart.lines.push(line);
    }
    carts
}

/// Totals for the selected SKUs within one warehouse's cart.
#[must_use]
pub fn selection_totals(book: &OfferBook, warehouse: &str, skus: &[String]) -> SelectionTotals {
    cart_records(book)
        .filter(|r| warehouse_of(r) == warehouse && skus.contains(&r.sku))
        .map(CartLine::from_record)
        .fold(SelectionTotals::default(), |totals, line| SelectionTotals {
            qty: totals.qty.saturating_add(line.qty),
            value: round_cents(totals.value + line.line_total),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::offers::CartPricing;
    use crate::test_utils::{active_candidate, candidate};

    fn book() -> OfferBook {
        let mut book = OfferBook::default();
        let mut elsewhere = active_candidate("SKU-3", OfferStatus::Pending, 1, 300.0);
        elsewhere.warehouse = "DLS".to_string();
        let mut nowhere = active_candidate("SKU-4", OfferStatus::Pending, 1, 100.0);
        nowhere.warehouse = String::new();
        book.import_active(&[
            active_candidate("SKU-1", OfferStatus::Accepted, 2, 450.0),
            active_candidate("SKU-2", OfferStatus::Pending, 3, 400.0),
            elsewhere,
            nowhere,
            active_candidate("SKU-5", OfferStatus::Rejected, 1, 50.0),
        ]);
        book.toggle_pin(&candidate("SKU-6", 4, 90.0));
        for sku in ["SKU-1", "SKU-2", "SKU-3", "SKU-4"] {
            book.add_to_cart(sku, CartPricing::Submitted);
        }
        book
    }

    #[test]
    fn test_cart_groups_by_warehouse() {
        let carts = cart_by_warehouse(&book());
        assert_eq!(carts.len(), 3);

        let main = &carts[0];
        assert_eq!(main.warehouse, "MAIN");
        assert_eq!(main.unique_skus, 2);
        assert_eq!(main.total_qty, 5);
        assert_eq!(main.total_value, 2100.0);

        assert_eq!(carts[1].warehouse, "DLS");
        assert_eq!(carts[2].warehouse, UNASSIGNED_WAREHOUSE);
        assert_eq!(carts[2].total_value, 100.0);
    }

    #[test]
    fn test_list_pricing_keeps_working_quantity() {
        let mut book = OfferBook::default();
        book.toggle_pin(&candidate("SKU-1", 4, 90.0));
        book.update_item("SKU-1", "2", "80");
        book.add_to_cart("SKU-1", CartPricing::List);
        let lines = cart_lines(&book);
        assert_eq!(lines.len(), 1);
        assert_eq!((lines[0].qty, lines[0].price), (2, 90.0));
        assert_eq!(lines[0].line_total, 180.0);
    }

    #[test]
    fn test_lines_fall_back_to_working_values() {
        let record: OfferRecord = serde_json::from_str(
            r#"{"sku": "SKU-1", "qty": 3, "price": 25.5, "offerStatus": "In Cart", "warehouse": "NYC"}"#,
        )
        .unwrap();
        let book = OfferBook::from_records([("SKU-1".to_string(), record)].into_iter().collect());
        let lines = cart_lines(&book);
        assert_eq!((lines[0].qty, lines[0].price), (3, 25.5));
        assert_eq!(lines[0].line_total, 76.5);
        assert_eq!(cart_by_warehouse(&book)[0].warehouse, "NYC");
    }

    #[test]
    fn test_huge_quantities_saturate_totals() {
        let mut book = OfferBook::default();
        for sku in ["SKU-1", "SKU-2"] {
            book.toggle_pin(&candidate(sku, 4, 90.0));
            book.update_item(sku, "99999999999", "80");
            book.add_to_cart(sku, CartPricing::List);
        }

        let carts = cart_by_warehouse(&book);
        assert_eq!(carts.len(), 1);
        assert_eq!(carts[0].unique_skus, 2);
        assert_eq!(carts[0].total_qty, u32::MAX);

        let both = vec!["SKU-1".to_string(), "SKU-2".to_string()];
        assert_eq!(selection_totals(&book, "MAIN", &both).qty, u32::MAX);
    }

    #[test]
    fn test_selection_totals() {
        let book = book();
        let selected = vec!["SKU-1".to_string(), "SKU-3".to_string(), "SKU-5".to_string()];
        let totals = selection_totals(&book, "MAIN", &selected);
        assert_eq!(totals.qty, 2);
        assert_eq!(totals.value, 900.0);

        let none = selection_totals(&book, "NYC", &selected);
        assert_eq!(none, SelectionTotals::default());
    }
}
