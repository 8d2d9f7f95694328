//! Shared test utilities.
//!
//! Helpers for building small hand-made catalogs, offer candidates and an in-memory
//! database with the snapshot table created.

use crate::{
    core::{
        catalog::{self, Group, OfferCandidate, OfferOverlay, OfferStatus, Unit},
        taxonomy::{self, CATEGORIES},
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

fn category_for(model: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|category| taxonomy::models_for(category).contains(&model))
        .copied()
        .unwrap_or("Accessories")
}

/// Builds a raw unit with sensible defaults.
///
/// # Defaults
/// * `capacity`: `"128GB"`
/// * `grade`: `"A+"`
/// * `category`: looked up from the model name
/// * `lock_status`: `"UNLOCKED"` for networked categories
/// * no offer overlay
pub fn unit(
    sku: &str,
    model: &str,
    warehouse: &str,
    color: &str,
    network: &str,
    quantity: u32,
    price: f64,
) -> Unit {
    let category = category_for(model);
    Unit {
        sku: sku.to_string(),
        category: category.to_string(),
        raw_model: model.to_string(),
        manufacturer: taxonomy::manufacturer_for(model).to_string(),
        capacity: "128GB".to_string(),
        grade: "A+".to_string(),
        warehouse: warehouse.to_string(),
        color: color.to_string(),
        network: network.to_string(),
        lock_status: taxonomy::is_networked(category).then(|| "UNLOCKED".to_string()),
        quantity,
        price,
        offer: OfferOverlay::default(),
    }
}

/// Builds a single group holding one variant per SKU, each in a different color.
///
/// `skus` must not be empty.
pub fn group_with_skus(model: &str, skus: &[&str]) -> Group {
    let units = skus.iter().enumerate().map(|(i, sku)| {
        unit(
            sku,
            model,
            "MAIN",
            taxonomy::COLORS[i % taxonomy::COLORS.len()],
            "AT&T",
            10,
            200.0,
        )
    });
    catalog::fold_units(units).remove(0)
}

/// Builds an offer candidate with defaults and the given quantity and list price.
pub fn candidate(sku: &str, quantity: u32, price: f64) -> OfferCandidate {
    OfferCandidate {
        sku: sku.to_string(),
        group_id: "group-0".to_string(),
        manufacturer: "Apple".to_string(),
        model: "iPhone 12 128GB".to_string(),
        grade: "A+".to_string(),
        warehouse: "MAIN".to_string(),
        description: "Blue AT&T".to_string(),
        quantity,
        price,
        offer: OfferOverlay::default(),
        submitted_qty: None,
        submitted_price: None,
    }
}

/// Builds an offer candidate already carrying a seller-side status.
pub fn active_candidate(
    sku: &str,
    status: OfferStatus,
    offer_qty: u32,
    offer_price: f64,
) -> OfferCandidate {
    let mut candidate = candidate(sku, 20, 500.0);
    candidate.offer = OfferOverlay {
        offer_status: Some(status),
        offer_qty,
        offer_price,
        counter_qty: 0,
        counter_price: 0.0,
    };
    candidate
}
