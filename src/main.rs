#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use stock_offers::config::{self, database};
use stock_offers::core::cart;
use stock_offers::core::catalog::OfferCandidate;
use stock_offers::core::debounce::Debouncer;
use stock_offers::core::listing::StockListing;
use stock_offers::core::offer_store::OfferStore;
use stock_offers::core::offers::{OfferView, PriceFeedback};
use stock_offers::core::query::Dimension;
use stock_offers::core::service::CatalogService;
use stock_offers::errors::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; DATABASE_URL may also be set externally
    dotenv().ok();

    // 3. Load application settings, falling back to defaults
    let app_config = config::settings::load_config_or_default("config.toml")?;

    // 4. Open the database and make sure the snapshot table exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Generate the catalog and hydrate the offer store
    let service = CatalogService::from_config(&app_config);
    let store = OfferStore::init(db, &app_config.offers).await?;
    info!(
        "Offer store ready: {} pinned, {} active",
        store.pinned_count().await,
        store.active_count().await
    );

    let mut changes = store.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => debug!(
                    kind = ?change.kind,
                    skus = change.skus.len(),
                    pinned = change.pinned_count,
                    active = change.active_count,
                    "Offer bar update"
                ),
                Err(RecvError::Lagged(missed)) => warn!("Missed {missed} offer updates"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 6. Browse: first page, then narrow by category and manufacturer
    let mut listing = StockListing::new(app_config.query.page_size);
    listing.refresh(&service).await?;
    info!(
        "Catalog: {} groups, {} in stock",
        listing.records_total(),
        listing.records_filtered()
    );

    listing.toggle_filter(Dimension::Category, "Phones");
    listing.toggle_filter(Dimension::Manufacturer, "Apple");
    let debouncer = Debouncer::new(app_config.query.debounce());
    if let Some(term) = debouncer.settle("iphone").await {
        listing.set_search(term);
    }
    listing.refresh(&service).await?;
    info!(
        "Apple phones matching 'iphone': {} groups",
        listing.records_filtered()
    );
    for facet in &listing.facets().grade {
        debug!("  grade {}: {}", facet.label, facet.count);
    }

    // 7. Pin the first group's variants and price one of them under list
    if let Some(group) = listing.rows().first().cloned() {
        store.toggle_group(&group).await?;
        info!(
            "Pinned {} ({:?})",
            group.model,
            store.group_state(&group).await
        );

        if let Some(variant) = group.pinnable_variants().next() {
            let candidate = OfferCandidate::new(&group, variant);
            let offer_price = format!("{:.2}", (candidate.price - 10.0).max(1.0));
            if let Some(feedback) = store.update_item(&candidate.sku, "2", &offer_price).await? {
                if let PriceFeedback::OfferIn { savings } = feedback.price_feedback {
                    info!("Offer on {} saves ${savings:.2} off list", candidate.sku);
                }
            }
        }
    }

    let summary = store.book().await.summary(OfferView::Pinned);
    info!(
        "Pinned total ${:.2}, {} ready to place",
        summary.total_value, summary.actionable_count
    );
    store.place_offers().await?;

    // 8. Demo reset: seed live offers in the catalog and import them
    let seeded = service
        .reset_demo_offers(app_config.offers.demo_offer_count)
        .await;
    store.clear_all().await?;
    store.import_active(&seeded).await?;

    let countered: Vec<String> = seeded
        .iter()
        .filter(|c| c.offer.counter_qty > 0)
        .take(3)
        .map(|c| c.sku.clone())
        .collect();
    for sku in &countered {
        store.accept_counter(sku).await?;
    }

    for warehouse in cart::cart_by_warehouse(&store.book().await) {
        info!(
            "Cart {}: {} SKUs, {} units, ${:.2}",
            warehouse.warehouse, warehouse.unique_skus, warehouse.total_qty, warehouse.total_value
        );
    }

    let checked_out = store.checkout(&countered).await?;
    info!(
        "Session done: {checked_out} items checked out, {} active offers remain",
        store.active_count().await
    );

    drop(store);
    if let Err(e) = watcher.await {
        warn!("Offer watcher ended abnormally: {e}");
    }

    Ok(())
}
