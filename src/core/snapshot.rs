//! Offer snapshot persistence.
//!
//! The whole SKU → record map is stored as one JSON payload in the `offer_state`
//! table. Reading applies the legacy migration: records written before the pin flag
//! existed come back pinned.

use crate::core::offers::{OfferBook, OfferRecord};
use crate::entities::{OfferState, OfferStateColumn, offer_state};
use crate::errors::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Serialises the full record map.
///
/// # Errors
/// Returns an error if serialisation fails.
pub fn encode(book: &OfferBook) -> Result<String> {
    Ok(serde_json::to_string(book.as_map())?)
}

/// Parses a stored record map.
///
/// # Errors
/// Returns an error if the payload is not a JSON object of records.
pub fn decode(payload: &str) -> Result<OfferBook> {
    let records: BTreeMap<String, OfferRecord> = serde_json::from_str(payload)?;
    Ok(OfferBook::from_records(records))
}

/// Loads the snapshot stored under `key`, or an empty book if none exists.
pub async fn load<C>(db: &C, key: &str) -> Result<OfferBook>
where
    C: ConnectionTrait,
{
    let stored = OfferState::find()
        .filter(OfferStateColumn::Key.eq(key))
        .one(db)
        .await?;

    match stored {
        Some(row) => {
            let book = decode(&row.payload)?;
            info!("Loaded {} offer records from snapshot '{key}'", book.len());
            Ok(book)
        }
        None => {
            debug!("No offer snapshot stored under '{key}'");
            Ok(OfferBook::default())
        }
    }
}

/// Replaces the snapshot stored under `key` with `book`.
pub async fn save<C>(db: &C, key: &str, book: &OfferBook) -> Result<()>
where
    C: ConnectionTrait,
{
    let payload = encode(book)?;
    let now = Utc::now().naive_utc();

    let existing = OfferState::find()
        .filter(OfferStateColumn::Key.eq(key))
        .one(db)
        .await?;

    if let Some(row) = existing {
        let mut active_model: offer_state::ActiveModel = row.into();
        active_model.payload = Set(payload);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_row = offer_state::ActiveModel {
            key: Set(key.to_string()),
            payload: Set(payload),
            updated_at: Set(now),
        };
        new_row.insert(db).await?;
    }

    debug!("Saved {} offer records under '{key}'", book.len());
    Ok(())
}
