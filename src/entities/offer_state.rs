//! Offer state entity - Stores the serialized offer record set.
//!
//! The whole SKU → offer record mapping lives in a single row per key as JSON text.
//! Writes always replace the full payload; there is no per-record or delta storage.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Offer state database model - one full snapshot per key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "offer_state")]
pub struct Model {
    /// Snapshot key (e.g., `"offerBuilderState"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// JSON object mapping SKU to offer record
    #[sea_orm(column_type = "Text")]
    pub payload: String,
    /// When this snapshot was last written
    pub updated_at: DateTime,
}

/// `OfferState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
