//! Entity module - Contains the SeaORM entity definitions for the database.
//! Only the offer snapshot is persisted; the catalog itself is generated in memory.

pub mod offer_state;

pub use offer_state::{Column as OfferStateColumn, Entity as OfferState, Model as OfferStateModel};
