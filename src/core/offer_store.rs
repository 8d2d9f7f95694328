//! Persistent, observable offer store.
//!
//! Wraps an [`OfferBook`] with snapshot persistence and change notification. Each
//! operation runs against a copy of the book; the copy is persisted first and only then
//! swapped in and announced, so a failed write leaves the previous state untouched.
//! Operations that change nothing are neither persisted nor announced.

use crate::config::OfferSettings;
use crate::core::catalog::{Group, OfferCandidate};
use crate::core::offers::{CartPricing, GroupPinState, ItemFeedback, OfferBook};
use crate::core::snapshot;
use crate::errors::Result;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, instrument, trace};

/// What kind of operation produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    /// A single SKU was pinned or unpinned
    Pinned,
    /// A group's pinnable variants were toggled together
    GroupToggled,
    /// Live offers were imported from the catalog
    Imported,
    /// Working values were edited
    Edited,
    /// Actionable records were submitted
    Placed,
    /// A counter offer was accepted
    CounterAccepted,
    /// A record moved into the cart
    AddedToCart,
    /// Records were deleted
    Removed,
    /// The selection or the whole store was cleared
    Cleared,
    /// Cart records were checked out
    CheckedOut,
}

/// Notification sent after every committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferChange {
    /// Operation that produced the change
    pub kind: ChangeKind,
    /// SKUs whose record was added, modified or removed
    pub skus: Vec<String>,
    /// Pinned records after the change
    pub pinned_count: usize,
    /// Records past `Draft` after the change
    pub active_count: usize,
}

/// Offer book with persistence and change notification.
#[derive(Debug)]
pub struct OfferStore {
    db: DatabaseConnection,
    key: String,
    book: Mutex<OfferBook>,
    events: broadcast::Sender<OfferChange>,
}

impl OfferStore {
    /// Creates a store around an already loaded book.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        key: impl Into<String>,
        book: OfferBook,
        capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            db,
            key: key.into(),
            book: Mutex::new(book),
            events,
        }
    }

    /// Hydrates the store from the persisted snapshot.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be read or decoded.
    #[instrument(skip(db, settings), fields(key = %settings.snapshot_key))]
    pub async fn init(db: DatabaseConnection, settings: &OfferSettings) -> Result<Self> {
        let book = snapshot::load(&db, &settings.snapshot_key).await?;
        Ok(Self::new(
            db,
            settings.snapshot_key.clone(),
            book,
            settings.event_capacity,
        ))
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<OfferChange> {
        self.events.subscribe()
    }

    /// Copy of the current book.
    pub async fn book(&self) -> OfferBook {
        self.book.lock().await.clone()
    }

    /// Pinned records.
    pub async fn pinned_count(&self) -> usize {
        self.book.lock().await.pinned_count()
    }

    /// Records past `Draft`.
    pub async fn active_count(&self) -> usize {
        self.book.lock().await.active_count()
    }

    /// Pin coverage of a group's pinnable variants.
    pub async fn group_state(&self, group: &Group) -> GroupPinState {
        self.book.lock().await.group_state(group)
    }

    async fn commit<T>(
        &self,
        kind: ChangeKind,
        op: impl FnOnce(&mut OfferBook) -> T,
    ) -> Result<T> {
        let mut current = self.book.lock().await;
        let mut next = current.clone();
        let outcome = op(&mut next);

        let skus = current.changed_skus(&next);
        if skus.is_empty() {
            trace!(?kind, "Offer operation changed nothing");
            return Ok(outcome);
        }

        snapshot::save(&self.db, &self.key, &next).await?;
        *current = next;

        let change = OfferChange {
            kind,
            skus,
            pinned_count: current.pinned_count(),
            active_count: current.active_count(),
        };
        debug!(
            ?kind,
            changed = change.skus.len(),
            pinned = change.pinned_count,
            active = change.active_count,
            "Offer change committed"
        );
        if self.events.send(change).is_err() {
            trace!("No offer change subscribers");
        }
        Ok(outcome)
    }

    /// Pins an untracked variant, or flips the pin of a tracked one.
    pub async fn toggle_pin(&self, candidate: &OfferCandidate) -> Result<()> {
        self.commit(ChangeKind::Pinned, |book| book.toggle_pin(candidate)).await
    }

    /// Flips the pin of an already tracked SKU.
    pub async fn toggle_sku(&self, sku: &str) -> Result<()> {
        self.commit(ChangeKind::Pinned, |book| book.toggle_sku(sku)).await
    }

    /// Pins or unpins every pinnable variant of a group.
    pub async fn toggle_group(&self, group: &Group) -> Result<()> {
        self.commit(ChangeKind::GroupToggled, |book| book.toggle_group(group)).await
    }

    /// Starts tracking live offers not yet known locally. Returns how many were added.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn import_active(&self, candidates: &[OfferCandidate]) -> Result<usize> {
        let added = self
            .commit(ChangeKind::Imported, |book| book.import_active(candidates))
            .await?;
        if added > 0 {
            info!("Imported {added} active offers");
        }
        Ok(added)
    }

    /// Submits every actionable record. Returns how many were placed.
    #[instrument(skip(self))]
    pub async fn place_offers(&self) -> Result<usize> {
        let placed = self
            .commit(ChangeKind::Placed, OfferBook::place_offers)
            .await?;
        info!("Placed offers for {} items", placed.len());
        Ok(placed.len())
    }

    /// Applies a quantity/price edit. Unknown SKUs yield `None`.
    pub async fn update_item(
        &self,
        sku: &str,
        qty_input: &str,
        price_input: &str,
    ) -> Result<Option<ItemFeedback>> {
        self.commit(ChangeKind::Edited, |book| {
            book.update_item(sku, qty_input, price_input)
        })
        .await
    }

    /// Accepts a countered record's terms and moves it into the cart.
    pub async fn accept_counter(&self, sku: &str) -> Result<bool> {
        self.commit(ChangeKind::CounterAccepted, |book| book.accept_counter(sku)).await
    }

    /// Moves a record into the cart at the chosen terms.
    pub async fn add_to_cart(&self, sku: &str, pricing: CartPricing) -> Result<bool> {
        self.commit(ChangeKind::AddedToCart, |book| book.add_to_cart(sku, pricing)).await
    }

    /// Withdraws a record from the user's selection.
    pub async fn cancel_offer(&self, sku: &str) -> Result<()> {
        self.commit(ChangeKind::Pinned, |book| book.cancel_offer(sku)).await
    }

    /// Unpins everything, deleting drafts.
    pub async fn clear_pinned(&self) -> Result<()> {
        self.commit(ChangeKind::Cleared, OfferBook::clear_pinned).await
    }

    /// Forgets every record.
    pub async fn clear_all(&self) -> Result<()> {
        self.commit(ChangeKind::Cleared, OfferBook::clear_all).await
    }

    /// Deletes every record under a drawer grouping key.
    pub async fn remove_offer_group(&self, key: &str) -> Result<usize> {
        self.commit(ChangeKind::Removed, |book| book.remove_group(key)).await
    }

    /// Deletes the named cart records.
    pub async fn remove_from_cart(&self, skus: &[String]) -> Result<usize> {
        self.commit(ChangeKind::Removed, |book| book.remove_in_cart(skus)).await
    }

    /// Checks out the named cart records, removing them from the store.
    #[instrument(skip(self, skus), fields(skus = skus.len()))]
    pub async fn checkout(&self, skus: &[String]) -> Result<usize> {
        let removed = self
            .commit(ChangeKind::CheckedOut, |book| book.remove_in_cart(skus))
            .await?;
        info!("Checked out {removed} cart items");
        Ok(removed)
    }
}
