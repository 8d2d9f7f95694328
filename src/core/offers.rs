//! Offer lifecycle - per-SKU offer records and the operations that move them.
//!
//! [`OfferBook`] is the plain record set keyed by SKU. Every operation here is
//! synchronous and side-effect free; persistence and change notification are layered
//! on top by [`crate::core::offer_store::OfferStore`].
//!
//! Records follow `Absent → Draft → Pending ⇄ Countered → {Accepted | Rejected} → InCart`.
//! A record with no status (or `Draft`) only exists while pinned: unpinning it deletes it.

use crate::core::catalog::{self, Group, OfferCandidate, OfferStatus, Variant, round_cents};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Working and submitted values closer than this are considered equal.
pub const PRICE_TOLERANCE: f64 = 0.005;

fn pinned_by_default() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<OfferStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if s.is_empty() => None,
        value @ Value::String(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// One SKU's offer state as tracked locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRecord {
    /// Stock-keeping unit
    pub sku: String,
    /// Catalog group the SKU was pinned from
    #[serde(rename = "group_id", default)]
    pub group_id: String,
    /// Display model of the group
    #[serde(default)]
    pub model: String,
    /// Manufacturer of the group
    #[serde(default)]
    pub manufacturer: String,
    /// Color and network of the variant
    #[serde(default)]
    pub description: String,
    /// Cosmetic grade
    #[serde(default)]
    pub grade: String,
    /// Stocking location
    #[serde(default)]
    pub warehouse: String,
    /// Working quantity
    #[serde(default, deserialize_with = "null_as_default")]
    pub qty: u32,
    /// Working unit price, `None` once the user cleared it
    #[serde(default)]
    pub price: Option<f64>,
    /// Quantity at the last submission
    #[serde(default, deserialize_with = "null_as_default")]
    pub submitted_qty: u32,
    /// Price at the last submission
    #[serde(default, deserialize_with = "null_as_default")]
    pub submitted_price: f64,
    /// Seller's counter quantity
    #[serde(default, deserialize_with = "null_as_default")]
    pub counter_qty: u32,
    /// Seller's counter price
    #[serde(default, deserialize_with = "null_as_default")]
    pub counter_price: f64,
    /// Stock available when the record was created
    #[serde(default, deserialize_with = "null_as_default")]
    pub available_qty: u32,
    /// List price when the record was created
    #[serde(default, deserialize_with = "null_as_default")]
    pub list_price: f64,
    /// Negotiation state, `None` for a fresh pin
    #[serde(default, deserialize_with = "lenient_status")]
    pub offer_status: Option<OfferStatus>,
    /// Selected by the user for the current offer action
    #[serde(default = "pinned_by_default")]
    pub is_pinned: bool,
}

impl OfferRecord {
    /// Seeds a record from a catalog variant, snapshotting its current offer terms.
    #[must_use]
    pub fn from_candidate(candidate: &OfferCandidate, pinned: bool) -> Self {
        let offer = &candidate.offer;
        Self {
            sku: candidate.sku.clone(),
            group_id: candidate.group_id.clone(),
            model: candidate.model.clone(),
            manufacturer: candidate.manufacturer.clone(),
            description: candidate.description.clone(),
            grade: candidate.grade.clone(),
            warehouse: candidate.warehouse.clone(),
            qty: offer.offer_qty,
            price: Some(offer.offer_price),
            submitted_qty: candidate.submitted_qty.unwrap_or(offer.offer_qty),
            submitted_price: candidate.submitted_price.unwrap_or(offer.offer_price),
            counter_qty: offer.counter_qty,
            counter_price: offer.counter_price,
            available_qty: candidate.quantity,
            list_price: candidate.price,
            offer_status: offer.offer_status,
            is_pinned: pinned,
        }
    }

    /// Working price, 0 when cleared.
    #[must_use]
    pub fn working_price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    /// Has a status past `Draft`.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !catalog::is_draft(self.offer_status)
    }

    /// `manufacturer|model|grade|warehouse`, the drawer's grouping key.
    #[must_use]
    pub fn group_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.manufacturer, self.model, self.grade, self.warehouse
        )
    }

    /// Eligible for placement: a complete draft, or a live offer whose working values
    /// moved away from the last submission.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        let price = self.working_price();
        match self.offer_status {
            None | Some(OfferStatus::Draft) => self.qty > 0 && price > 0.0,
            Some(status) if status.is_terminal() => false,
            Some(_) => {
                self.qty != self.submitted_qty
                    || (price - self.submitted_price).abs() > PRICE_TOLERANCE
            }
        }
    }

    /// Which working values differ from the last submission.
    #[must_use]
    pub fn edit_state(&self) -> EditState {
        let price = self.working_price();
        let qty_edited = self.submitted_qty > 0 && self.qty != self.submitted_qty;
        let price_edited =
            self.submitted_price > 0.0 && (price - self.submitted_price).abs() > PRICE_TOLERANCE;
        let unsubmitted = if self.submitted_qty == 0 {
            self.qty > 0 && price > 0.0
        } else {
            qty_edited || price_edited
        };
        EditState {
            qty_edited,
            price_edited,
            unsubmitted,
        }
    }

    /// How the working price compares with the list price.
    #[must_use]
    pub fn price_feedback(&self) -> PriceFeedback {
        let price = self.working_price();
        if self.list_price <= 0.0 || price <= 0.0 {
            PriceFeedback::NoOffer
        } else if price >= self.list_price {
            PriceFeedback::BuyAtList
        } else {
            PriceFeedback::OfferIn {
                savings: round_cents((self.list_price - price) * f64::from(self.qty)),
            }
        }
    }

    fn unpin(&mut self) {
        self.is_pinned = false;
    }

    fn set_terms(&mut self, qty: u32, price: f64) {
        self.qty = qty;
        self.price = Some(price);
        self.submitted_qty = qty;
        self.submitted_price = price;
    }
}

/// Edit markers for a record's working values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EditState {
    /// Quantity differs from a non-zero submitted quantity
    pub qty_edited: bool,
    /// Price differs from a non-zero submitted price
    pub price_edited: bool,
    /// Working values would change something if placed
    pub unsubmitted: bool,
}

/// Price position relative to list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PriceFeedback {
    /// No usable price entered
    NoOffer,
    /// Price equals (or was capped to) the list price
    BuyAtList,
    /// Price under list, with the total saving over the quantity
    OfferIn {
        /// `(list - price) * qty`, in cents precision
        savings: f64,
    },
}

/// Result of a field edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFeedback {
    /// Normalised working quantity
    pub qty: u32,
    /// Normalised working price
    pub price: Option<f64>,
    /// Price position relative to list
    pub price_feedback: PriceFeedback,
    /// Quantity is above the stock seen when the record was created
    pub exceeds_available: bool,
    /// Edit markers after the change
    pub edit: EditState,
}

/// Values used when a record moves into the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartPricing {
    /// List price at the working quantity (1 if none)
    List,
    /// The seller's counter terms
    Counter,
    /// The last submitted terms
    Submitted,
}

/// Pin coverage of a group's pinnable variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupPinState {
    /// Every pinnable variant is pinned
    All,
    /// Some but not all are pinned
    #[serde(rename = "some")]
    Partial,
    /// None are pinned, or nothing is pinnable
    #[serde(rename = "none")]
    Unpinned,
}

/// Drawer views over the record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferView {
    /// Records the user selected
    Pinned,
    /// Records with a status past `Draft`
    Active,
}

/// Records sharing a drawer grouping key.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferGroup<'a> {
    /// `manufacturer|model|grade|warehouse`
    pub key: String,
    /// Member records in SKU order
    pub records: Vec<&'a OfferRecord>,
}

/// Footer totals for a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferSummary {
    /// Sum of working price times quantity
    pub total_value: f64,
    /// Records that placing would submit
    pub actionable_count: usize,
    /// Whether placing would do anything
    pub can_place: bool,
}

/// Leading integer of a text field, as typed.
fn parse_quantity(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse().ok()
}

/// Longest numeric prefix of a text field, as typed.
fn parse_price(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    (1..=trimmed.len())
        .rev()
        .filter(|end| trimmed.is_char_boundary(*end))
        .find_map(|end| trimmed[..end].parse::<f64>().ok())
        .filter(|price| price.is_finite())
}

/// The full local offer record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferBook {
    records: BTreeMap<String, OfferRecord>,
}

impl OfferBook {
    /// Wraps an existing record map.
    #[must_use]
    pub const fn from_records(records: BTreeMap<String, OfferRecord>) -> Self {
        Self { records }
    }

    /// The record map, keyed by SKU.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, OfferRecord> {
        &self.records
    }

    /// Looks up a record.
    #[must_use]
    pub fn get(&self, sku: &str) -> Option<&OfferRecord> {
        self.records.get(sku)
    }

    /// Number of tracked records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `sku` is tracked and pinned.
    #[must_use]
    pub fn is_pinned(&self, sku: &str) -> bool {
        self.records.get(sku).is_some_and(|r| r.is_pinned)
    }

    /// Records the user selected.
    #[must_use]
    pub fn pinned_count(&self) -> usize {
        self.records.values().filter(|r| r.is_pinned).count()
    }

    /// Records with a status past `Draft`.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.records.values().filter(|r| r.is_active()).count()
    }

    /// SKUs whose record differs between `self` and `other`, including added and
    /// removed records.
    #[must_use]
    pub fn changed_skus(&self, other: &Self) -> Vec<String> {
        let keys: BTreeSet<&String> = self.records.keys().chain(other.records.keys()).collect();
        keys.into_iter()
            .filter(|sku| self.records.get(*sku) != other.records.get(*sku))
            .cloned()
            .collect()
    }

    fn unpin_record(&mut self, sku: &str) {
        if let Some(record) = self.records.get_mut(sku) {
            record.unpin();
            if !record.is_active() {
                self.records.remove(sku);
            }
        }
    }

    fn pin_candidate(&mut self, candidate: &OfferCandidate) {
        self.records
            .entry(candidate.sku.clone())
            .and_modify(|record| record.is_pinned = true)
            .or_insert_with(|| OfferRecord::from_candidate(candidate, true));
    }

    /// Pins an untracked variant, or flips the pin of a tracked one.
    ///
    /// Unpinning a record that never went past `Draft` deletes it.
    pub fn toggle_pin(&mut self, candidate: &OfferCandidate) {
        if self.is_pinned(&candidate.sku) {
            self.unpin_record(&candidate.sku);
        } else {
            self.pin_candidate(candidate);
        }
    }

    /// Flips the pin of an already tracked SKU. Unknown SKUs are ignored.
    pub fn toggle_sku(&mut self, sku: &str) {
        let Some(record) = self.records.get_mut(sku) else {
            return;
        };
        if record.is_pinned {
            self.unpin_record(sku);
        } else {
            record.is_pinned = true;
        }
    }

    /// Group members a bulk pin may touch. A tracked record's status wins over the
    /// catalog's, so offers placed from this book drop out once they leave `Draft`.
    fn pinnable<'g>(&self, group: &'g Group) -> Vec<&'g Variant> {
        group
            .variants
            .iter()
            .filter(|v| {
                let status = self
                    .records
                    .get(&v.sku)
                    .map_or(v.offer.offer_status, |r| r.offer_status);
                catalog::is_draft(status)
            })
            .collect()
    }

    /// Pin coverage of a group's pinnable variants.
    #[must_use]
    pub fn group_state(&self, group: &Group) -> GroupPinState {
        let (pinnable, pinned) = self
            .pinnable(group)
            .into_iter()
            .fold((0_usize, 0_usize), |(total, pinned), v| {
                (total + 1, pinned + usize::from(self.is_pinned(&v.sku)))
            });
        if pinnable == 0 || pinned == 0 {
            GroupPinState::Unpinned
        } else if pinned == pinnable {
            GroupPinState::All
        } else {
            GroupPinState::Partial
        }
    }

    /// Pins every pinnable variant of a group, or unpins them all if they already are.
    ///
    /// Variants past `Draft` are never touched.
    pub fn toggle_group(&mut self, group: &Group) {
        let pinnable = self.pinnable(group);
        if pinnable.is_empty() {
            return;
        }
        if pinnable.iter().all(|v| self.is_pinned(&v.sku)) {
            for variant in pinnable {
                self.unpin_record(&variant.sku);
            }
        } else {
            for variant in pinnable {
                self.pin_candidate(&OfferCandidate::new(group, variant));
            }
        }
    }

    /// Starts tracking externally originated live offers without touching records the
    /// user already has. Returns how many records were added.
    pub fn import_active(&mut self, candidates: &[OfferCandidate]) -> usize {
        let mut added = 0;
        for candidate in candidates {
            if catalog::is_draft(candidate.offer.offer_status)
                || self.records.contains_key(&candidate.sku)
            {
                continue;
            }
            self.records.insert(
                candidate.sku.clone(),
                OfferRecord::from_candidate(candidate, false),
            );
            added += 1;
        }
        added
    }

    /// Submits every actionable record: status becomes `Pending` and the submitted
    /// snapshot takes the working values. Returns the placed SKUs.
    pub fn place_offers(&mut self) -> Vec<String> {
        let mut placed = Vec::new();
        for record in self.records.values_mut().filter(|r| r.is_actionable()) {
            record.offer_status = Some(OfferStatus::Pending);
            record.submitted_qty = record.qty;
            record.submitted_price = record.working_price();
            placed.push(record.sku.clone());
        }
        placed
    }

    /// Applies a quantity/price field edit and reports the resulting feedback.
    ///
    /// Quantity below 1 or unparsable becomes 1. An empty or unparsable price clears the
    /// working price, a negative one is ignored, and one above list is capped to list.
    pub fn update_item(
        &mut self,
        sku: &str,
        qty_input: &str,
        price_input: &str,
    ) -> Option<ItemFeedback> {
        let record = self.records.get_mut(sku)?;

        record.qty = parse_quantity(qty_input)
            .filter(|qty| *qty >= 1)
            .map_or(1, |qty| u32::try_from(qty).unwrap_or(u32::MAX));

        match parse_price(price_input) {
            None => record.price = None,
            Some(price) if price < 0.0 => {}
            Some(price) if record.list_price > 0.0 && price > record.list_price => {
                record.price = Some(record.list_price);
            }
            Some(price) => record.price = Some(price),
        }

        Some(ItemFeedback {
            qty: record.qty,
            price: record.price,
            price_feedback: record.price_feedback(),
            exceeds_available: record.available_qty > 0 && record.qty > record.available_qty,
            edit: record.edit_state(),
        })
    }

    /// Takes the seller's counter terms and moves the record into the cart.
    ///
    /// Only countered records qualify.
    pub fn accept_counter(&mut self, sku: &str) -> bool {
        let Some(record) = self.records.get_mut(sku) else {
            return false;
        };
        if record.offer_status != Some(OfferStatus::Countered) {
            return false;
        }
        let (qty, price) = (record.counter_qty, record.counter_price);
        record.set_terms(qty, price);
        record.offer_status = Some(OfferStatus::InCart);
        true
    }

    /// Moves a record into the cart at the chosen terms.
    pub fn add_to_cart(&mut self, sku: &str, pricing: CartPricing) -> bool {
        let Some(record) = self.records.get_mut(sku) else {
            return false;
        };
        let (qty, price) = match pricing {
            CartPricing::List => (record.qty.max(1), record.list_price),
            CartPricing::Counter => (record.counter_qty, record.counter_price),
            CartPricing::Submitted => (record.submitted_qty, record.submitted_price),
        };
        record.set_terms(qty, price);
        record.offer_status = Some(OfferStatus::InCart);
        true
    }

    /// Withdraws a record from the user's selection; same as unpinning it.
    pub fn cancel_offer(&mut self, sku: &str) {
        if self.is_pinned(sku) {
            self.unpin_record(sku);
        }
    }

    /// Unpins every pinned record, deleting the drafts among them.
    pub fn clear_pinned(&mut self) {
        let pinned: Vec<String> = self
            .records
            .values()
            .filter(|r| r.is_pinned)
            .map(|r| r.sku.clone())
            .collect();
        for sku in pinned {
            self.unpin_record(&sku);
        }
    }

    /// Forgets every record.
    pub fn clear_all(&mut self) {
        self.records.clear();
    }

    /// Deletes every record under a drawer grouping key. Returns how many were removed.
    pub fn remove_group(&mut self, key: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.group_key() != key);
        before - self.records.len()
    }

    /// Deletes the named records that are in the cart. Returns how many were removed.
    pub fn remove_in_cart(&mut self, skus: &[String]) -> usize {
        let before = self.records.len();
        self.records.retain(|sku, record| {
            !(record.offer_status == Some(OfferStatus::InCart) && skus.contains(sku))
        });
        before - self.records.len()
    }

    /// Records shown in a drawer view, in SKU order.
    pub fn records(&self, view: OfferView) -> impl Iterator<Item = &OfferRecord> {
        self.records.values().filter(move |record| match view {
            OfferView::Pinned => record.is_pinned,
            OfferView::Active => record.is_active(),
        })
    }

    /// Records of a view bucketed by drawer grouping key, in order of first appearance.
    #[must_use]
    pub fn grouped(&self, view: OfferView) -> Vec<OfferGroup<'_>> {
        let mut groups: Vec<OfferGroup<'_>> = Vec::new();
        for record in self.records(view) {
            let key = record.group_key();
            if let Some(group) = groups.iter_mut().find(|g| g.key == key) {
                group.records.push(record);
            } else {
                groups.push(OfferGroup {
                    key,
                    records: vec![record],
                });
            }
        }
        groups
    }

    /// Footer totals for a view.
    #[must_use]
    pub fn summary(&self, view: OfferView) -> OfferSummary {
        let (total_value, actionable_count) =
            self.records(view).fold((0.0, 0), |(total, actionable), record| {
                (
                    total + record.working_price() * f64::from(record.qty),
                    actionable + usize::from(record.is_actionable()),
                )
            });
        OfferSummary {
            total_value: round_cents(total_value),
            actionable_count,
            can_place: actionable_count > 0,
        }
    }
}
