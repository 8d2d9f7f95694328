//! Catalog generation - synthetic inventory folded into display groups.
//!
//! Raw unit records are produced from the attribute taxonomy by a (optionally seeded)
//! random process, then folded into [`Group`]s keyed by manufacturer, model, capacity,
//! grade and warehouse. The fold itself is pure: all randomness, including any
//! pre-seeded offer state, is decided when the unit is generated.

use crate::config::CatalogSettings;
use crate::core::taxonomy::{
    self, CAPACITIES, CATEGORIES, COLORS, DOMINANT_CATEGORY, GRADES, LOCK_STATUSES, NETWORKS,
    NO_NETWORK, WAREHOUSES,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Negotiation state of an offer on a single SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferStatus {
    /// Started locally, never submitted
    Draft,
    /// Submitted, awaiting the seller
    Pending,
    /// Seller answered with different terms
    Countered,
    /// Seller accepted the submitted terms
    Accepted,
    /// Seller declined
    Rejected,
    /// Committed to the cart
    #[serde(rename = "In Cart")]
    InCart,
}

impl OfferStatus {
    /// Statuses the demo reset distributes round-robin.
    pub const DEMO_ROTATION: [Self; 4] = [
        Self::Pending,
        Self::Countered,
        Self::Accepted,
        Self::Rejected,
    ];

    /// Terminal for edit purposes: editing never makes these actionable again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::InCart | Self::Accepted)
    }
}

/// True for "no status" and `Draft`: the states a user may still pin freely.
#[must_use]
pub const fn is_draft(status: Option<OfferStatus>) -> bool {
    matches!(status, None | Some(OfferStatus::Draft))
}

/// Offer fields overlaid on a variant by the seller side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferOverlay {
    /// Current negotiation state, `None` if never offered
    pub offer_status: Option<OfferStatus>,
    /// Quantity of the last offer
    pub offer_qty: u32,
    /// Unit price of the last offer
    pub offer_price: f64,
    /// Seller's counter quantity, 0 unless countered
    pub counter_qty: u32,
    /// Seller's counter unit price, 0 unless countered
    pub counter_price: f64,
}

/// A physically distinct stock-keeping unit within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Globally unique stock-keeping unit
    pub sku: String,
    /// Stocking location
    pub warehouse: String,
    /// Cosmetic grade
    pub grade: String,
    /// Color
    pub color: String,
    /// Carrier network, `N/A` when the category has none
    pub network: String,
    /// Lock status, absent for non-networked categories
    pub lock_status: Option<String>,
    /// Units available
    pub quantity: u32,
    /// List price per unit
    pub price: f64,
    /// Seller-side offer state
    #[serde(flatten)]
    pub offer: OfferOverlay,
}

/// Display aggregation of variants sharing manufacturer, model, capacity, grade and warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Synthetic identifier (`group-N`, in creation order)
    pub id: String,
    /// Manufacturer derived from the model name
    pub manufacturer: String,
    /// Display name: raw model plus capacity
    pub model: String,
    /// Model name without capacity
    pub raw_model: String,
    /// Storage capacity (e.g. `128GB`)
    pub capacity: String,
    /// Cosmetic grade
    pub grade: String,
    /// Stocking location
    pub warehouse: String,
    /// Product category
    pub category: String,
    /// Sum of member variant quantities
    pub quantity: u32,
    /// Lowest member list price, 0 when empty
    pub min_price: f64,
    /// Highest member list price, 0 when empty
    pub max_price: f64,
    /// `$min` or `$min - $max`
    pub price_range: String,
    /// Comma list of attributes that differ across variants, `None` if none do
    pub varying_attributes: Option<String>,
    /// Member variants, unique by (color, network)
    pub variants: Vec<Variant>,
}

impl Group {
    fn empty(key: &GroupKey, category: &str, ordinal: usize) -> Self {
        Self {
            id: format!("group-{ordinal}"),
            manufacturer: key.manufacturer.clone(),
            model: format!("{} {}", key.raw_model, key.capacity),
            raw_model: key.raw_model.clone(),
            capacity: key.capacity.clone(),
            grade: key.grade.clone(),
            warehouse: key.warehouse.clone(),
            category: category.to_string(),
            quantity: 0,
            min_price: f64::INFINITY,
            max_price: f64::NEG_INFINITY,
            price_range: String::new(),
            varying_attributes: None,
            variants: Vec::new(),
        }
    }

    /// Variants a bulk pin may touch: no status yet, or still `Draft`.
    pub fn pinnable_variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants
            .iter()
            .filter(|v| is_draft(v.offer.offer_status))
    }

    /// Fixes up price aggregates and detects varying attributes once folding is done.
    fn finalize(mut self) -> Self {
        if !self.min_price.is_finite() {
            self.min_price = 0.0;
        }
        if !self.max_price.is_finite() {
            self.max_price = 0.0;
        }
        self.price_range = format_price_range(self.min_price, self.max_price);
        self.varying_attributes = varying_attributes(&self.variants);
        self
    }
}

/// Rounds a money amount to cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Formats an amount without trailing zero cents (`200`, `200.5`).
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let text = format!("{:.2}", round_cents(amount));
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn format_price_range(min: f64, max: f64) -> String {
    if (max - min).abs() < f64::EPSILON {
        format!("${}", format_amount(min))
    } else {
        format!("${} - ${}", format_amount(min), format_amount(max))
    }
}

fn varying_attributes(variants: &[Variant]) -> Option<String> {
    fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> usize {
        let mut seen: Vec<&str> = values
            .flatten()
            .filter(|v| !v.is_empty() && *v != NO_NETWORK)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    let checks = [
        ("Color", distinct(variants.iter().map(|v| Some(v.color.as_str())))),
        (
            "Network",
            distinct(variants.iter().map(|v| Some(v.network.as_str()))),
        ),
        (
            "Lock Status",
            distinct(variants.iter().map(|v| v.lock_status.as_deref())),
        ),
    ];

    let varying: Vec<&str> = checks
        .iter()
        .filter(|(_, count)| *count > 1)
        .map(|(label, _)| *label)
        .collect();

    if varying.is_empty() {
        None
    } else {
        Some(varying.join(", "))
    }
}

/// One raw stock record before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Stock-keeping unit
    pub sku: String,
    /// Product category
    pub category: String,
    /// Model name without capacity
    pub raw_model: String,
    /// Manufacturer derived from the model name
    pub manufacturer: String,
    /// Storage capacity
    pub capacity: String,
    /// Cosmetic grade
    pub grade: String,
    /// Stocking location
    pub warehouse: String,
    /// Color
    pub color: String,
    /// Carrier network or `N/A`
    pub network: String,
    /// Lock status for networked categories
    pub lock_status: Option<String>,
    /// Units available
    pub quantity: u32,
    /// List price per unit
    pub price: f64,
    /// Offer state applied if this unit creates a new variant
    pub offer: OfferOverlay,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    manufacturer: String,
    raw_model: String,
    capacity: String,
    grade: String,
    warehouse: String,
}

impl From<&Unit> for GroupKey {
    fn from(unit: &Unit) -> Self {
        Self {
            manufacturer: unit.manufacturer.clone(),
            raw_model: unit.raw_model.clone(),
            capacity: unit.capacity.clone(),
            grade: unit.grade.clone(),
            warehouse: unit.warehouse.clone(),
        }
    }
}

/// Accumulator for folding units into groups, preserving group creation order.
#[derive(Debug, Default)]
pub struct GroupFold {
    groups: Vec<Group>,
    index: HashMap<GroupKey, usize>,
}

impl GroupFold {
    /// Folds one unit into its group, creating the group or variant when absent.
    ///
    /// A unit whose (color, network) already exists in the group adds its quantity to
    /// that variant instead of creating a duplicate.
    #[must_use]
    pub fn push(mut self, unit: Unit) -> Self {
        let key = GroupKey::from(&unit);
        let slot = if let Some(&slot) = self.index.get(&key) {
            slot
        } else {
            let slot = self.groups.len();
            self.groups.push(Group::empty(&key, &unit.category, slot));
            self.index.insert(key, slot);
            slot
        };
        let group = &mut self.groups[slot];

        if let Some(existing) = group
            .variants
            .iter_mut()
            .find(|v| v.color == unit.color && v.network == unit.network)
        {
            existing.quantity = existing.quantity.saturating_add(unit.quantity);
        } else {
            group.variants.push(Variant {
                sku: unit.sku,
                warehouse: unit.warehouse,
                grade: unit.grade,
                color: unit.color,
                network: unit.network,
                lock_status: unit.lock_status,
                quantity: unit.quantity,
                price: unit.price,
                offer: unit.offer,
            });
        }

        group.quantity = group.quantity.saturating_add(unit.quantity);
        group.min_price = group.min_price.min(unit.price);
        group.max_price = group.max_price.max(unit.price);
        self
    }

    /// Completes every group's derived fields.
    #[must_use]
    pub fn finish(self) -> Vec<Group> {
        self.groups.into_iter().map(Group::finalize).collect()
    }
}

/// Folds a sequence of units into display groups.
pub fn fold_units<I>(units: I) -> Vec<Group>
where
    I: IntoIterator<Item = Unit>,
{
    units
        .into_iter()
        .fold(GroupFold::default(), GroupFold::push)
        .finish()
}

/// Creates the generator RNG, seeded when a seed is configured.
#[must_use]
pub fn catalog_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

fn pick<R: Rng + ?Sized>(rng: &mut R, values: &[&'static str]) -> &'static str {
    values.choose(rng).copied().unwrap_or_default()
}

/// Draws self-consistent offer terms for a variant entering `status`.
///
/// The offer sits $5–$25 under list; a counter lands 30–70% of the way from the offer
/// back up to list, for either the offered quantity or the full available quantity.
pub fn offer_terms<R: Rng + ?Sized>(
    rng: &mut R,
    status: OfferStatus,
    quantity: u32,
    list_price: f64,
) -> OfferOverlay {
    let offer_qty = if quantity == 0 {
        1
    } else {
        rng.gen_range(1..=quantity)
    };
    let discount = rng.gen_range(5.0..25.0);
    let offer_price = round_cents((list_price - discount).max(0.0));

    let (counter_qty, counter_price) = if status == OfferStatus::Countered {
        let counter_qty = if rng.gen_bool(0.5) { quantity } else { offer_qty };
        let spread = list_price - offer_price;
        let bump = spread * rng.gen_range(0.3..0.7);
        (counter_qty, round_cents(offer_price + bump))
    } else {
        (0, 0.0)
    };

    OfferOverlay {
        offer_status: Some(status),
        offer_qty,
        offer_price,
        counter_qty,
        counter_price,
    }
}

fn seeded_status<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> Option<OfferStatus> {
    let roll: f64 = rng.gen_range(0.0..1.0);
    if roll >= rate {
        return None;
    }
    let quarter = rate / 4.0;
    Some(if roll < quarter {
        OfferStatus::Pending
    } else if roll < quarter * 2.0 {
        OfferStatus::Countered
    } else if roll < quarter * 3.0 {
        OfferStatus::Accepted
    } else {
        OfferStatus::Rejected
    })
}

fn generate_unit<R: Rng + ?Sized>(rng: &mut R, index: usize, seeded_offer_rate: f64) -> Unit {
    let category = if rng.gen_bool(0.7) {
        DOMINANT_CATEGORY
    } else {
        pick(rng, CATEGORIES)
    };
    let raw_model = pick(rng, taxonomy::models_for(category));
    let capacity = pick(rng, CAPACITIES);
    // Only the first three grades and warehouses are stocked, for denser groups.
    let grade = pick(rng, &GRADES[..3]);
    let warehouse = pick(rng, &WAREHOUSES[..3]);
    let color = pick(rng, COLORS);
    let networked = taxonomy::is_networked(category);
    let network = if networked {
        pick(rng, NETWORKS)
    } else {
        NO_NETWORK
    };
    let lock_status = networked.then(|| pick(rng, LOCK_STATUSES).to_string());

    let quantity = rng.gen_range(0..50);
    let price = f64::from(rng.gen_range(200..1000) + rng.gen_range(0..50));

    let offer = seeded_status(rng, seeded_offer_rate)
        .map(|status| offer_terms(rng, status, quantity, price))
        .unwrap_or_default();

    Unit {
        sku: format!("SKU-{}", 10_000 + index),
        category: category.to_string(),
        raw_model: raw_model.to_string(),
        manufacturer: taxonomy::manufacturer_for(raw_model).to_string(),
        capacity: capacity.to_string(),
        grade: grade.to_string(),
        warehouse: warehouse.to_string(),
        color: color.to_string(),
        network: network.to_string(),
        lock_status,
        quantity,
        price,
        offer,
    }
}

/// Produces `unit_count` raw unit records.
pub fn generate_units<R: Rng + ?Sized>(rng: &mut R, settings: &CatalogSettings) -> Vec<Unit> {
    (0..settings.unit_count)
        .map(|index| generate_unit(rng, index, settings.seeded_offer_rate))
        .collect()
}

/// Generates the full synthetic catalog described by `settings`.
#[must_use]
pub fn generate_catalog(settings: &CatalogSettings) -> Vec<Group> {
    let mut rng = catalog_rng(settings.seed);
    let groups = fold_units(generate_units(&mut rng, settings));
    let variant_count: usize = groups.iter().map(|g| g.variants.len()).sum();
    info!(
        "Generated catalog: {} units folded into {} groups ({} variants)",
        settings.unit_count,
        groups.len(),
        variant_count
    );
    groups
}

/// A variant together with the group context an offer record needs.
///
/// This is the boundary type between the catalog and the offer store.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferCandidate {
    /// Stock-keeping unit
    pub sku: String,
    /// Owning group identifier
    pub group_id: String,
    /// Group manufacturer
    pub manufacturer: String,
    /// Group display model
    pub model: String,
    /// Cosmetic grade
    pub grade: String,
    /// Stocking location
    pub warehouse: String,
    /// Short variant description (color and network)
    pub description: String,
    /// Units available
    pub quantity: u32,
    /// List price per unit
    pub price: f64,
    /// Seller-side offer state
    pub offer: OfferOverlay,
    /// Last submitted quantity, when the source knows it
    pub submitted_qty: Option<u32>,
    /// Last submitted price, when the source knows it
    pub submitted_price: Option<f64>,
}

impl OfferCandidate {
    /// Adapts a group member into a candidate.
    #[must_use]
    pub fn new(group: &Group, variant: &Variant) -> Self {
        Self {
            sku: variant.sku.clone(),
            group_id: group.id.clone(),
            manufacturer: group.manufacturer.clone(),
            model: group.model.clone(),
            grade: variant.grade.clone(),
            warehouse: variant.warehouse.clone(),
            description: format!("{} {}", variant.color, variant.network)
                .trim()
                .to_string(),
            quantity: variant.quantity,
            price: variant.price,
            offer: variant.offer.clone(),
            submitted_qty: None,
            submitted_price: None,
        }
    }
}

/// Clears every offer overlay, then assigns active statuses to `count` random variants.
///
/// Variants are shuffled and the first `count` taken; statuses rotate through
/// [`OfferStatus::DEMO_ROTATION`] so the demo set is evenly distributed.
pub fn reset_demo_offers<R: Rng + ?Sized>(
    groups: &mut [Group],
    count: usize,
    rng: &mut R,
) -> Vec<OfferCandidate> {
    let mut positions = Vec::new();
    for (group_index, group) in groups.iter_mut().enumerate() {
        for (variant_index, variant) in group.variants.iter_mut().enumerate() {
            variant.offer = OfferOverlay::default();
            positions.push((group_index, variant_index));
        }
    }

    positions.shuffle(rng);
    positions.truncate(count);

    let selected: Vec<OfferCandidate> = positions
        .iter()
        .zip(OfferStatus::DEMO_ROTATION.iter().cycle())
        .map(|(&(group_index, variant_index), &status)| {
            let group = &mut groups[group_index];
            let variant = &mut group.variants[variant_index];
            variant.offer = offer_terms(rng, status, variant.quantity, variant.price);
            OfferCandidate::new(group, &group.variants[variant_index])
        })
        .collect();

    debug!("Demo reset assigned {} active offers", selected.len());
    selected
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::unit;

    #[test]
    fn test_fold_groups_by_key_and_dedups_variants() {
        let groups = fold_units(vec![
            unit("SKU-1", "iPhone 12", "MAIN", "Blue", "AT&T", 3, 400.0),
            unit("SKU-2", "iPhone 12", "MAIN", "Blue", "AT&T", 4, 420.0),
            unit("SKU-3", "iPhone 12", "MAIN", "Red", "AT&T", 1, 380.0),
            unit("SKU-4", "Galaxy S21", "MAIN", "Blue", "AT&T", 2, 500.0),
        ]);

        assert_eq!(groups.len(), 2);
        let iphone = &groups[0];
        assert_eq!(iphone.id, "group-0");
        assert_eq!(iphone.model, "iPhone 12 128GB");
        assert_eq!(iphone.manufacturer, "Apple");
        assert_eq!(iphone.variants.len(), 2);
        assert_eq!(iphone.variants[0].sku, "SKU-1");
        assert_eq!(iphone.variants[0].quantity, 7);
        assert_eq!(iphone.quantity, 8);
        assert_eq!(iphone.min_price, 380.0);
        assert_eq!(iphone.max_price, 420.0);
        assert_eq!(iphone.price_range, "$380 - $420");
        assert_eq!(iphone.varying_attributes.as_deref(), Some("Color"));

        let galaxy = &groups[1];
        assert_eq!(galaxy.manufacturer, "Samsung");
        assert_eq!(galaxy.price_range, "$500");
        assert!(galaxy.varying_attributes.is_none());
    }

    #[test]
    fn test_fold_saturates_quantities() {
        let groups = fold_units(vec![
            unit("SKU-1", "iPhone 12", "MAIN", "Blue", "AT&T", u32::MAX, 400.0),
            unit("SKU-2", "iPhone 12", "MAIN", "Blue", "AT&T", 5, 400.0),
        ]);
        assert_eq!(groups[0].variants[0].quantity, u32::MAX);
        assert_eq!(groups[0].quantity, u32::MAX);
    }

    #[test]
    fn test_fold_is_order_independent_in_shape() {
        let mut units = vec![
            unit("SKU-1", "iPhone 12", "MAIN", "Blue", "AT&T", 3, 400.0),
            unit("SKU-2", "iPhone 12", "DLS", "Blue", "AT&T", 4, 420.0),
            unit("SKU-3", "iPhone 12", "MAIN", "Red", "Verizon", 1, 380.0),
            unit("SKU-4", "iPhone 12", "MAIN", "Red", "Verizon", 6, 390.0),
            unit("SKU-5", "Galaxy S21", "W23", "Gold", "Sprint", 2, 500.0),
        ];
        let shape = |groups: &[Group]| {
            let mut shape: Vec<(String, String, usize, u32)> = groups
                .iter()
                .map(|g| {
                    (
                        g.model.clone(),
                        g.warehouse.clone(),
                        g.variants.len(),
                        g.quantity,
                    )
                })
                .collect();
            shape.sort();
            shape
        };

        let forward = shape(&fold_units(units.clone()));
        units.reverse();
        let backward = shape(&fold_units(units));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_varying_attributes_skip_placeholders() {
        let mut a = unit("SKU-1", "Case", "MAIN", "Blue", NO_NETWORK, 1, 200.0);
        a.lock_status = None;
        let mut b = unit("SKU-2", "Case", "MAIN", "Red", NO_NETWORK, 1, 200.0);
        b.lock_status = None;
        let groups = fold_units(vec![a, b]);
        assert_eq!(groups[0].varying_attributes.as_deref(), Some("Color"));

        let mut c = unit("SKU-3", "iPhone 13", "MAIN", "Blue", "AT&T", 1, 200.0);
        c.lock_status = Some("LOCKED".to_string());
        let mut d = unit("SKU-4", "iPhone 13", "MAIN", "Red", "Verizon", 1, 200.0);
        d.lock_status = Some("UNLOCKED".to_string());
        let groups = fold_units(vec![c, d]);
        assert_eq!(
            groups[0].varying_attributes.as_deref(),
            Some("Color, Network, Lock Status")
        );
    }

    #[test]
    fn test_empty_group_prices_default_to_zero() {
        let key = GroupKey {
            manufacturer: "Apple".to_string(),
            raw_model: "iPad Air".to_string(),
            capacity: "64GB".to_string(),
            grade: "A+".to_string(),
            warehouse: "MAIN".to_string(),
        };
        let group = Group::empty(&key, "Tablets", 0).finalize();
        assert_eq!(group.min_price, 0.0);
        assert_eq!(group.max_price, 0.0);
        assert_eq!(group.price_range, "$0");
        assert!(group.varying_attributes.is_none());
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let settings = CatalogSettings {
            unit_count: 200,
            seed: Some(42),
            seeded_offer_rate: 0.2,
        };
        let first = generate_catalog(&settings);
        let second = generate_catalog(&settings);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_generated_catalog_invariants() {
        let settings = CatalogSettings {
            unit_count: 600,
            seed: Some(7),
            seeded_offer_rate: 0.5,
        };
        let groups = generate_catalog(&settings);

        let mut skus: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.variants.iter().map(|v| v.sku.as_str()))
            .collect();
        let total = skus.len();
        skus.sort_unstable();
        skus.dedup();
        assert_eq!(skus.len(), total, "SKUs must be unique");

        for group in &groups {
            assert!(group.min_price <= group.max_price);
            assert_eq!(
                group.quantity,
                group.variants.iter().map(|v| v.quantity).sum::<u32>()
            );
            let mut pairs: Vec<(&str, &str)> = group
                .variants
                .iter()
                .map(|v| (v.color.as_str(), v.network.as_str()))
                .collect();
            let before = pairs.len();
            pairs.sort_unstable();
            pairs.dedup();
            assert_eq!(pairs.len(), before);

            for variant in &group.variants {
                if variant.offer.offer_status == Some(OfferStatus::Countered) {
                    assert!(variant.offer.counter_price > variant.offer.offer_price);
                    assert!(variant.offer.counter_price < variant.price);
                }
            }
        }
    }

    #[test]
    fn test_offer_terms_countered_invariants() {
        let mut rng = catalog_rng(Some(3));
        for _ in 0..200 {
            let terms = offer_terms(&mut rng, OfferStatus::Countered, 10, 450.0);
            assert!(terms.offer_qty >= 1 && terms.offer_qty <= 10);
            assert!(terms.offer_price < 450.0);
            assert!(terms.counter_price > terms.offer_price);
            assert!(terms.counter_price < 450.0);
            assert!(terms.counter_qty == terms.offer_qty || terms.counter_qty == 10);
        }

        let pending = offer_terms(&mut rng, OfferStatus::Pending, 0, 300.0);
        assert_eq!(pending.offer_qty, 1);
        assert_eq!(pending.counter_qty, 0);
        assert_eq!(pending.counter_price, 0.0);
    }

    #[test]
    fn test_reset_demo_offers_round_robin() {
        let settings = CatalogSettings {
            unit_count: 300,
            seed: Some(11),
            seeded_offer_rate: 0.5,
        };
        let mut groups = generate_catalog(&settings);
        let mut rng = catalog_rng(Some(5));

        let selected = reset_demo_offers(&mut groups, 40, &mut rng);
        assert_eq!(selected.len(), 40);

        for status in OfferStatus::DEMO_ROTATION {
            let count = selected
                .iter()
                .filter(|c| c.offer.offer_status == Some(status))
                .count();
            assert_eq!(count, 10);
        }

        let active: usize = groups
            .iter()
            .flat_map(|g| &g.variants)
            .filter(|v| v.offer.offer_status.is_some())
            .count();
        assert_eq!(active, 40, "previous overlays must be cleared");
    }

    #[test]
    fn test_reset_demo_offers_caps_at_catalog_size() {
        let mut groups = fold_units(vec![
            unit("SKU-1", "iPhone 12", "MAIN", "Blue", "AT&T", 3, 400.0),
            unit("SKU-2", "iPhone 12", "MAIN", "Red", "AT&T", 4, 420.0),
        ]);
        let mut rng = catalog_rng(Some(1));
        let selected = reset_demo_offers(&mut groups, 125, &mut rng);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].model, "iPhone 12 128GB");
    }

    #[test]
    fn test_candidate_description() {
        let groups = fold_units(vec![unit(
            "SKU-1",
            "iPhone 12",
            "MAIN",
            "Blue",
            "AT&T",
            3,
            400.0,
        )]);
        let candidate = OfferCandidate::new(&groups[0], &groups[0].variants[0]);
        assert_eq!(candidate.description, "Blue AT&T");
        assert_eq!(candidate.group_id, "group-0");
        assert_eq!(candidate.manufacturer, "Apple");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(200.0), "200");
        assert_eq!(format_amount(200.5), "200.5");
        assert_eq!(format_amount(199.99), "199.99");
        assert_eq!(format_amount(0.0), "0");
    }
}
