//! Attribute taxonomy - fixed enumerations shared by the generator and the facet engine.

/// Stocking locations, in display order.
pub const WAREHOUSES: &[&str] = &["CUST3", "W23", "DLS", "MAIN", "NYC"];

/// Product categories, in display order.
pub const CATEGORIES: &[&str] = &[
    "Phones",
    "Tablets",
    "Accessories",
    "Hearables",
    "Wearables",
    "Laptops",
];

/// Cosmetic grades, in display order.
pub const GRADES: &[&str] = &["JPN B+", "DLS R", "A+", "C", "Open Box"];

/// Storage capacities offered for every model.
pub const CAPACITIES: &[&str] = &["64GB", "128GB", "256GB"];

/// Variant colors.
pub const COLORS: &[&str] = &[
    "Space Gray",
    "Silver",
    "Gold",
    "Midnight Green",
    "Blue",
    "Red",
    "Graphite",
    "Sierra Blue",
];

/// Carrier networks for networked categories.
pub const NETWORKS: &[&str] = &["Unlocked", "AT&T", "Verizon", "T-Mobile", "Sprint"];

/// Lock statuses for networked categories.
pub const LOCK_STATUSES: &[&str] = &["LOCKED", "UNLOCKED"];

/// Network placeholder for categories without a carrier.
pub const NO_NETWORK: &str = "N/A";

/// Category the generator favours.
pub const DOMINANT_CATEGORY: &str = "Phones";

/// Fallback manufacturer when no token matches.
pub const UNKNOWN_MANUFACTURER: &str = "Other";

/// Model token → manufacturer, checked in order; the first contained token wins.
pub const MANUFACTURER_TOKENS: &[(&str, &str)] = &[
    ("iPhone", "Apple"),
    ("iPad", "Apple"),
    ("MacBook", "Apple"),
    ("AirPods", "Apple"),
    ("Apple", "Apple"),
    ("Galaxy", "Samsung"),
    ("Pixel", "Google"),
    ("Surface", "Microsoft"),
    ("Dell", "Dell"),
];

const MODELS: &[(&str, &[&str])] = &[
    ("Phones", &["iPhone 12", "iPhone 13", "Galaxy S21"]),
    ("Tablets", &["iPad Air", "Galaxy Tab S7"]),
    ("Accessories", &["Case", "Screen Protector", "Charger"]),
    ("Hearables", &["AirPods Pro", "Galaxy Buds", "Pixel Buds"]),
    ("Wearables", &["Apple Watch S7"]),
    ("Laptops", &["MacBook Air", "Dell XPS 13"]),
];

/// Models stocked for a category. Unknown categories fall back to accessories.
#[must_use]
pub fn models_for(category: &str) -> &'static [&'static str] {
    MODELS
        .iter()
        .find(|(name, _)| *name == category)
        .or_else(|| MODELS.iter().find(|(name, _)| *name == "Accessories"))
        .map_or(&[], |(_, models)| *models)
}

/// Whether variants in this category carry a network and lock status.
#[must_use]
pub fn is_networked(category: &str) -> bool {
    matches!(category, "Phones" | "Tablets")
}

/// Derives the manufacturer from a model name by case-insensitive token containment.
#[must_use]
pub fn manufacturer_for(model: &str) -> &'static str {
    let lowered = model.to_lowercase();
    MANUFACTURER_TOKENS
        .iter()
        .find(|(token, _)| lowered.contains(&token.to_lowercase()))
        .map_or(UNKNOWN_MANUFACTURER, |(_, manufacturer)| *manufacturer)
}
