//! Facet counting under the cascade rules.
//!
//! Every dimension's counts are taken over the *base set* (groups passing the global
//! search and out-of-stock filters), narrowed by the selections of the dimensions its
//! rule lists in `scope`. A dimension never narrows its own counts, so switching between
//! siblings always shows what each alternative would yield.

use crate::core::catalog::Group;
use crate::core::query::{Dimension, FilterQuery};
use crate::core::taxonomy::{CATEGORIES, GRADES, NO_NETWORK, WAREHOUSES};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use Dimension::{
    Capacity, Category, Color, Grade, LockStatus, Manufacturer, Model, Network, Warehouse,
};

/// One value of a dimension and how many groups carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    /// Dimension value
    pub label: String,
    /// Number of groups
    pub count: usize,
}

/// Facet lists for every dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Facets {
    pub category: Vec<FacetCount>,
    pub warehouse: Vec<FacetCount>,
    pub grade: Vec<FacetCount>,
    pub manufacturer: Vec<FacetCount>,
    /// Counted by raw model
    pub model: Vec<FacetCount>,
    pub capacity: Vec<FacetCount>,
    pub color: Vec<FacetCount>,
    /// `N/A` is never listed
    pub network: Vec<FacetCount>,
    pub lock_status: Vec<FacetCount>,
}

impl Facets {
    /// The facet list for `dimension`.
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> &[FacetCount] {
        match dimension {
            Dimension::Category => &self.category,
            Dimension::Warehouse => &self.warehouse,
            Dimension::Grade => &self.grade,
            Dimension::Manufacturer => &self.manufacturer,
            Dimension::Model => &self.model,
            Dimension::Capacity => &self.capacity,
            Dimension::Color => &self.color,
            Dimension::Network => &self.network,
            Dimension::LockStatus => &self.lock_status,
        }
    }

    fn slot(&mut self, dimension: Dimension) -> &mut Vec<FacetCount> {
        match dimension {
            Dimension::Category => &mut self.category,
            Dimension::Warehouse => &mut self.warehouse,
            Dimension::Grade => &mut self.grade,
            Dimension::Manufacturer => &mut self.manufacturer,
            Dimension::Model => &mut self.model,
            Dimension::Capacity => &mut self.capacity,
            Dimension::Color => &mut self.color,
            Dimension::Network => &mut self.network,
            Dimension::LockStatus => &mut self.lock_status,
        }
    }

    /// Count for a single value, 0 when absent.
    #[must_use]
    pub fn count(&self, dimension: Dimension, label: &str) -> usize {
        self.get(dimension)
            .iter()
            .find(|f| f.label == label)
            .map_or(0, |f| f.count)
    }

    /// Sum of all counts in a dimension.
    #[must_use]
    pub fn total(&self, dimension: Dimension) -> usize {
        self.get(dimension).iter().map(|f| f.count).sum()
    }
}

/// How a facet list is ordered and which labels it shows.
#[derive(Debug, Clone, Copy)]
enum Ordering {
    /// Every taxonomy value in taxonomy order, zero counts included
    Taxonomy(&'static [&'static str]),
    /// Observed values by code point
    Lexical,
    /// Observed values by leading integer (`64GB` < `128GB`)
    Numeric,
}

#[derive(Debug, Clone, Copy)]
struct FacetRule {
    dimension: Dimension,
    scope: &'static [Dimension],
    ordering: Ordering,
}

const CASCADE: &[FacetRule] = &[
    FacetRule {
        dimension: Category,
        scope: &[Warehouse],
        ordering: Ordering::Taxonomy(CATEGORIES),
    },
    FacetRule {
        dimension: Warehouse,
        scope: &[Category],
        ordering: Ordering::Taxonomy(WAREHOUSES),
    },
    FacetRule {
        dimension: Grade,
        scope: &[Category, Warehouse],
        ordering: Ordering::Taxonomy(GRADES),
    },
    FacetRule {
        dimension: Manufacturer,
        scope: &[Category, Warehouse, Grade],
        ordering: Ordering::Lexical,
    },
    FacetRule {
        dimension: Model,
        scope: &[Category, Warehouse, Grade, Manufacturer],
        ordering: Ordering::Lexical,
    },
    FacetRule {
        dimension: Capacity,
        scope: &[],
        ordering: Ordering::Numeric,
    },
    FacetRule {
        dimension: Color,
        scope: &[],
        ordering: Ordering::Lexical,
    },
    FacetRule {
        dimension: Network,
        scope: &[],
        ordering: Ordering::Lexical,
    },
    FacetRule {
        dimension: LockStatus,
        scope: &[],
        ordering: Ordering::Lexical,
    },
];

fn leading_number(label: &str) -> u64 {
    let digits: String = label.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Values a group contributes to a dimension, each counted once per group.
fn group_labels(group: &Group, dimension: Dimension) -> BTreeSet<&str> {
    if dimension.is_variant_level() {
        group
            .variants
            .iter()
            .filter_map(|v| dimension.variant_value(v))
            .filter(|value| !(dimension == Network && *value == NO_NETWORK))
            .collect()
    } else {
        dimension.group_value(group).into_iter().collect()
    }
}

fn count_rule(base: &[&Group], filters: &FilterQuery, rule: &FacetRule) -> Vec<FacetCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for group in base
        .iter()
        .filter(|g| rule.scope.iter().all(|d| filters.matches_dimension(g, *d)))
    {
        for label in group_labels(group, rule.dimension) {
            *counts.entry(label).or_default() += 1;
        }
    }

    let to_facet = |(label, count): (&str, usize)| FacetCount {
        label: label.to_string(),
        count,
    };
    match rule.ordering {
        Ordering::Taxonomy(values) => values
            .iter()
            .map(|&v| to_facet((v, counts.get(v).copied().unwrap_or(0))))
            .collect(),
        Ordering::Lexical => counts.into_iter().map(to_facet).collect(),
        Ordering::Numeric => {
            let mut facets: Vec<FacetCount> = counts.into_iter().map(to_facet).collect();
            facets.sort_by_key(|f| leading_number(&f.label));
            facets
        }
    }
}

/// Computes every facet list for `filters` over the full catalog.
#[must_use]
pub fn compute_facets(groups: &[Group], filters: &FilterQuery) -> Facets {
    let base: Vec<&Group> = groups.iter().filter(|g| filters.matches_global(g)).collect();
    let mut facets = Facets::default();
    for rule in CASCADE {
        *facets.slot(rule.dimension) = count_rule(&base, filters, rule);
    }
    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{fold_units, generate_catalog};
    use crate::config::CatalogSettings;
    use crate::test_utils::unit;

    fn catalog() -> Vec<Group> {
        let mut locked = unit("SKU-5", "iPhone 12", "DLS", "Red", "Verizon", 2, 420.0);
        locked.lock_status = Some("LOCKED".to_string());
        let mut big = unit("SKU-6", "Galaxy S21", "MAIN", "Blue", "AT&T", 1, 600.0);
        big.capacity = "256GB".to_string();
        let mut small = unit("SKU-7", "iPad Air", "MAIN", "Gold", "Sprint", 1, 300.0);
        small.capacity = "64GB".to_string();
        let mut graded = unit("SKU-8", "AirPods Pro", "W23", "Silver", "N/A", 1, 150.0);
        graded.grade = "C".to_string();
        fold_units(vec![
            unit("SKU-1", "iPhone 12", "MAIN", "Blue", "AT&T", 3, 400.0),
            unit("SKU-2", "iPhone 12", "MAIN", "Red", "AT&T", 4, 420.0),
            unit("SKU-3", "iPhone 13", "MAIN", "Blue", "Verizon", 0, 500.0),
            unit("SKU-4", "Galaxy S21", "W23", "Blue", "Verizon", 5, 510.0),
            locked,
            big,
            small,
            graded,
        ])
    }

    #[test]
    fn test_taxonomy_facets_list_zero_counts_in_order() {
        let facets = compute_facets(&catalog(), &FilterQuery::default());
        let labels: Vec<&str> = facets.warehouse.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, WAREHOUSES);
        assert_eq!(facets.count(Warehouse, "CUST3"), 0);
        // iPhone 13 is out of stock and excluded from the base set.
        assert_eq!(facets.count(Warehouse, "MAIN"), 3);
        assert_eq!(facets.count(Warehouse, "W23"), 2);
        assert_eq!(facets.grade.len(), GRADES.len());
        assert_eq!(facets.count(Category, "Phones"), 4);
    }

    #[test]
    fn test_own_dimension_does_not_narrow_itself() {
        let mut filters = FilterQuery::default();
        filters.select(Category, "Tablets");
        let facets = compute_facets(&catalog(), &filters);
        assert_eq!(facets.count(Category, "Phones"), 4);
        assert_eq!(facets.count(Category, "Tablets"), 1);
        // Warehouse is narrowed by Category.
        assert_eq!(facets.count(Warehouse, "MAIN"), 1);
        assert_eq!(facets.count(Warehouse, "DLS"), 0);
    }

    #[test]
    fn test_category_counts_follow_warehouse() {
        let mut filters = FilterQuery::default();
        filters.select(Warehouse, "W23");
        let facets = compute_facets(&catalog(), &filters);
        assert_eq!(facets.count(Category, "Phones"), 1);
        assert_eq!(facets.count(Category, "Hearables"), 1);
        assert_eq!(facets.count(Warehouse, "MAIN"), 3);
    }

    #[test]
    fn test_manufacturer_and_model_cascade() {
        let mut filters = FilterQuery::default();
        filters.select(Grade, "C");
        let facets = compute_facets(&catalog(), &filters);
        assert_eq!(facets.manufacturer, vec![FacetCount {
            label: "Apple".to_string(),
            count: 1
        }]);

        let mut filters = FilterQuery::default();
        filters.select(Manufacturer, "Samsung");
        let facets = compute_facets(&catalog(), &filters);
        // Manufacturer is not narrowed by its own selection, Model is.
        assert_eq!(facets.count(Manufacturer, "Apple"), 4);
        let models: Vec<&str> = facets.model.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(models, vec!["Galaxy S21"]);
        assert_eq!(facets.count(Model, "Galaxy S21"), 2);
    }

    #[test]
    fn test_capacity_ignores_selections_and_sorts_numerically() {
        let mut filters = FilterQuery::default();
        filters.select(Warehouse, "W23");
        filters.select(Category, "Hearables");
        let facets = compute_facets(&catalog(), &filters);
        let labels: Vec<&str> = facets.capacity.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["64GB", "128GB", "256GB"]);
        assert_eq!(facets.count(Capacity, "128GB"), 4);
    }

    #[test]
    fn test_variant_facets_count_groups_once() {
        let facets = compute_facets(&catalog(), &FilterQuery::default());
        // The MAIN iPhone 12 group has a Blue and a Red variant: one increment each.
        assert_eq!(facets.count(Color, "Blue"), 3);
        assert_eq!(facets.count(Color, "Red"), 2);
        assert_eq!(facets.count(Network, "AT&T"), 2);
        assert_eq!(facets.count(Network, "N/A"), 0);
        assert!(facets.network.iter().all(|f| f.label != "N/A"));
        assert_eq!(facets.count(LockStatus, "LOCKED"), 1);
        assert_eq!(facets.count(LockStatus, "UNLOCKED"), 4);
        let colors: Vec<&str> = facets.color.iter().map(|f| f.label.as_str()).collect();
        let mut sorted = colors.clone();
        sorted.sort_unstable();
        assert_eq!(colors, sorted);
    }

    #[test]
    fn test_search_and_stock_narrow_every_facet() {
        let mut filters = FilterQuery::default();
        filters.search = "iphone".to_string();
        let facets = compute_facets(&catalog(), &filters);
        assert_eq!(facets.total(Capacity), 2);
        assert_eq!(facets.total(Category), 2);

        filters.include_out_of_stock = true;
        let facets = compute_facets(&catalog(), &filters);
        assert_eq!(facets.total(Capacity), 3);
    }

    #[test]
    fn test_upstream_narrowing_is_monotone() {
        let groups = generate_catalog(&CatalogSettings {
            unit_count: 400,
            seed: Some(21),
            seeded_offer_rate: 0.0,
        });
        let loose = FilterQuery::default();
        let loose_facets = compute_facets(&groups, &loose);

        for warehouse in WAREHOUSES {
            let mut strict = FilterQuery::default();
            strict.select(Warehouse, *warehouse);
            let strict_facets = compute_facets(&groups, &strict);
            for dimension in [Category, Grade, Manufacturer, Model] {
                assert!(
                    strict_facets.total(dimension) <= loose_facets.total(dimension),
                    "{dimension} grew under {warehouse}"
                );
            }

            for grade in GRADES {
                let mut stricter = strict.clone();
                stricter.select(Grade, *grade);
                let stricter_facets = compute_facets(&groups, &stricter);
                for dimension in [Manufacturer, Model] {
                    assert!(stricter_facets.total(dimension) <= strict_facets.total(dimension));
                }
            }
        }
    }

    #[test]
    fn test_facets_serialize_camel_case() {
        let json = serde_json::to_value(Facets::default()).unwrap_or_default();
        assert!(json.get("lockStatus").is_some());
        assert!(json.get("lock_status").is_none());
    }
}
