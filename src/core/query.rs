//! Catalog query engine - filtering, sorting and pagination of display groups.
//!
//! Group-level dimensions match exactly against the group's own value. Variant-level
//! dimensions (color, network, lock status) keep a group when any one of its variants
//! carries a selected value. Search and the out-of-stock switch are global filters
//! applied before everything else, including facet counting (see [`crate::core::facets`]).

use crate::core::catalog::{Group, Variant};
use crate::core::facets::{self, Facets};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Rows returned when the request names no usable page length.
pub const DEFAULT_PAGE_LENGTH: usize = 25;

/// A filterable attribute of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    /// Product category
    Category,
    /// Stocking location
    Warehouse,
    /// Cosmetic grade
    Grade,
    /// Manufacturer
    Manufacturer,
    /// Raw model name (without capacity)
    Model,
    /// Storage capacity
    Capacity,
    /// Variant color
    Color,
    /// Variant carrier network
    Network,
    /// Variant lock status
    LockStatus,
}

impl Dimension {
    /// Every dimension, in request field order.
    pub const ALL: [Self; 9] = [
        Self::Category,
        Self::Warehouse,
        Self::Manufacturer,
        Self::Model,
        Self::Grade,
        Self::Capacity,
        Self::Color,
        Self::Network,
        Self::LockStatus,
    ];

    /// Wire name of the dimension.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Warehouse => "warehouse",
            Self::Grade => "grade",
            Self::Manufacturer => "manufacturer",
            Self::Model => "model",
            Self::Capacity => "capacity",
            Self::Color => "color",
            Self::Network => "network",
            Self::LockStatus => "lockStatus",
        }
    }

    /// Whether the dimension is matched against variants rather than the group.
    #[must_use]
    pub const fn is_variant_level(self) -> bool {
        matches!(self, Self::Color | Self::Network | Self::LockStatus)
    }

    /// The group's own value for a group-level dimension.
    #[must_use]
    pub fn group_value(self, group: &Group) -> Option<&str> {
        match self {
            Self::Category => Some(&group.category),
            Self::Warehouse => Some(&group.warehouse),
            Self::Grade => Some(&group.grade),
            Self::Manufacturer => Some(&group.manufacturer),
            Self::Model => Some(&group.raw_model),
            Self::Capacity => Some(&group.capacity),
            Self::Color | Self::Network | Self::LockStatus => None,
        }
    }

    /// A variant's value for a variant-level dimension.
    #[must_use]
    pub fn variant_value(self, variant: &Variant) -> Option<&str> {
        match self {
            Self::Color => Some(&variant.color),
            Self::Network => Some(&variant.network),
            Self::LockStatus => variant.lock_status.as_deref(),
            _ => None,
        }
    }

    /// Whether `group` satisfies a selection on this dimension. An empty selection
    /// is unconstrained.
    #[must_use]
    pub fn matches(self, group: &Group, selected: &[String]) -> bool {
        if selected.is_empty() {
            return true;
        }
        let is_selected = |value: Option<&str>| value.is_some_and(|v| selected.iter().any(|s| s == v));
        if self.is_variant_level() {
            group
                .variants
                .iter()
                .any(|variant| is_selected(self.variant_value(variant)))
        } else {
            is_selected(self.group_value(group))
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDimension(pub String);

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownDimension(s.to_string()))
    }
}

/// Per-dimension selections plus the global search and stock switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    selections: BTreeMap<Dimension, Vec<String>>,
    /// Case-insensitive substring matched against the display model
    pub search: String,
    /// Keep groups whose aggregate quantity is 0
    pub include_out_of_stock: bool,
}

impl FilterQuery {
    /// Values currently selected on `dimension`.
    #[must_use]
    pub fn selected(&self, dimension: Dimension) -> &[String] {
        self.selections.get(&dimension).map_or(&[], Vec::as_slice)
    }

    /// Adds `value` to the selection; duplicates are ignored.
    pub fn select(&mut self, dimension: Dimension, value: impl Into<String>) {
        let value = value.into();
        let values = self.selections.entry(dimension).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// Removes `value` from the selection.
    pub fn deselect(&mut self, dimension: Dimension, value: &str) {
        if let Some(values) = self.selections.get_mut(&dimension) {
            values.retain(|v| v != value);
            if values.is_empty() {
                self.selections.remove(&dimension);
            }
        }
    }

    /// Replaces the whole selection on `dimension`.
    pub fn set(&mut self, dimension: Dimension, values: Vec<String>) {
        if values.is_empty() {
            self.selections.remove(&dimension);
        } else {
            self.selections.insert(dimension, values);
        }
    }

    /// Drops every selection on `dimension`.
    pub fn clear_dimension(&mut self, dimension: Dimension) {
        self.selections.remove(&dimension);
    }

    /// Every non-empty selection, in dimension order.
    pub fn active_selections(&self) -> impl Iterator<Item = (Dimension, &str)> {
        self.selections
            .iter()
            .flat_map(|(d, values)| values.iter().map(move |v| (*d, v.as_str())))
    }

    /// Search and out-of-stock filters, shared by every facet.
    #[must_use]
    pub fn matches_global(&self, group: &Group) -> bool {
        if !self.include_out_of_stock && group.quantity == 0 {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        group
            .model
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }

    /// Selection on a single dimension.
    #[must_use]
    pub fn matches_dimension(&self, group: &Group, dimension: Dimension) -> bool {
        dimension.matches(group, self.selected(dimension))
    }

    /// Global filters and every dimension selection.
    #[must_use]
    pub fn matches(&self, group: &Group) -> bool {
        self.matches_global(group)
            && self
                .selections
                .iter()
                .all(|(dimension, values)| dimension.matches(group, values))
    }
}

/// Offset and limit applied after filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Rows to skip
    pub offset: usize,
    /// Rows to return
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LENGTH,
        }
    }
}

/// Engine-level answer to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Groups on the requested page
    pub page: Vec<Group>,
    /// Size of the unfiltered catalog
    pub total_count: usize,
    /// Matches before pagination
    pub filtered_count: usize,
    /// Facet counts under the cascade rules
    pub facets: Facets,
}

/// Case-insensitive ordering with lowercase sorting ahead of uppercase on ties.
#[must_use]
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Filters, sorts and paginates `groups`, and computes facet counts.
///
/// An offset past the end yields an empty page.
#[must_use]
pub fn query(groups: &[Group], filters: &FilterQuery, page: Page) -> QueryResult {
    let mut matched: Vec<&Group> = groups.iter().filter(|g| filters.matches(g)).collect();
    matched.sort_by(|a, b| locale_cmp(&a.model, &b.model));

    let rows = matched
        .iter()
        .skip(page.offset)
        .take(page.limit)
        .map(|g| (*g).clone())
        .collect();

    QueryResult {
        page: rows,
        total_count: groups.len(),
        filtered_count: matched.len(),
        facets: facets::compute_facets(groups, filters),
    }
}

/// Query request as sent by the listing.
///
/// Deserialisation is lenient: unknown keys are ignored, counts may be numbers or
/// numeric strings, `includeOos` accepts `true` or `"true"`, and a dimension given
/// as a single string is treated as a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryRequest {
    /// Sequence stamp echoed back for staleness detection
    #[serde(deserialize_with = "lenient_count")]
    pub draw: Option<u64>,
    /// Offset into the filtered result
    #[serde(deserialize_with = "lenient_count")]
    pub start: Option<u64>,
    /// Page length
    #[serde(deserialize_with = "lenient_count")]
    pub length: Option<u64>,
    /// Category selection
    #[serde(deserialize_with = "lenient_list")]
    pub category: Vec<String>,
    /// Warehouse selection
    #[serde(deserialize_with = "lenient_list")]
    pub warehouse: Vec<String>,
    /// Manufacturer selection
    #[serde(deserialize_with = "lenient_list")]
    pub manufacturer: Vec<String>,
    /// Raw model selection
    #[serde(deserialize_with = "lenient_list")]
    pub model: Vec<String>,
    /// Grade selection
    #[serde(deserialize_with = "lenient_list")]
    pub grade: Vec<String>,
    /// Capacity selection
    #[serde(deserialize_with = "lenient_list")]
    pub capacity: Vec<String>,
    /// Color selection
    #[serde(deserialize_with = "lenient_list")]
    pub color: Vec<String>,
    /// Network selection
    #[serde(deserialize_with = "lenient_list")]
    pub network: Vec<String>,
    /// Lock status selection
    #[serde(deserialize_with = "lenient_list")]
    pub lock_status: Vec<String>,
    /// Include groups with zero stock
    #[serde(deserialize_with = "lenient_bool")]
    pub include_oos: bool,
    /// Free-text model search
    pub search: Option<String>,
}

impl QueryRequest {
    /// Builds the wire form of a filter state.
    #[must_use]
    pub fn new(draw: u64, filters: &FilterQuery, page: Page) -> Self {
        let list = |d: Dimension| filters.selected(d).to_vec();
        Self {
            draw: Some(draw),
            start: Some(page.offset as u64),
            length: Some(page.limit as u64),
            category: list(Dimension::Category),
            warehouse: list(Dimension::Warehouse),
            manufacturer: list(Dimension::Manufacturer),
            model: list(Dimension::Model),
            grade: list(Dimension::Grade),
            capacity: list(Dimension::Capacity),
            color: list(Dimension::Color),
            network: list(Dimension::Network),
            lock_status: list(Dimension::LockStatus),
            include_oos: filters.include_out_of_stock,
            search: (!filters.search.is_empty()).then(|| filters.search.clone()),
        }
    }

    fn list(&self, dimension: Dimension) -> &[String] {
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

    /// Draw stamp, defaulting to 1.
    #[must_use]
    pub fn draw(&self) -> u64 {
        self.draw.unwrap_or(1)
    }

    /// Filter state carried by the request.
    #[must_use]
    pub fn filters(&self) -> FilterQuery {
        let mut filters = FilterQuery {
            search: self.search.clone().unwrap_or_default(),
            include_out_of_stock: self.include_oos,
            ..FilterQuery::default()
        };
        for dimension in Dimension::ALL {
            filters.set(dimension, self.list(dimension).to_vec());
        }
        filters
    }

    /// Requested page; a missing or zero length falls back to [`DEFAULT_PAGE_LENGTH`].
    #[must_use]
    pub fn page(&self) -> Page {
        let to_usize = |n: u64| usize::try_from(n).unwrap_or(usize::MAX);
        Page {
            offset: self.start.map_or(0, to_usize),
            limit: self
                .length
                .filter(|n| *n > 0)
                .map_or(DEFAULT_PAGE_LENGTH, to_usize),
        }
    }
}

/// Wire response to a [`QueryRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Echo of the request's draw stamp
    pub draw: u64,
    /// Size of the unfiltered catalog
    pub records_total: usize,
    /// Matches before pagination
    pub records_filtered: usize,
    /// Current page of groups
    pub data: Vec<Group>,
    /// Facet counts per dimension
    pub filter: Facets,
}

/// Answers a wire request against `groups`.
#[must_use]
pub fn handle_request(groups: &[Group], request: &QueryRequest) -> QueryResponse {
    let result = query(groups, &request.filters(), request.page());
    debug!(
        draw = request.draw(),
        filtered = result.filtered_count,
        returned = result.page.len(),
        "Answered catalog query"
    );
    QueryResponse {
        draw: request.draw(),
        records_total: result.total_count,
        records_filtered: result.filtered_count,
        data: result.page,
        filter: result.facets,
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s == "true",
        _ => false,
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}
