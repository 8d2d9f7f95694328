/// Fixed attribute enumerations shared by the generator and the facet engine
pub mod taxonomy;

/// Synthetic inventory generation and grouping
pub mod catalog;

/// Filtering, sorting and pagination of display groups
pub mod query;

/// Facet counts under the cascade rules
pub mod facets;

/// Simulated catalog service with artificial latency
pub mod service;

/// Consumer-side listing state with stale-response rejection
pub mod listing;

/// Input coalescing for search
pub mod debounce;

/// Offer records and the lifecycle operations on them
pub mod offers;

/// Offer snapshot persistence
pub mod snapshot;

/// Persistent, observable offer store
pub mod offer_store;

/// Cart views over the offer book
pub mod cart;
