//! Consumer-side listing state.
//!
//! Holds the filter selections, the current page and facets, and the draw counter used
//! to drop out-of-order responses. A failed request leaves everything shown so far in
//! place and raises a retry flag instead.

use crate::core::catalog::Group;
use crate::core::facets::Facets;
use crate::core::query::{Dimension, FilterQuery, Page, QueryRequest, QueryResponse};
use crate::core::service::CatalogService;
use crate::core::taxonomy::DOMINANT_CATEGORY;
use crate::errors::Result;
use tracing::{debug, warn};

/// Filter, paging and result state of a catalog listing.
#[derive(Debug, Clone)]
pub struct StockListing {
    filters: FilterQuery,
    page: Page,
    next_draw: u64,
    highest_draw: u64,
    rows: Vec<Group>,
    facets: Facets,
    records_total: usize,
    records_filtered: usize,
    retry_available: bool,
}

impl StockListing {
    /// Creates an empty listing that requests `page_size` rows at a time.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: FilterQuery::default(),
            page: Page {
                offset: 0,
                limit: page_size.max(1),
            },
            next_draw: 0,
            highest_draw: 0,
            rows: Vec::new(),
            facets: Facets::default(),
            records_total: 0,
            records_filtered: 0,
            retry_available: false,
        }
    }

    /// Current filter selections.
    #[must_use]
    pub const fn filters(&self) -> &FilterQuery {
        &self.filters
    }

    /// Current page window.
    #[must_use]
    pub const fn page(&self) -> Page {
        self.page
    }

    /// Rows of the last applied response.
    #[must_use]
    pub fn rows(&self) -> &[Group] {
        &self.rows
    }

    /// Facets of the last applied response.
    #[must_use]
    pub const fn facets(&self) -> &Facets {
        &self.facets
    }

    /// Unfiltered catalog size from the last applied response.
    #[must_use]
    pub const fn records_total(&self) -> usize {
        self.records_total
    }

    /// Filtered count from the last applied response.
    #[must_use]
    pub const fn records_filtered(&self) -> usize {
        self.records_filtered
    }

    /// Whether the last request failed and may be retried.
    #[must_use]
    pub const fn retry_available(&self) -> bool {
        self.retry_available
    }

    /// Highest draw applied so far, 0 before the first response.
    #[must_use]
    pub const fn highest_draw(&self) -> u64 {
        self.highest_draw
    }

    /// Stamps a new draw and builds the request for the current state.
    pub fn next_request(&mut self) -> QueryRequest {
        self.next_draw += 1;
        QueryRequest::new(self.next_draw, &self.filters, self.page)
    }

    /// Applies a response unless a newer draw has already been applied.
    ///
    /// Returns whether the response was applied.
    pub fn apply(&mut self, response: QueryResponse) -> bool {
        if response.draw < self.highest_draw {
            debug!(
                draw = response.draw,
                highest = self.highest_draw,
                "Discarding stale catalog response"
            );
            return false;
        }
        self.highest_draw = response.draw;
        self.rows = response.data;
        self.facets = response.filter;
        self.records_total = response.records_total;
        self.records_filtered = response.records_filtered;
        self.retry_available = false;
        true
    }

    /// Records a failed request; rows and facets stay as they were.
    ///
    /// Failures of requests older than the latest applied response are ignored.
    pub fn fail(&mut self, draw: u64) {
        if draw < self.highest_draw {
            return;
        }
        warn!(draw, "Catalog request failed, retry available");
        self.retry_available = true;
    }

    /// Issues a request for the current state and applies or fails it.
    ///
    /// Returns whether the response was applied.
    ///
    /// # Errors
    /// Propagates the service's transport error after marking the listing retryable.
    pub async fn refresh(&mut self, service: &CatalogService) -> Result<bool> {
        let request = self.next_request();
        let draw = request.draw();
        match service.fetch(&request).await {
            Ok(response) => Ok(self.apply(response)),
            Err(e) => {
                self.fail(draw);
                Err(e)
            }
        }
    }

    fn cascade_clears(&mut self, dimension: Dimension) {
        match dimension {
            Dimension::Category
                if !self
                    .filters
                    .selected(Dimension::Category)
                    .iter()
                    .any(|c| c == DOMINANT_CATEGORY) =>
            {
                self.filters.clear_dimension(Dimension::Manufacturer);
                self.filters.clear_dimension(Dimension::Model);
            }
            Dimension::Manufacturer if self.filters.selected(Dimension::Manufacturer).is_empty() => {
                self.filters.clear_dimension(Dimension::Model);
            }
            _ => {}
        }
    }

    /// Checks or unchecks a facet value. Returns whether it is now selected.
    pub fn toggle_filter(&mut self, dimension: Dimension, value: &str) -> bool {
        let selected = self.filters.selected(dimension).iter().any(|v| v == value);
        if selected {
            self.filters.deselect(dimension, value);
        } else {
            self.filters.select(dimension, value);
        }
        self.cascade_clears(dimension);
        self.page.offset = 0;
        !selected
    }

    /// Unchecks a facet value (the active-filter chip's remove action).
    pub fn remove_filter(&mut self, dimension: Dimension, value: &str) {
        self.filters.deselect(dimension, value);
        self.cascade_clears(dimension);
        self.page.offset = 0;
    }

    /// Switches whether out-of-stock groups are listed.
    pub fn set_include_out_of_stock(&mut self, include: bool) {
        self.filters.include_out_of_stock = include;
        self.page.offset = 0;
    }

    /// Replaces the search term.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filters.search = term.into();
        self.page.offset = 0;
    }

    /// Drops every selection, the search term and the out-of-stock switch.
    pub fn clear_filters(&mut self) {
        self.filters = FilterQuery::default();
        self.page.offset = 0;
    }

    /// Moves forward one page if more rows exist. Returns whether it moved.
    pub fn next_page(&mut self) -> bool {
        if self.page.offset + self.page.limit < self.records_filtered {
            self.page.offset += self.page.limit;
            true
        } else {
            false
        }
    }

    /// Moves back one page unless already on the first. Returns whether it moved.
    pub fn prev_page(&mut self) -> bool {
        if self.page.offset > 0 {
            self.page.offset = self.page.offset.saturating_sub(self.page.limit);
            true
        } else {
            false
        }
    }
}
