//! Simulated catalog service.
//!
//! Wraps the query engine in a fixed artificial latency and can be told to fail the
//! next request, so consumers exercise both the success and the failure path.

use crate::config::AppConfig;
use crate::core::catalog::{self, Group, OfferCandidate};
use crate::core::query::{self, QueryRequest, QueryResponse};
use crate::errors::{Error, Result};
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

#[derive(Debug)]
struct CatalogState {
    groups: Vec<Group>,
    rng: StdRng,
}

/// Owns the generated catalog and answers queries after a delay.
#[derive(Debug)]
pub struct CatalogService {
    state: RwLock<CatalogState>,
    latency: Duration,
    fail_next: AtomicBool,
}

impl CatalogService {
    /// Wraps an existing catalog.
    #[must_use]
    pub fn new(groups: Vec<Group>, latency: Duration, rng: StdRng) -> Self {
        Self {
            state: RwLock::new(CatalogState { groups, rng }),
            latency,
            fail_next: AtomicBool::new(false),
        }
    }

    /// Generates a catalog from the application settings.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let groups = catalog::generate_catalog(&config.catalog);
        // Offset the seed so the reset draws differ from the generator's.
        let rng = catalog::catalog_rng(config.catalog.seed.map(|seed| seed.wrapping_add(1)));
        Self::new(groups, config.query.latency(), rng)
    }

    /// Makes the next [`fetch`](Self::fetch) fail with a transport error.
    pub fn fail_next_request(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Answers `request` after the configured latency.
    ///
    /// # Errors
    /// Returns [`Error::Transport`] when a failure was injected with
    /// [`fail_next_request`](Self::fail_next_request).
    #[instrument(skip(self, request), fields(draw = request.draw()))]
    pub async fn fetch(&self, request: &QueryRequest) -> Result<QueryResponse> {
        tokio::time::sleep(self.latency).await;

        if self.fail_next.swap(false, Ordering::SeqCst) {
            warn!("Simulated transport failure");
            return Err(Error::Transport {
                message: format!("catalog request {} failed", request.draw()),
            });
        }

        let state = self.state.read().await;
        Ok(query::handle_request(&state.groups, request))
    }

    /// Clears every offer overlay and seeds `count` random variants with active
    /// statuses. Returns the seeded variants for import into the offer store.
    #[instrument(skip(self))]
    pub async fn reset_demo_offers(&self, count: usize) -> Vec<OfferCandidate> {
        let mut state = self.state.write().await;
        let CatalogState { groups, rng } = &mut *state;
        let seeded = catalog::reset_demo_offers(groups, count, rng);
        info!("Demo offers reset: {} variants seeded", seeded.len());
        seeded
    }

    /// Copy of the current catalog.
    pub async fn groups(&self) -> Vec<Group> {
        self.state.read().await.groups.clone()
    }

    /// Number of groups in the catalog.
    pub async fn total(&self) -> usize {
        self.state.read().await.groups.len()
    }

    /// Looks up a group by identifier.
    pub async fn group(&self, id: &str) -> Option<Group> {
        self.state
            .read()
            .await
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
    }

    /// Every variant currently carrying a seller-side status, as offer candidates.
    pub async fn active_candidates(&self) -> Vec<OfferCandidate> {
        let state = self.state.read().await;
        state
            .groups
            .iter()
            .flat_map(|group| {
                group
                    .variants
                    .iter()
                    .filter(|v| !catalog::is_draft(v.offer.offer_status))
                    .map(move |v| OfferCandidate::new(group, v))
            })
            .collect()
    }
}
