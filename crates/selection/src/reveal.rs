//! Progressive disclosure of the filtered partner list.
//!
//! The reveal window is a prefix of the current filtered catalog's
//! partners, grown one page at a time. `load_more` sits behind a
//! simulated-latency async boundary: a loading flag drops re-entrant
//! calls, and an epoch counter discards results whose originating view
//! was superseded by a filter change.

use offerlink_core::config::RevealConfig;
use offerlink_core::types::{Catalog, Partner};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Result of a `load_more` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The window grew by one page.
    Advanced,
    /// Everything was already visible.
    NoMore,
    /// Another load was in flight; this call was dropped.
    Ignored,
    /// The filter changed while loading; the stale result was discarded.
    Superseded,
}

struct RevealInner {
    catalog: Catalog,
    /// 1-based count of revealed pages.
    page: usize,
    loading: bool,
    epoch: u64,
}

pub struct RevealState {
    inner: Mutex<RevealInner>,
    page_size: usize,
    load_latency: Duration,
}

impl RevealState {
    pub fn new(catalog: Catalog, config: &RevealConfig) -> Self {
        Self {
            inner: Mutex::new(RevealInner {
                catalog,
                page: 1,
                loading: false,
                epoch: 0,
            }),
            page_size: config.partners_per_page.max(1),
            load_latency: Duration::from_millis(config.load_latency_ms),
        }
    }

    /// The currently revealed prefix of the filtered partner list.
    pub fn visible_partners(&self) -> Vec<Partner> {
        let inner = self.inner.lock().expect("reveal mutex poisoned");
        let end = (inner.page * self.page_size).min(inner.catalog.partners.len());
        inner.catalog.partners[..end].to_vec()
    }

    pub fn visible_count(&self) -> usize {
        let inner = self.inner.lock().expect("reveal mutex poisoned");
        (inner.page * self.page_size).min(inner.catalog.partners.len())
    }

    pub fn has_more(&self) -> bool {
        let inner = self.inner.lock().expect("reveal mutex poisoned");
        inner.page * self.page_size < inner.catalog.partners.len()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().expect("reveal mutex poisoned").loading
    }

    pub fn page(&self) -> usize {
        self.inner.lock().expect("reveal mutex poisoned").page
    }

    /// Reveal the next page. Calls arriving while a load is in flight
    /// are dropped, not queued; a stale load whose filter view changed
    /// underneath it leaves the window untouched.
    pub async fn load_more(&self) -> LoadOutcome {
        let started_epoch = {
            let mut inner = self.inner.lock().expect("reveal mutex poisoned");
            if inner.loading {
                return LoadOutcome::Ignored;
            }
            if inner.page * self.page_size >= inner.catalog.partners.len() {
                return LoadOutcome::NoMore;
            }
            inner.loading = true;
            inner.epoch
        };

        // Simulated fetch latency; pagination is over an in-memory
        // collection, so the slice itself is synchronous.
        tokio::time::sleep(self.load_latency).await;

        let mut inner = self.inner.lock().expect("reveal mutex poisoned");
        inner.loading = false;
        if inner.epoch != started_epoch {
            debug!("Stale load_more result dropped after filter change");
            return LoadOutcome::Superseded;
        }
        inner.page += 1;
        debug!(page = inner.page, "Reveal window advanced");
        LoadOutcome::Advanced
    }

    /// Swap in a freshly filtered catalog and rewind to the first page.
    /// Any in-flight `load_more` becomes stale: a filter change always
    /// wins.
    pub fn reset_paging(&self, catalog: Catalog) {
        let mut inner = self.inner.lock().expect("reveal mutex poisoned");
        inner.catalog = catalog;
        inner.page = 1;
        inner.epoch += 1;
    }
}
