use super::{DynMediaStore, FetchOutcome, MediaItem};
use std::collections::HashSet;
use tracing::{debug, error};

/// Fetches the full media list for one gallery namespace.
///
/// One attempt per call, no retry. Failures are logged here and come back as
/// `FetchOutcome::FetchFailed`, never as an error.
#[derive(Clone)]
pub struct MediaSource {
    store: DynMediaStore,
    max_results: usize,
}

impl MediaSource {
    pub fn new(store: DynMediaStore) -> Self {
        Self {
            store,
            max_results: super::DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn store(&self) -> &DynMediaStore {
        &self.store
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// `max_results` overrides the source-wide cap for galleries that hold
    /// more than the usual number of items.
    pub async fn fetch_all(&self, namespace: &str, max_results: Option<usize>) -> FetchOutcome {
        let max_results = max_results.unwrap_or(self.max_results);
        match self.store.search(namespace, max_results).await {
            Ok(items) => {
                let items = dedupe_by_id(items);
                debug!(
                    "Fetched {} items for namespace '{}' from {}",
                    items.len(),
                    namespace,
                    self.store.name()
                );
                FetchOutcome::from_items(items)
            }
            Err(e) => {
                error!(
                    "Failed to fetch media for namespace '{}' from {}: {}",
                    namespace,
                    self.store.name(),
                    e
                );
                FetchOutcome::FetchFailed(e.to_string())
            }
        }
    }
}

/// Ids must be unique within one gallery; the first occurrence wins.
fn dedupe_by_id(items: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}
