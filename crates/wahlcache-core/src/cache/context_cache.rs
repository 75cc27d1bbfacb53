use std::sync::Arc;

use futures::future;
use tracing::{debug, info, warn};

use crate::api::{ApiError, DataSource};
use crate::models::{Betrieb, Context, Election, StatusRecord};

use super::dataset::{BetriebeData, Dataset, StatusData, GLOBAL_SCOPE};
use super::entry::CacheEntry;
use super::store::{KeyValueStore, StoreError};
use super::Clock;

/// Storage key of the selected election.
const CONTEXT_KEY: &str = "context";

/// Outcome of [`ContextCache::preload`]: the data now available.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreloadReport {
    pub status: Vec<StatusRecord>,
    pub betriebe: Vec<Betrieb>,
}

/// The single path through which election and reference data is read.
///
/// Values are served from storage while fresh, refetched when stale, and
/// the last good value is served when a refetch fails. Concurrent refreshes
/// of one key are last-write-wins.
pub struct ContextCache {
    source: Arc<dyn DataSource>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl ContextCache {
    pub fn new(
        source: Arc<dyn DataSource>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { source, store, clock }
    }

    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    // ===== Context =====

    pub fn set_context(&self, election_id: &str, election_name: &str) -> Result<(), StoreError> {
        let context = Context::new(election_id.trim(), election_name.trim());
        let contents = serde_json::to_string(&context)
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;
        self.store.set(CONTEXT_KEY, &contents)?;
        info!(election = %context.election_id, "Context set");
        Ok(())
    }

    pub fn select_election(&self, election: &Election) -> Result<(), StoreError> {
        self.set_context(&election.id, election.display_name())
    }

    /// The selected election, or `None` when nothing (or an empty id) is stored.
    pub fn get_context(&self) -> Option<Context> {
        let raw = match self.store.get(CONTEXT_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                debug!(error = %e, "Failed to read context");
                return None;
            }
        };
        match serde_json::from_str::<Context>(&raw) {
            Ok(context) if context.is_set() => Some(context),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Failed to parse stored context");
                None
            }
        }
    }

    pub fn clear_context(&self) -> Result<(), StoreError> {
        self.store.remove(CONTEXT_KEY)
    }

    /// Scope key for reference data: the selected election, or
    /// [`GLOBAL_SCOPE`] when none is selected.
    pub fn reference_scope(&self) -> String {
        self.get_context()
            .map(|c| c.election_id)
            .unwrap_or_else(|| GLOBAL_SCOPE.to_string())
    }

    // ===== Elections =====

    /// Selectable elections. Unlike the cached datasets, failure is
    /// returned so the caller can report a connectivity problem.
    pub async fn list_elections(&self) -> Result<Vec<Election>, ApiError> {
        let elections = self.source.fetch_elections().await?;
        Ok(elections.into_iter().filter(Election::is_selectable).collect())
    }

    // ===== Datasets =====

    /// Serve `D` for `scope_key`, fetching only when absent or stale.
    ///
    /// Never fails: a failed fetch yields the stale value, or an empty
    /// list when nothing was ever fetched.
    pub async fn get<D: Dataset>(&self, scope_key: &str) -> Vec<D::Record> {
        let cached = self.load_entry::<D>(scope_key);
        if let Some(entry) = &cached {
            if entry.is_fresh(self.clock.now_millis(), D::KIND.ttl_millis()) {
                debug!(dataset = D::KIND.name(), scope = scope_key, "Cache hit");
                return entry.value.clone();
            }
        }
        self.refresh::<D>(scope_key, cached).await
    }

    /// Fetch `D` regardless of freshness, keeping the prior value on failure.
    pub async fn force_refresh<D: Dataset>(&self, scope_key: &str) -> Vec<D::Record> {
        let cached = self.load_entry::<D>(scope_key);
        self.refresh::<D>(scope_key, cached).await
    }

    /// Refresh status and make reference data available for an election.
    ///
    /// Both requests are in flight together and both settle before this
    /// returns; a failure of one does not affect the other.
    pub async fn preload(&self, election_id: &str) -> PreloadReport {
        let (status, betriebe) = future::join(
            self.force_refresh::<StatusData>(election_id),
            self.get::<BetriebeData>(election_id),
        )
        .await;

        info!(election = election_id, status = status.len(), betriebe = betriebe.len(), "Preload finished");
        PreloadReport { status, betriebe }
    }

    /// Human readable age of the cached entry, `None` when absent.
    pub fn entry_age<D: Dataset>(&self, scope_key: &str) -> Option<String> {
        self.load_entry::<D>(scope_key)
            .map(|entry| entry.age_display(self.clock.now_millis()))
    }

    async fn refresh<D: Dataset>(
        &self,
        scope_key: &str,
        cached: Option<CacheEntry<Vec<D::Record>>>,
    ) -> Vec<D::Record> {
        match D::fetch(self.source.as_ref(), scope_key).await {
            Ok(value) => {
                let entry = CacheEntry::new(value, self.clock.now_millis());
                self.save_entry::<D>(scope_key, &entry);
                debug!(dataset = D::KIND.name(), scope = scope_key, count = entry.value.len(), "Refreshed");
                entry.value
            }
            Err(e) => {
                warn!(
                    dataset = D::KIND.name(),
                    scope = scope_key,
                    error = %e,
                    has_fallback = cached.is_some(),
                    "Fetch failed, serving cached data"
                );
                cached.map(|entry| entry.value).unwrap_or_default()
            }
        }
    }

    fn load_entry<D: Dataset>(&self, scope_key: &str) -> Option<CacheEntry<Vec<D::Record>>> {
        let key = D::KIND.storage_key(scope_key);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                debug!(key = %key, error = %e, "Failed to read cache entry");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(key = %key, error = %e, "Failed to parse cache entry");
                None
            }
        }
    }

    fn save_entry<D: Dataset>(&self, scope_key: &str, entry: &CacheEntry<Vec<D::Record>>) {
        let key = D::KIND.storage_key(scope_key);
        let result = serde_json::to_string(entry)
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))
            .and_then(|contents| self.store.set(&key, &contents));
        if let Err(e) = result {
            warn!(key = %key, error = %e, "Failed to write cache entry");
        }
    }
}
