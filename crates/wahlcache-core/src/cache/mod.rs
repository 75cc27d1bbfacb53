//! Client-side caching with stale-while-revalidate semantics.
//!
//! `ContextCache` holds the selected election and serves two datasets:
//! - Betriebe: reference data, fresh for 15 minutes
//! - Status: per-election submission status, fresh for 30 seconds
//!
//! Entries live in a `KeyValueStore` (in memory or one JSON file per key)
//! and survive restarts when the file store is used. Fetch failures fall
//! back to the last cached value.

pub mod clock;
pub mod context_cache;
pub mod dataset;
pub mod entry;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, SystemClock};
pub use context_cache::{ContextCache, PreloadReport};
pub use dataset::{BetriebeData, Dataset, DatasetKind, StatusData, GLOBAL_SCOPE};
pub use entry::CacheEntry;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
