use std::fmt;

use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};

use crate::api::{ApiError, DataSource};
use crate::models::{Betrieb, StatusRecord};

/// Scope key for datasets that do not depend on the election.
pub const GLOBAL_SCOPE: &str = "global";

/// Reference data changes rarely.
const BETRIEBE_TTL_MILLIS: i64 = 15 * 60 * 1000;

/// Status changes often while an election is running.
const STATUS_TTL_MILLIS: i64 = 30 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Betriebe,
    Status,
}

impl DatasetKind {
    pub fn ttl_millis(&self) -> i64 {
        match self {
            DatasetKind::Betriebe => BETRIEBE_TTL_MILLIS,
            DatasetKind::Status => STATUS_TTL_MILLIS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Betriebe => "betriebe",
            DatasetKind::Status => "status",
        }
    }

    pub fn storage_key(&self, scope_key: &str) -> String {
        format!("cache:{}:{}", self.name(), scope_key)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A cacheable dataset: its record type, kind and how to fetch it.
pub trait Dataset: Send + Sync + 'static {
    type Record: Clone + Serialize + DeserializeOwned + Send + Sync;

    const KIND: DatasetKind;

    /// Fetch a fresh copy for `scope_key`.
    fn fetch<'a>(
        source: &'a dyn DataSource,
        scope_key: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Self::Record>, ApiError>>;
}

/// Reference data ("Betriebe").
///
/// Scoped by election id, falling back to the global list when the
/// election has none. [`GLOBAL_SCOPE`] reads the global list only.
pub struct BetriebeData;

impl Dataset for BetriebeData {
    type Record = Betrieb;

    const KIND: DatasetKind = DatasetKind::Betriebe;

    fn fetch<'a>(
        source: &'a dyn DataSource,
        scope_key: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Betrieb>, ApiError>> {
        let election = (scope_key != GLOBAL_SCOPE).then_some(scope_key);
        source.fetch_betriebe(election)
    }
}

/// Per-election submission status, scoped by election id.
pub struct StatusData;

impl Dataset for StatusData {
    type Record = StatusRecord;

    const KIND: DatasetKind = DatasetKind::Status;

    fn fetch<'a>(
        source: &'a dyn DataSource,
        scope_key: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StatusRecord>, ApiError>> {
        source.fetch_status(scope_key)
    }
}
