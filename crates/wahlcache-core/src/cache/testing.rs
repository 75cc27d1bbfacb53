//! Fakes for exercising the cache and upload paths without a backend.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::api::{ApiError, DataSource};
use crate::models::{Betrieb, Election, StatusRecord, StoredFile, TrafficLight};
use crate::upload::UploadRequest;

use super::Clock;

pub(crate) struct FakeClock {
    now: AtomicI64,
}

impl FakeClock {
    pub(crate) fn new(start: i64) -> Arc<Self> {
        Arc::new(Self { now: AtomicI64::new(start) })
    }

    pub(crate) fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

type Scripted<T> = Mutex<VecDeque<Result<Vec<T>, String>>>;

/// Backend double. Each fetch pops the next scripted result; an empty
/// script answers with a server error.
#[derive(Default)]
pub(crate) struct FakeSource {
    pub(crate) status: Scripted<StatusRecord>,
    pub(crate) betriebe: Scripted<Betrieb>,
    pub(crate) elections: Scripted<Election>,
    pub(crate) files: Mutex<Vec<StoredFile>>,
    pub(crate) failing_uploads: Mutex<HashSet<String>>,
    pub(crate) uploaded: Mutex<Vec<UploadRequest>>,
    pub(crate) status_calls: AtomicUsize,
    pub(crate) betriebe_calls: AtomicUsize,
    pub(crate) betriebe_hints: Mutex<Vec<Option<String>>>,
    /// When set, status and Betriebe fetches wait here before answering.
    pub(crate) rendezvous: Option<Arc<Barrier>>,
}

impl FakeSource {
    pub(crate) fn push_status(&self, result: Result<Vec<StatusRecord>, &str>) {
        self.status.lock().unwrap().push_back(result.map_err(str::to_string));
    }

    pub(crate) fn push_betriebe(&self, result: Result<Vec<Betrieb>, &str>) {
        self.betriebe.lock().unwrap().push_back(result.map_err(str::to_string));
    }

    pub(crate) fn push_elections(&self, result: Result<Vec<Election>, &str>) {
        self.elections.lock().unwrap().push_back(result.map_err(str::to_string));
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn betriebe_calls(&self) -> usize {
        self.betriebe_calls.load(Ordering::SeqCst)
    }

    async fn wait_rendezvous(&self) {
        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
    }

    fn next<T>(script: &Scripted<T>) -> Result<Vec<T>, ApiError> {
        script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("unscripted call".to_string()))
            .map_err(ApiError::ServerError)
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn fetch_elections(&self) -> Result<Vec<Election>, ApiError> {
        Self::next(&self.elections)
    }

    async fn fetch_status(&self, _election_id: &str) -> Result<Vec<StatusRecord>, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_rendezvous().await;
        Self::next(&self.status)
    }

    async fn fetch_betriebe(&self, election_id: Option<&str>) -> Result<Vec<Betrieb>, ApiError> {
        self.betriebe_calls.fetch_add(1, Ordering::SeqCst);
        self.betriebe_hints.lock().unwrap().push(election_id.map(str::to_string));
        self.wait_rendezvous().await;
        Self::next(&self.betriebe)
    }

    async fn fetch_files(&self, _district: &str, _location_code: &str) -> Result<Vec<StoredFile>, ApiError> {
        Ok(self.files.lock().unwrap().clone())
    }

    async fn upload_file(&self, request: &UploadRequest) -> Result<(), ApiError> {
        if self.failing_uploads.lock().unwrap().contains(&request.file_name) {
            return Err(ApiError::ServerError("upload rejected".to_string()));
        }
        self.uploaded.lock().unwrap().push(request.clone());
        Ok(())
    }
}

pub(crate) fn status(district: &str, bkz: &str, light: TrafficLight, files: u32) -> StatusRecord {
    StatusRecord {
        district: district.to_string(),
        location_code: bkz.to_string(),
        traffic_light: light,
        file_count: files,
    }
}

pub(crate) fn betrieb(bkz: &str, name: &str) -> Betrieb {
    Betrieb {
        location_code: bkz.to_string(),
        organization_name: name.to_string(),
        district: None,
        address: None,
    }
}
