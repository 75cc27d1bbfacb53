use async_trait::async_trait;

use crate::models::{Betrieb, Election, StatusRecord, StoredFile};
use crate::upload::UploadRequest;

use super::ApiError;

/// Everything the application reads from or writes to the backend.
///
/// `ApiClient` is the production implementation; tests substitute fakes.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_elections(&self) -> Result<Vec<Election>, ApiError>;

    async fn fetch_status(&self, election_id: &str) -> Result<Vec<StatusRecord>, ApiError>;

    /// Reference data, scoped to `election_id` when given.
    async fn fetch_betriebe(&self, election_id: Option<&str>) -> Result<Vec<Betrieb>, ApiError>;

    async fn fetch_files(&self, district: &str, location_code: &str) -> Result<Vec<StoredFile>, ApiError>;

    async fn upload_file(&self, request: &UploadRequest) -> Result<(), ApiError>;
}
