//! API client for the election backend.
//!
//! This module provides the `ApiClient` struct for fetching elections,
//! status and reference data, listing stored documents and uploading new
//! ones.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{sort_newest_first, Betrieb, Election, StatusRecord, StoredFile};
use crate::upload::UploadRequest;

use super::{ApiError, DataSource};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the election backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client from configuration
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs()))
            .build()?;
        let base_url = Url::parse(config.api_base_url())
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.api_base_url(), e)))?;

        Ok(Self { client, base_url })
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self.client.get(url.clone()).send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let body = response.text().await?;
                    return serde_json::from_str(&body).map_err(|e| {
                        ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e))
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn get_betriebe(&self, url: Url) -> Result<Vec<Betrieb>, ApiError> {
        let body: Value = self.get(url.clone()).await?;
        Betrieb::list_from_value(body)
            .ok_or_else(|| ApiError::InvalidResponse(format!("Expected a JSON array from {}", url)))
    }
}

#[async_trait]
impl DataSource for ApiClient {
    async fn fetch_elections(&self) -> Result<Vec<Election>, ApiError> {
        let url = self.endpoint(&["wahlen"])?;
        let elections: Vec<Election> = self.get(url).await?;
        debug!(count = elections.len(), "Elections fetched");
        Ok(elections)
    }

    async fn fetch_status(&self, election_id: &str) -> Result<Vec<StatusRecord>, ApiError> {
        if election_id.trim().is_empty() {
            return Err(ApiError::MissingInput("election"));
        }
        let url = self.endpoint(&[election_id, "status"])?;
        let records: Vec<StatusRecord> = self.get(url).await?;
        debug!(election = election_id, count = records.len(), "Status fetched");
        Ok(records)
    }

    /// Election-scoped reference data, falling back to the global list
    /// when the scoped endpoint is unavailable.
    async fn fetch_betriebe(&self, election_id: Option<&str>) -> Result<Vec<Betrieb>, ApiError> {
        if let Some(id) = election_id.filter(|id| !id.trim().is_empty()) {
            match self.get_betriebe(self.endpoint(&[id, "betriebe-json"])?).await {
                Ok(list) => {
                    debug!(election = id, count = list.len(), "Scoped Betriebe fetched");
                    return Ok(list);
                }
                Err(e) => {
                    info!(election = id, error = %e, "Scoped Betriebe unavailable, using global list");
                }
            }
        }
        let list = self.get_betriebe(self.endpoint(&["betriebe-json"])?).await?;
        debug!(count = list.len(), "Global Betriebe fetched");
        Ok(list)
    }

    /// List stored documents for a location, newest first.
    async fn fetch_files(&self, district: &str, location_code: &str) -> Result<Vec<StoredFile>, ApiError> {
        let district = district.trim();
        let location_code = location_code.trim();
        if district.is_empty() {
            return Err(ApiError::MissingInput("district"));
        }
        if location_code.is_empty() {
            return Err(ApiError::MissingInput("location code"));
        }

        let mut url = self.endpoint(&["files"])?;
        url.query_pairs_mut()
            .append_pair("bezirk", district)
            .append_pair("bkz", location_code);

        let mut files: Vec<StoredFile> = self.get(url).await?;
        sort_newest_first(&mut files);
        Ok(files)
    }

    /// Upload one document. Only HTTP 200 counts as success.
    async fn upload_file(&self, request: &UploadRequest) -> Result<(), ApiError> {
        let url = self.endpoint(&["upload"])?;
        let part = multipart::Part::bytes(request.bytes.clone()).file_name(request.file_name.clone());
        let form = multipart::Form::new()
            .text("bezirk", request.district.clone())
            .text("bkz", request.location_code.clone())
            .text("containers", request.document_type.tag())
            .part("files", part);

        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        if status == StatusCode::OK {
            debug!(file = %request.file_name, "Upload accepted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}
