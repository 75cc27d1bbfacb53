//! REST API client module for the election backend.
//!
//! This module provides the `ApiClient` for fetching elections, status and
//! reference data, listing stored files and uploading documents. The
//! `DataSource` trait is the seam the context cache fetches through.

pub mod client;
pub mod error;
pub mod source;

pub use client::ApiClient;
pub use error::ApiError;
pub use source::DataSource;
