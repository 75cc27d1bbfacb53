//! wahlcache core library.
//!
//! Election logistics client: a context cache with stale-while-revalidate
//! semantics over the election REST backend, plus the logic behind the
//! status dashboard, document uploads and QR sticker generation.

pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod qr;
pub mod stickers;
pub mod upload;
pub mod utils;

pub use api::{ApiClient, ApiError, DataSource};
pub use cache::{Clock, ContextCache, FileStore, KeyValueStore, MemoryStore, SystemClock};
pub use config::Config;
