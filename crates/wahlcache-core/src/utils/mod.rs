//! Display helpers shared by front-ends.

pub mod format;

pub use format::{or_placeholder, truncate_chars};
