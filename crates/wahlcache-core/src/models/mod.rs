//! Data models for election logistics entities.
//!
//! - `Election`, `Context`: the selectable elections and the active one
//! - `StatusRecord`, `TrafficLight`: per-location submission status
//! - `Betrieb`: reference data mapping a BKZ to its organization
//! - `StoredFile`: documents already uploaded for a location
//! - `StickerEntry`: a collected QR sticker

mod de;

pub mod betrieb;
pub mod election;
pub mod files;
pub mod status;
pub mod sticker;

pub use betrieb::{normalize_bkz, Betrieb};
pub use election::{Context, Election};
pub use files::{sort_newest_first, StoredFile};
pub use status::{StatusRecord, TrafficLight};
pub use sticker::StickerEntry;
