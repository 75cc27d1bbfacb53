//! Per-election sticker collection and A4 print layout.
//!
//! The collection is user-managed: entries are appended, removed by index
//! or cleared, and never expire.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::cache::{KeyValueStore, StoreError};
use crate::models::StickerEntry;

const COLLECTION_KEY_PREFIX: &str = "qr_sticker_collection:";

/// Collection name used when no election is selected.
const DEFAULT_COLLECTION: &str = "default";

pub const STICKER_WIDTH_MM: f64 = 90.0;
pub const STICKER_HEIGHT_MM: f64 = 55.0;
const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const COLUMNS: usize = 2;
const ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
}

pub struct StickerCollection {
    store: Arc<dyn KeyValueStore>,
    key: String,
    election_id: String,
    entries: Vec<StickerEntry>,
}

impl StickerCollection {
    /// Load the collection for `election_id`. Unreadable data loads empty.
    pub fn load(store: Arc<dyn KeyValueStore>, election_id: &str) -> Self {
        let name = match election_id.trim() {
            "" => DEFAULT_COLLECTION,
            id => id,
        };
        let key = format!("{}{}", COLLECTION_KEY_PREFIX, name);
        let entries = match store.get(&key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                debug!(key = %key, error = %e, "Discarding unreadable sticker collection");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!(key = %key, error = %e, "Failed to read sticker collection");
                Vec::new()
            }
        };
        Self {
            store,
            key,
            election_id: name.to_string(),
            entries,
        }
    }

    pub fn entries(&self) -> &[StickerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append unless an entry with the same dedupe key exists.
    pub fn add(&mut self, entry: StickerEntry) -> Result<AddOutcome, StoreError> {
        if self.entries.iter().any(|e| e.dedupe_key == entry.dedupe_key) {
            return Ok(AddOutcome::Duplicate);
        }
        let mut entries = self.entries.clone();
        entries.push(entry);
        self.commit(entries)?;
        Ok(AddOutcome::Added)
    }

    pub fn remove(&mut self, index: usize) -> Result<Option<StickerEntry>, StoreError> {
        if index >= self.entries.len() {
            return Ok(None);
        }
        let mut entries = self.entries.clone();
        let removed = entries.remove(index);
        self.commit(entries)?;
        Ok(Some(removed))
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.commit(Vec::new())
    }

    /// File name for the printed sheet of this collection.
    pub fn sheet_file_name(&self) -> String {
        format!("A4_Sticker_Sammlung_{}_{}x.pdf", self.election_id, self.entries.len())
    }

    /// Persist `entries`, then adopt them. A failed write leaves the
    /// collection as it was.
    fn commit(&mut self, entries: Vec<StickerEntry>) -> Result<(), StoreError> {
        let contents = serde_json::to_string(&entries)
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;
        self.store.set(&self.key, &contents)?;
        self.entries = entries;
        Ok(())
    }
}

/// Embed a rendered PNG as a data URI for storage in the collection.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Position of one sticker on a page, in millimetres from the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// Lay out `count` stickers on A4 pages, 2 columns by 5 rows, with equal
/// gaps between stickers and page edges.
pub fn sheet_layout(count: usize) -> Vec<Vec<Slot>> {
    let gap_x = (PAGE_WIDTH_MM - COLUMNS as f64 * STICKER_WIDTH_MM) / (COLUMNS as f64 + 1.0);
    let gap_y = (PAGE_HEIGHT_MM - ROWS as f64 * STICKER_HEIGHT_MM) / (ROWS as f64 + 1.0);
    let per_page = COLUMNS * ROWS;

    (0..count)
        .map(|i| {
            let on_page = i % per_page;
            let (row, col) = (on_page / COLUMNS, on_page % COLUMNS);
            Slot {
                x_mm: gap_x + col as f64 * (STICKER_WIDTH_MM + gap_x),
                y_mm: gap_y + row as f64 * (STICKER_HEIGHT_MM + gap_y),
                width_mm: STICKER_WIDTH_MM,
                height_mm: STICKER_HEIGHT_MM,
            }
        })
        .collect::<Vec<_>>()
        .chunks(per_page)
        .map(<[Slot]>::to_vec)
        .collect()
}
