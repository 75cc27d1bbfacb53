use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::scalar_to_string;

const BKZ_KEYS: &[&str] = &["bkz", "BKZ", "Bkz", "id", "ID"];
const NAME_KEYS: &[&str] = &["betrieb", "Betrieb", "name", "Name", "betriebsname", "Betriebsname"];
const DISTRICT_KEYS: &[&str] = &["bezirk", "Bezirk"];
const ADDRESS_KEYS: &[&str] = &["anschrift", "Anschrift", "adresse", "Adresse", "ort", "Ort"];

/// Normalize a location code for comparison.
///
/// Whitespace is trimmed and purely numeric codes lose their leading zeros,
/// so `"007"`, `" 7 "` and `7` all refer to the same location.
pub fn normalize_bkz(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        trimmed.to_string()
    }
}

/// Reference data: the organization behind a polling location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Betrieb {
    #[serde(rename = "bkz")]
    pub location_code: String,
    #[serde(rename = "betrieb", default)]
    pub organization_name: String,
    #[serde(rename = "bezirk", default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(rename = "anschrift", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Betrieb {
    /// Build from a loosely-shaped backend record.
    ///
    /// Returns `None` when the record carries no location code.
    pub fn from_record(record: &Map<String, Value>) -> Option<Self> {
        let location_code = pick(record, BKZ_KEYS)?;
        Some(Self {
            location_code,
            organization_name: pick(record, NAME_KEYS).unwrap_or_default(),
            district: pick(record, DISTRICT_KEYS),
            address: pick(record, ADDRESS_KEYS),
        })
    }

    /// Parse a backend response body, skipping records without a BKZ.
    pub fn list_from_value(value: Value) -> Option<Vec<Self>> {
        match value {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|item| item.as_object().and_then(Self::from_record))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn normalized_code(&self) -> String {
        normalize_bkz(&self.location_code)
    }
}

/// First non-empty scalar among `keys`.
fn pick(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .filter_map(scalar_to_string)
        .find(|s| !s.is_empty())
}
