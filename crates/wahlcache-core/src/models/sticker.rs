use serde::{Deserialize, Serialize};

/// A composed sticker kept in the per-election print collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerEntry {
    #[serde(rename = "key")]
    pub dedupe_key: String,
    #[serde(rename = "wahl")]
    pub election_id: String,
    #[serde(rename = "bkz")]
    pub location_code: String,
    #[serde(rename = "betrieb")]
    pub organization_name: String,
    #[serde(rename = "dataUrl")]
    pub image_data_uri: String,
}

impl StickerEntry {
    pub fn new(
        election_id: impl Into<String>,
        location_code: impl Into<String>,
        organization_name: impl Into<String>,
        image_data_uri: impl Into<String>,
    ) -> Self {
        let election_id = election_id.into();
        let location_code = location_code.into();
        let organization_name = organization_name.into();
        Self {
            dedupe_key: Self::key_for(&election_id, &location_code, &organization_name),
            election_id,
            location_code,
            organization_name,
            image_data_uri: image_data_uri.into(),
        }
    }

    /// Same election, BKZ and organization count as one sticker.
    pub fn key_for(election_id: &str, location_code: &str, organization_name: &str) -> String {
        format!("{}|{}|{}", election_id, location_code, organization_name)
    }
}
