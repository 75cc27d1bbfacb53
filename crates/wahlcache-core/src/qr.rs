//! QR payload encoding for the companion display page.
//!
//! The record is serialized as JSON with one-letter keys, deflated and
//! base64url-encoded into a single query parameter appended to the target
//! page URL. Decoding reverses each step exactly.

use std::io::{Read, Write};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{normalize_bkz, Betrieb};
use crate::utils::or_placeholder;

/// Query parameter carrying the token.
pub const TOKEN_PARAM: &str = "d";

const DEFAULT_ORGANIZATION: &str = "[Wahlbetrieb]";
const DEFAULT_CHAIRPERSON: &str = "[Wahlvorstand]";
const DEFAULT_ADDRESS: &str = "[Anschrift]";
const DEFAULT_EMAIL: &str = "wahlvorstand@firma.de";

#[derive(Error, Debug)]
pub enum QrError {
    #[error("Token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Token could not be decompressed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Token payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL carries no token parameter")]
    MissingToken,
}

/// Contact and return information encoded into a QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    /// Election id
    pub w: String,
    /// Location code (BKZ)
    pub b: String,
    /// Organization name
    pub n: String,
    /// Chairperson of the election board
    pub v: String,
    /// Postal address
    pub a: String,
    /// Email address
    pub e: String,
}

impl QrPayload {
    pub fn encode(&self) -> Result<String, QrError> {
        let json = serde_json::to_vec(self)?;
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&json)?;
        let compressed = encoder.finish()?;
        Ok(URL_SAFE_NO_PAD.encode(compressed))
    }

    pub fn decode(token: &str) -> Result<Self, QrError> {
        let compressed = URL_SAFE_NO_PAD.decode(token.trim())?;
        let mut json = Vec::new();
        DeflateDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// `base` with the encoded payload appended as a query parameter.
    pub fn target_url(&self, base: &str) -> Result<String, QrError> {
        let mut url = Url::parse(base).map_err(|e| QrError::InvalidUrl(format!("{}: {}", base, e)))?;
        url.query_pairs_mut().append_pair(TOKEN_PARAM, &self.encode()?);
        Ok(url.into())
    }

    /// Recover a payload from a full target URL or a bare token.
    pub fn from_url_or_token(input: &str) -> Result<Self, QrError> {
        let input = input.trim();
        match Url::parse(input) {
            Ok(url) => {
                let token = url
                    .query_pairs()
                    .find(|(k, _)| k == TOKEN_PARAM)
                    .map(|(_, v)| v.into_owned())
                    .ok_or(QrError::MissingToken)?;
                Self::decode(&token)
            }
            Err(_) => Self::decode(input),
        }
    }
}

/// Values entered for one sticker; blanks get printable placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QrForm {
    pub election_id: String,
    pub location_code: String,
    pub organization_name: String,
    pub chairperson: String,
    pub address: String,
    pub email: String,
}

fn or_default(value: &str, default: &str) -> String {
    or_placeholder(value, default).to_string()
}

impl QrForm {
    pub fn to_payload(&self) -> QrPayload {
        QrPayload {
            w: self.election_id.trim().to_string(),
            b: self.location_code.trim().to_string(),
            n: or_default(&self.organization_name, DEFAULT_ORGANIZATION),
            v: or_default(&self.chairperson, DEFAULT_CHAIRPERSON),
            a: or_default(&self.address, DEFAULT_ADDRESS),
            e: or_default(&self.email, DEFAULT_EMAIL),
        }
    }

    /// Fill blank organization and address from reference data.
    ///
    /// Returns whether a matching record was found.
    pub fn autofill(&mut self, betriebe: &[Betrieb]) -> bool {
        let code = normalize_bkz(&self.location_code);
        if code.is_empty() {
            return false;
        }
        let Some(found) = betriebe.iter().find(|b| b.normalized_code() == code) else {
            return false;
        };
        if self.organization_name.trim().is_empty() && !found.organization_name.is_empty() {
            self.organization_name = found.organization_name.clone();
        }
        if self.address.trim().is_empty() {
            if let Some(address) = &found.address {
                self.address = address.clone();
            }
        }
        true
    }

    /// File name for the rendered sticker image.
    pub fn sticker_file_name(&self) -> String {
        format!(
            "qr_sticker_{}_{}_90x55.png",
            or_default(&self.election_id, "wahl"),
            or_default(&self.location_code, "ohneBKZ")
        )
    }
}

/// Split a pasted BKZ list on newlines, commas and semicolons.
pub fn parse_bkz_list(raw: &str) -> Vec<String> {
    raw.split(['\n', '\r', ',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QrPayload {
        QrPayload {
            w: "BR".to_string(),
            b: "42".to_string(),
            n: "Acme GmbH".to_string(),
            v: "J. Doe".to_string(),
            a: "Main St 1".to_string(),
            e: "a@b.c".to_string(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = sample().encode().unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(QrPayload::decode(&token).unwrap(), sample());
    }

    #[test]
    fn test_round_trip_through_url() {
        let payload = QrPayload {
            n: "Müller & Söhne; \"Werk 2\"".to_string(),
            ..sample()
        };
        let url = payload.target_url("https://example.org/pages/wahl2.html").unwrap();
        assert!(url.starts_with("https://example.org/pages/wahl2.html?d="));
        assert_eq!(QrPayload::from_url_or_token(&url).unwrap(), payload);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(QrPayload::decode("!!!"), Err(QrError::Base64(_))));
        assert!(QrPayload::decode("AAAA").is_err());
        assert!(matches!(
            QrPayload::from_url_or_token("https://example.org/page?x=1"),
            Err(QrError::MissingToken)
        ));
    }

    #[test]
    fn test_form_defaults() {
        let form = QrForm {
            election_id: "BR".to_string(),
            location_code: " 42 ".to_string(),
            ..Default::default()
        };
        let payload = form.to_payload();
        assert_eq!(payload.b, "42");
        assert_eq!(payload.n, DEFAULT_ORGANIZATION);
        assert_eq!(payload.v, DEFAULT_CHAIRPERSON);
        assert_eq!(payload.a, DEFAULT_ADDRESS);
        assert_eq!(payload.e, DEFAULT_EMAIL);
    }

    #[test]
    fn test_autofill_by_normalized_bkz() {
        let betriebe = vec![Betrieb {
            location_code: "42".to_string(),
            organization_name: "Acme GmbH".to_string(),
            district: None,
            address: Some("Main St 1".to_string()),
        }];
        let mut form = QrForm {
            location_code: "0042".to_string(),
            address: "Manual Rd 9".to_string(),
            ..Default::default()
        };
        assert!(form.autofill(&betriebe));
        assert_eq!(form.organization_name, "Acme GmbH");
        assert_eq!(form.address, "Manual Rd 9");

        let mut unknown = QrForm {
            location_code: "43".to_string(),
            ..Default::default()
        };
        assert!(!unknown.autofill(&betriebe));
    }

    #[test]
    fn test_sticker_file_name() {
        assert_eq!(QrForm::default().sticker_file_name(), "qr_sticker_wahl_ohneBKZ_90x55.png");
    }

    #[test]
    fn test_parse_bkz_list() {
        assert_eq!(parse_bkz_list("1, 2;3\n\n 4 ;"), vec!["1", "2", "3", "4"]);
        assert!(parse_bkz_list(" ,; ").is_empty());
    }
}
