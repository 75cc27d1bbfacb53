use serde::{Deserialize, Serialize};

/// Reserved folder name the backend lists alongside real elections.
const RESERVED_ELECTION_ID: &str = "liste";

/// An election as listed by `/api/wahlen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Election {
    /// Whether this entry should be offered for selection.
    pub fn is_selectable(&self) -> bool {
        let id = self.id.trim();
        !id.is_empty() && id != RESERVED_ELECTION_ID
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// The election the operator is currently working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub election_id: String,
    pub election_name: String,
}

impl Context {
    pub fn new(election_id: impl Into<String>, election_name: impl Into<String>) -> Self {
        Self {
            election_id: election_id.into(),
            election_name: election_name.into(),
        }
    }

    /// An empty id means no election has been selected.
    pub fn is_set(&self) -> bool {
        !self.election_id.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_election_selectable() {
        let br = Election { id: "BR".to_string(), name: "Betriebsratswahl".to_string() };
        let liste = Election { id: "liste".to_string(), name: String::new() };
        let empty = Election { id: "  ".to_string(), name: "x".to_string() };

        assert!(br.is_selectable());
        assert!(!liste.is_selectable());
        assert!(!empty.is_selectable());
    }

    #[test]
    fn test_election_display_name_falls_back_to_id() {
        let e: Election = serde_json::from_str(r#"{"id":"JAV"}"#).unwrap();
        assert_eq!(e.display_name(), "JAV");
    }

    #[test]
    fn test_context_is_set() {
        assert!(Context::new("BR", "Betriebsratswahl").is_set());
        assert!(!Context::new("", "whatever").is_set());
    }
}
