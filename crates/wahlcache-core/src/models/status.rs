use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::de::{lenient_count, string_or_number};

/// Three-valued submission completeness indicator ("Ampel").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrafficLight {
    Green,
    Yellow,
    Red,
}

impl TrafficLight {
    pub const ALL: [TrafficLight; 3] = [TrafficLight::Green, TrafficLight::Yellow, TrafficLight::Red];

    /// Parse the backend's spelling. Anything unrecognised is red.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "gruen" | "grün" | "green" => TrafficLight::Green,
            "gelb" | "yellow" => TrafficLight::Yellow,
            _ => TrafficLight::Red,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            TrafficLight::Green => "gruen",
            TrafficLight::Yellow => "gelb",
            TrafficLight::Red => "rot",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TrafficLight::Green => "●G",
            TrafficLight::Yellow => "●Y",
            TrafficLight::Red => "●R",
        }
    }
}

impl fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrafficLight::Green => "green",
            TrafficLight::Yellow => "yellow",
            TrafficLight::Red => "red",
        };
        f.write_str(name)
    }
}

impl Serialize for TrafficLight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for TrafficLight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| TrafficLight::from_wire(&s)).unwrap_or(TrafficLight::Red))
    }
}

/// Submission status of one polling location within an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(rename = "bezirk", default, deserialize_with = "string_or_number")]
    pub district: String,
    #[serde(rename = "bkz", default, deserialize_with = "string_or_number")]
    pub location_code: String,
    #[serde(rename = "ampel", default = "default_light")]
    pub traffic_light: TrafficLight,
    #[serde(rename = "files", default, deserialize_with = "lenient_count")]
    pub file_count: u32,
}

fn default_light() -> TrafficLight {
    TrafficLight::Red
}
