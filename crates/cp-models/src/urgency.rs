//! Urgency levels
//!
//! Ordinal scale `Low < Normal < High < Urgent`, sent as `"1".."4"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Urgency {
    Low = 1,
    #[default]
    Normal = 2,
    High = 3,
    Urgent = 4,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [
        Urgency::Low,
        Urgency::Normal,
        Urgency::High,
        Urgency::Urgent,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u64) -> Option<Self> {
        match level {
            1 => Some(Urgency::Low),
            2 => Some(Urgency::Normal),
            3 => Some(Urgency::High),
            4 => Some(Urgency::Urgent),
            _ => None,
        }
    }

    /// Parse a level number or name; `"medium"` is the legacy name of `Normal`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "low" => Some(Urgency::Low),
            "2" | "normal" | "medium" => Some(Urgency::Normal),
            "3" | "high" => Some(Urgency::High),
            "4" | "urgent" => Some(Urgency::Urgent),
            _ => None,
        }
    }

    /// Lenient wire decoding: anything unrecognized is `Normal`
    pub fn from_wire(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => n.as_u64().and_then(Self::from_level),
            _ => None,
        }
        .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            Urgency::Low => "Low",
            Urgency::Normal => "Normal",
            Urgency::High => "High",
            Urgency::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown urgency: {}", s))
    }
}

impl Serialize for Urgency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.level().to_string())
    }
}

impl<'de> Deserialize<'de> for Urgency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.map(|v| Self::from_wire(&v)).unwrap_or_default())
    }
}
