//! Job status
//!
//! Two states: work in progress, and invoice sent.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Ongoing,
    Completed,
}

impl Status {
    pub const ALL: [Status; 2] = [Status::Ongoing, Status::Completed];

    /// Wire value
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ongoing => "ongoing",
            Status::Completed => "completed",
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Status::Ongoing => "En cours",
            Status::Completed => "Facture envoyé",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ongoing" => Some(Status::Ongoing),
            "completed" => Some(Status::Completed),
            _ => None,
        }
    }

    pub fn is_completed(self) -> bool {
        self == Status::Completed
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown status: {}", s))
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Status::parse(&s).unwrap_or_default(),
            _ => Status::default(),
        })
    }
}
