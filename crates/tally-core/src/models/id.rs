//! Entity identifiers

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const TEMPORARY_PREFIX: &str = "local-";

/// Identifier of a record or category.
///
/// The server assigns integers; records created offline carry a temporary
/// `local-<uuid v7>` string until the next pull replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Server-assigned numeric id
    Number(i64),
    /// String id (temporary or server-issued)
    Text(String),
}

impl EntityId {
    /// Create a fresh temporary id for a locally created entity
    #[must_use]
    pub fn temporary() -> Self {
        Self::Text(format!("{TEMPORARY_PREFIX}{}", Uuid::now_v7()))
    }

    /// Whether this id was minted locally and never confirmed by the server
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Text(value) if value.starts_with(TEMPORARY_PREFIX))
    }

    /// Primary-key encoding used by the local store.
    ///
    /// JSON encoding keeps `5` and `"5"` distinct.
    pub fn storage_key(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => serde_json::Value::from(value.as_str()).to_string(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl FromStr for EntityId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Text(trimmed.to_string()), Self::Number))
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_ids_are_unique_and_flagged() {
        let first = EntityId::temporary();
        let second = EntityId::temporary();
        assert_ne!(first, second);
        assert!(first.is_temporary());
        assert!(!EntityId::Number(7).is_temporary());
    }

    #[test]
    fn storage_key_distinguishes_numbers_from_strings() {
        assert_eq!(EntityId::Number(5).storage_key(), "5");
        assert_eq!(EntityId::from("5").storage_key(), "\"5\"");
    }

    #[test]
    fn parse_prefers_numbers() {
        assert_eq!("42".parse::<EntityId>().unwrap(), EntityId::Number(42));
        assert_eq!(
            " local-abc ".parse::<EntityId>().unwrap(),
            EntityId::Text("local-abc".to_string())
        );
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_string(&EntityId::Number(3)).unwrap(), "3");
        assert_eq!(
            serde_json::from_str::<EntityId>("\"tmp\"").unwrap(),
            EntityId::from("tmp")
        );
    }
}
