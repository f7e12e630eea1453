//! Entity identity: numeric ids drawn from one shared counter

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A unique entity identifier
///
/// VMs, groups and files share a single id space, so an id alone is enough
/// to find any entity.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('#');
        if trimmed.is_empty() {
            return Err(IdParseError::Empty);
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| IdParseError::NotANumber(s.to_string()))
    }
}

/// Errors that can occur when parsing entity IDs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("empty entity ID")]
    Empty,

    #[error("invalid entity ID: '{0}' (expected a non-negative integer)")]
    NotANumber(String),
}

/// Monotonic id counter
///
/// Never hands out the same id twice, and can be pushed past ids that
/// arrived from outside (a loaded or restored state).
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Make sure every future id is strictly greater than `id`
    pub fn advance_past(&mut self, id: EntityId) {
        if id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }

    /// The id the next call to `allocate` will return
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }
}

/// Serde adapter for optional file references
///
/// `None` is written as `null`. On input, `null`, the string `"none"` and any
/// negative number (older data used `-1`) all read as `None`.
pub mod none_sentinel {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    use super::EntityId;

    pub fn serialize<S>(value: &Option<EntityId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => serializer.serialize_u64(id.get()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<EntityId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SentinelVisitor)
    }

    struct SentinelVisitor;

    impl<'de> Visitor<'de> for SentinelVisitor {
        type Value = Option<EntityId>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an entity id, null, \"none\" or -1")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(SentinelVisitor)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(EntityId::new(v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            if v < 0 {
                Ok(None)
            } else {
                Ok(Some(EntityId::new(v as u64)))
            }
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v < 0.0 {
                Ok(None)
            } else if v.fract() == 0.0 {
                Ok(Some(EntityId::new(v as u64)))
            } else {
                Err(E::custom(format!("invalid entity id: {}", v)))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            if v.eq_ignore_ascii_case("none") || v.is_empty() {
                return Ok(None);
            }
            v.parse::<EntityId>().map(Some).map_err(E::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Holder {
        #[serde(default, with = "none_sentinel")]
        file: Option<EntityId>,
    }

    #[test]
    fn test_entity_id_parsing() {
        assert_eq!(EntityId::parse("42").unwrap(), EntityId::new(42));
        assert_eq!(EntityId::parse("#7").unwrap(), EntityId::new(7));
        assert_eq!(EntityId::parse(" 3 ").unwrap(), EntityId::new(3));
    }

    #[test]
    fn test_entity_id_invalid() {
        assert_eq!(EntityId::parse(""), Err(IdParseError::Empty));
        assert!(matches!(
            EntityId::parse("vm-1"),
            Err(IdParseError::NotANumber(_))
        ));
        assert!(matches!(
            EntityId::parse("-1"),
            Err(IdParseError::NotANumber(_))
        ));
    }

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert!(b > a);
        assert_eq!(ids.peek(), EntityId::new(2));
    }

    #[test]
    fn test_allocator_advance_past() {
        let mut ids = IdAllocator::new();
        ids.advance_past(EntityId::new(10));
        assert_eq!(ids.allocate(), EntityId::new(11));

        // Never moves backwards
        ids.advance_past(EntityId::new(3));
        assert_eq!(ids.allocate(), EntityId::new(12));
    }

    #[test]
    fn test_none_sentinel_accepts_legacy_values() {
        let parsed: Holder = serde_json::from_str(r#"{"file": -1}"#).unwrap();
        assert_eq!(parsed.file, None);

        let parsed: Holder = serde_json::from_str(r#"{"file": "none"}"#).unwrap();
        assert_eq!(parsed.file, None);

        let parsed: Holder = serde_json::from_str(r#"{"file": null}"#).unwrap();
        assert_eq!(parsed.file, None);

        let parsed: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(parsed.file, None);

        let parsed: Holder = serde_json::from_str(r#"{"file": 12}"#).unwrap();
        assert_eq!(parsed.file, Some(EntityId::new(12)));
    }

    #[test]
    fn test_none_sentinel_writes_null() {
        let json = serde_json::to_string(&Holder { file: None }).unwrap();
        assert_eq!(json, r#"{"file":null}"#);
    }
}
