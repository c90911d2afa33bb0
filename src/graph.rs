//! Graph-authoring vocabulary shared by expeditions and quests.
//!
//! The designer canvas numbers freshly created nodes with negative integers and
//! refers to stored nodes by their positive server id. Both are folded into
//! [`GraphId`] at the wire boundary; zero is never a valid id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphIdError {
    #[error("id 0 is not a valid node id")]
    Zero,
    #[error("server id {0} is out of range")]
    OutOfRange(i64),
}

/// A node reference as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphId {
    /// Client-local id of a node not yet stored (always negative).
    Local(i64),
    /// Id of a stored row.
    Server(i32),
}

impl GraphId {
    pub fn from_wire(raw: i64) -> Result<Self, GraphIdError> {
        match raw {
            0 => Err(GraphIdError::Zero),
            n if n < 0 => Ok(GraphId::Local(n)),
            n => i32::try_from(n)
                .map(GraphId::Server)
                .map_err(|_| GraphIdError::OutOfRange(n)),
        }
    }

    pub fn to_wire(self) -> i64 {
        match self {
            GraphId::Local(n) => n,
            GraphId::Server(n) => i64::from(n),
        }
    }

    pub fn is_local(self) -> bool {
        matches!(self, GraphId::Local(_))
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

impl<'de> Deserialize<'de> for GraphId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        GraphId::from_wire(raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for GraphId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_wire())
    }
}

/// Local-to-server id translation built while a graph save runs.
///
/// Serialises as a JSON object keyed by the local id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdMapping(BTreeMap<i64, i32>);

impl IdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, local: i64, server: i32) {
        self.0.insert(local, server);
    }

    /// Server id for a reference: server ids pass through, local ids are
    /// looked up.
    pub fn resolve(&self, id: GraphId) -> Option<i32> {
        match id {
            GraphId::Server(n) => Some(n),
            GraphId::Local(n) => self.0.get(&n).copied(),
        }
    }

    pub fn contains_local(&self, local: i64) -> bool {
        self.0.contains_key(&local)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire() {
        assert_eq!(GraphId::from_wire(-3), Ok(GraphId::Local(-3)));
        assert_eq!(GraphId::from_wire(42), Ok(GraphId::Server(42)));
        assert_eq!(GraphId::from_wire(0), Err(GraphIdError::Zero));
        assert_eq!(
            GraphId::from_wire(i64::from(i32::MAX) + 1),
            Err(GraphIdError::OutOfRange(i64::from(i32::MAX) + 1))
        );
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        let ids: Vec<GraphId> = serde_json::from_str("[-1, 7]").unwrap();
        assert_eq!(ids, vec![GraphId::Local(-1), GraphId::Server(7)]);
        assert!(serde_json::from_str::<GraphId>("0").is_err());
    }

    #[test]
    fn test_mapping_resolves_both_kinds() {
        let mut mapping = IdMapping::new();
        mapping.record(-1, 101);
        assert_eq!(mapping.resolve(GraphId::Local(-1)), Some(101));
        assert_eq!(mapping.resolve(GraphId::Local(-2)), None);
        assert_eq!(mapping.resolve(GraphId::Server(55)), Some(55));
    }

    #[test]
    fn test_mapping_serialises_with_string_keys() {
        let mut mapping = IdMapping::new();
        mapping.record(-2, 102);
        mapping.record(-1, 101);
        let json = serde_json::to_value(&mapping).unwrap();
        assert_eq!(json, serde_json::json!({"-1": 101, "-2": 102}));
    }
}
