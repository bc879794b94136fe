use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deterministically derived aggregate identifiers.
///
/// Settlement and float streams are addressed by identifiers derived from
/// business keys rather than random UUIDs, so repeated operations for the
/// same business key always target the same stream.
const DERIVED_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6ba7_b810_9dad_11d1_80b4_00c0_4fd4_30c8);

/// Unique identifier for an aggregate instance.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// aggregate IDs with other UUID-based identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Creates a new random aggregate ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an aggregate ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Derives an aggregate ID deterministically from a business key.
    ///
    /// The same `(kind, key)` pair always yields the same ID (UUIDv5 over a
    /// fixed namespace), distinct pairs yield distinct IDs.
    pub fn derive(kind: &str, key: &str) -> Self {
        let name = format!("{kind}/{key}");
        Self(Uuid::new_v5(&DERIVED_ID_NAMESPACE, name.as_bytes()))
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AggregateId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AggregateId> for Uuid {
    fn from(id: AggregateId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_id_new_creates_unique_ids() {
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn aggregate_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = AggregateId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn derive_is_deterministic() {
        let a = AggregateId::derive("settlement", "2024-03-01/m1/e1");
        let b = AggregateId::derive("settlement", "2024-03-01/m1/e1");
        assert_eq!(a, b);
    }

    #[test]
    fn derive_distinct_keys_yield_distinct_ids() {
        let a = AggregateId::derive("settlement", "2024-03-01/m1/e1");
        let b = AggregateId::derive("settlement", "2024-03-02/m1/e1");
        let c = AggregateId::derive("float", "2024-03-01/m1/e1");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn aggregate_id_serialization_roundtrip() {
        let id = AggregateId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: AggregateId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
