//! Entity Identifiers
//!
//! Opaque ids for damageable entities, projectiles' instigators, and
//! anything else the world tracks. Implements Ord so BTreeMap iteration
//! stays in a stable order.

use serde::{Deserialize, Serialize};

/// Unique entity identifier (UUID as bytes).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct EntityId(pub [u8; 16]);

impl EntityId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create a fresh random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Short hex form for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}
