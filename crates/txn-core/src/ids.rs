//! Transaction identifiers.
//!
//! The teacher's cross-shard transaction id is a deterministic content hash
//! (`TransactionId(pub [u8; 32])`, derived from payload + nonce) because many
//! nodes must independently agree on the same id for the same transaction.
//! Here the coordinator is the sole minter and two requests with identical
//! `(src, dst, amount)` must still be distinguishable, so the newtype wraps
//! an opaque UUIDv4 instead of a content hash. The accessor shape (a `Copy`
//! newtype with a string/hex rendering) is kept.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coordinator-minted unique identifier for one transfer / transaction log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Mint a fresh identifier. Called exactly once per `/transfer` request,
    /// before any durable state is written.
    pub fn new() -> Self {
        TransactionId(Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(TransactionId)
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TransactionId {
    fn from(u: Uuid) -> Self {
        TransactionId(u)
    }
}
