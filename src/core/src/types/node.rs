//! Node identity types

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reputation score on the 0-100 integer scale
pub type ReputationScore = u8;

/// Upper bound of the reputation scale
pub const MAX_SCORE: ReputationScore = 100;

/// Unique identifier for a participating node.
///
/// Ordering is lexicographic on the underlying string, which is what the
/// reputation engine uses to break ranking ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node ID
    pub fn new<S: Into<String>>(id: S) -> Self {
        NodeId(id.into())
    }

    /// Generate a random account-style address (`0x` followed by 40 hex chars)
    pub fn random_address<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 20];
        rng.fill(&mut bytes[..]);
        NodeId(format!("0x{}", hex::encode(bytes)))
    }

    /// Get the node ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}
