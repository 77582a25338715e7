/*!
 * ID Generation
 * Per-mount component identifiers
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of one mount instance of a component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Generates `name_seq_suffix` ids
///
/// The sequence number alone guarantees uniqueness for the generator's
/// lifetime; the random suffix keeps ids from different generators apart.
/// Ids carry no wall-clock component, so remounts inside one millisecond
/// cannot collide.
#[derive(Debug)]
pub struct NodeIdGenerator {
    counter: Arc<AtomicU64>,
}

impl NodeIdGenerator {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Issue a fresh id for a mount of `name`
    pub fn next(&self, name: &str) -> NodeId {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let random = Uuid::new_v4().simple().to_string();
        NodeId(format!("{}_{}_{}", name, seq, &random[..8]))
    }

    /// Number of ids issued so far
    #[inline]
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed) - 1
    }
}

impl Default for NodeIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for NodeIdGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: Arc::clone(&self.counter),
        }
    }
}
