//! Shared deterministic types for the partitioning engine core.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across
//! sessions.

use serde::{Deserialize, Serialize};

/// Competition status of an entrant, as reported by the roster service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrantStatus {
    Competing,
    Eliminated,
    Advanced,
}

/// A participant eligible to be placed into a group.
///
/// Immutable from the engine's perspective; sourced from the roster service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: String,
    pub display_name: String,
    pub round_label: String,
    pub status: EntrantStatus,
}

/// A supervisor assignable to at most one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overseer {
    pub id: String,
    pub display_name: String,
    pub contact: String,
}

/// One labeled group in the working partition.
///
/// The group's local index is its position in the store's group list, so
/// indices are contiguous by construction. `remote_id` is present only once
/// the group has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub remote_id: Option<String>,
    /// Explicit name. `None` means the group still carries its index-derived
    /// default name.
    pub custom_name: Option<String>,
    /// Ordered entrant ids.
    pub members: Vec<String>,
    /// Assigned overseer id, if any.
    pub overseer: Option<String>,
}

impl Group {
    pub fn new() -> Self {
        Self {
            remote_id: None,
            custom_name: None,
            members: Vec::new(),
            overseer: None,
        }
    }

    /// Display name: the explicit name if set, otherwise `"Group {index+1}"`.
    pub fn display_name(&self, index: usize) -> String {
        match &self.custom_name {
            Some(name) => name.clone(),
            None => format!("Group {}", index + 1),
        }
    }

    /// True once the group has a remote counterpart.
    pub fn is_persisted(&self) -> bool {
        self.remote_id.is_some()
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

/// Strategy used to compute the initial group layout.
///
/// Parameters are validated by the strategy selector; values `<= 0` are
/// rejected before any store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionMethod {
    /// Exactly `n` groups, filled round-robin.
    FixedCount(i64),
    /// Sequential fill, at most `m` members per group.
    MaxSize(i64),
    /// Uniform shuffle, then round-robin into `k` groups.
    Random(i64),
}

/// Lifecycle state of the working partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// No groups exist locally.
    Empty,
    /// Groups exist locally but have never been persisted.
    Draft,
    /// Groups correspond to a persisted remote snapshot.
    Synced,
}
