//! Semantic invariants over the working partition.
//!
//! Index contiguity and the group-count bookkeeping hold structurally (the
//! store is backed by a plain list); the checks here cover what the structure
//! cannot express.

use std::collections::HashSet;

use crate::core::store::GroupStore;

/// Check semantic invariants on the store:
/// - No entrant id appears in two groups (or twice in one)
/// - No overseer supervises two groups
/// - No empty entrant ids
pub fn validate_invariants(store: &GroupStore) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen_members = HashSet::new();
    let mut seen_overseers = HashSet::new();

    for (index, group) in store.groups().iter().enumerate() {
        for member in &group.members {
            if member.is_empty() {
                errors.push(format!("group {index}: empty entrant id"));
                continue;
            }
            if !seen_members.insert(member.clone()) {
                errors.push(format!("group {index}: entrant '{member}' placed twice"));
            }
        }

        if let Some(overseer) = &group.overseer {
            if !seen_overseers.insert(overseer.clone()) {
                errors.push(format!(
                    "group {index}: overseer '{overseer}' assigned twice"
                ));
            }
        }
    }

    errors
}
