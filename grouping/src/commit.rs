//! Atomic submission of the finalized partition.

use tracing::{info, warn};

use crate::core::error::EngineError;
use crate::core::invariants::validate_invariants;
use crate::io::gateway::{GroupGateway, PartitionEntry, PartitionPayload};
use crate::reconcile::{SnapshotOutcome, resync};
use crate::session::Session;

/// Result of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Number of groups persisted.
    pub group_count: usize,
    /// Whether the post-commit authoritative refetch was applied. A failed or
    /// discarded refetch does not undo the commit.
    pub refreshed: bool,
}

/// Validate completeness and submit the finalized partition.
///
/// Every group must have an overseer; otherwise
/// `IncompleteSupervisorAssignment` lists the offending 1-based group numbers
/// and no network call is made. On success the store flips to synced, the
/// write lease is released, and one authoritative fetch-and-apply runs. On
/// failure the store and mode are left unchanged and the lease stays as-is.
pub fn commit_partition<G: GroupGateway>(
    session: &mut Session,
    gateway: &G,
) -> Result<CommitOutcome, EngineError> {
    let unassigned: Vec<usize> = session
        .store
        .groups()
        .iter()
        .enumerate()
        .filter(|(_, group)| group.overseer.is_none())
        .map(|(index, _)| index + 1)
        .collect();
    if !unassigned.is_empty() {
        return Err(EngineError::IncompleteSupervisorAssignment(unassigned));
    }

    let problems = validate_invariants(&session.store);
    if !problems.is_empty() {
        // Exclusivity is maintained structurally by the mutation operations;
        // reaching this indicates a bug upstream, not an operator mistake.
        warn!(problems = %problems.join("; "), "committing with invariant violations");
    }

    let payload = PartitionPayload {
        groups: session
            .store
            .groups()
            .iter()
            .enumerate()
            .map(|(index, group)| PartitionEntry {
                overseer_id: group.overseer.clone().unwrap_or_default(),
                group_name: group.display_name(index),
                entrant_ids: group.members.clone(),
            })
            .collect(),
    };
    let group_count = payload.groups.len();

    gateway
        .commit_partition(&session.match_id, &payload)
        .map_err(EngineError::Remote)?;

    session.store.mark_synced();
    session.store.set_suppression(false);
    info!(groups = group_count, "partition committed");

    let refreshed = match resync(session, gateway) {
        Ok(SnapshotOutcome::Applied { .. }) => true,
        Ok(SnapshotOutcome::Discarded(reason)) => {
            warn!(?reason, "post-commit refetch discarded");
            false
        }
        Err(err) => {
            // The commit itself succeeded; a failed refetch only means the
            // local view keeps the pre-fetch contents until the next resync.
            warn!(error = %err, "post-commit refetch failed");
            false
        }
    };

    Ok(CommitOutcome {
        group_count,
        refreshed,
    })
}
