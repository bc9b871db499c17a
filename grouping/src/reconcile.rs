//! Reconciliation of remote snapshots into the local store.
//!
//! The controller is the sole consumer of remote snapshots. Whether a
//! snapshot applies depends on the store's sync state: unpersisted edits are
//! authoritative, so a background refresh must never silently discard them.
//! A snapshot is applied only when no write lease is held, the store is not
//! in draft, and the fetch started at or after the latest local edit.

use tracing::{debug, info};

use crate::core::error::EngineError;
use crate::core::types::{EngineMode, Group};
use crate::io::gateway::{GroupGateway, RemoteGroup};
use crate::session::Session;

/// Why a snapshot was not applied. Discards are internal no-ops, never
/// user-facing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// A local edit holds the write lease.
    SuppressionActive,
    /// The store holds never-persisted draft groups.
    DraftEdits,
    /// The fetch started before the latest local edit.
    StaleRead,
}

/// Result of offering a snapshot to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Applied { groups: usize },
    Discarded(DiscardReason),
}

/// Offer a remote snapshot (solicited or background) to the store.
///
/// `fetch_version` is the store's edit version observed when the fetch was
/// started; a response that raced a later local edit is discarded. On apply,
/// the snapshot fully replaces the store's contents and the active group is
/// remapped to 0 if it is out of range afterwards.
pub fn handle_snapshot(
    session: &mut Session,
    snapshot: Vec<RemoteGroup>,
    fetch_version: u64,
) -> SnapshotOutcome {
    if session.store.suppress_remote_sync() {
        debug!("snapshot discarded: write lease held by local edits");
        return SnapshotOutcome::Discarded(DiscardReason::SuppressionActive);
    }
    if session.store.mode() == EngineMode::Draft {
        debug!("snapshot discarded: unpersisted draft groups");
        return SnapshotOutcome::Discarded(DiscardReason::DraftEdits);
    }
    if fetch_version < session.store.edit_version() {
        debug!(
            fetch_version,
            edit_version = session.store.edit_version(),
            "snapshot discarded: read started before latest local edit"
        );
        return SnapshotOutcome::Discarded(DiscardReason::StaleRead);
    }

    let groups: Vec<Group> = snapshot.into_iter().map(group_from_remote).collect();
    let count = groups.len();
    session.store.install_snapshot(groups);
    session.clamp_active_group();
    info!(groups = count, "applied remote snapshot");
    SnapshotOutcome::Applied { groups: count }
}

/// Operator-triggered resync: release the write lease, then perform one
/// authoritative fetch-and-apply.
pub fn resync<G: GroupGateway>(
    session: &mut Session,
    gateway: &G,
) -> Result<SnapshotOutcome, EngineError> {
    session.store.set_suppression(false);
    let fetch_version = session.store.edit_version();
    let snapshot = gateway
        .fetch_groups(&session.match_id)
        .map_err(EngineError::Remote)?;
    Ok(handle_snapshot(session, snapshot, fetch_version))
}

fn group_from_remote(remote: RemoteGroup) -> Group {
    Group {
        remote_id: Some(remote.id),
        custom_name: Some(remote.name),
        members: remote.entrant_ids,
        overseer: remote.overseer_id,
    }
}
