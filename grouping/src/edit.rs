//! Mutation operations on the working partition.
//!
//! Every operation here validates first, then takes the write lease via
//! [`GroupStore::begin_local_edit`] immediately before touching the store, so
//! a concurrently-arriving remote snapshot cannot race with the edit. For
//! operations with a remote leg (rename, delete, add in synced mode), the
//! remote call happens first and local state is only touched on success.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::core::error::EngineError;
use crate::core::overseers;
use crate::core::strategy::plan_partition;
use crate::core::types::{EngineMode, Group, PartitionMethod};
use crate::io::gateway::GroupGateway;
use crate::session::Session;

/// Compute an initial partition for `candidates` and install it as the
/// working draft, replacing any previous groups. Groups start unnamed and
/// unsupervised. Returns the group count.
pub fn apply_partition(
    session: &mut Session,
    candidates: &[String],
    method: PartitionMethod,
) -> Result<usize, EngineError> {
    // Strategy errors abort before any store mutation.
    let layout = plan_partition(candidates, method)?;
    let groups: Vec<Group> = layout
        .into_iter()
        .map(|members| Group {
            members,
            ..Group::new()
        })
        .collect();
    let count = groups.len();

    session.store.begin_local_edit();
    session.store.replace_all(groups);
    session.active_group = 0;
    info!(groups = count, "applied partition strategy");
    Ok(count)
}

/// Append `ids` to the active group, skipping any entrant already placed in
/// some group. An empty remainder is a no-op, not an error. Returns the number
/// of members actually appended.
pub fn add_members_to_active(session: &mut Session, ids: &[String]) -> Result<usize, EngineError> {
    let active = session.active_group;
    session.store.group(active)?;

    let mut placed: HashSet<String> = session.store.flatten_all_members().into_iter().collect();
    let remainder: Vec<String> = ids
        .iter()
        .filter(|id| placed.insert((*id).clone()))
        .cloned()
        .collect();
    if remainder.is_empty() {
        debug!(group = active, "no new members to add");
        return Ok(0);
    }

    session.store.begin_local_edit();
    let mut members = session.store.group(active)?.members.clone();
    let added = remainder.len();
    members.extend(remainder);
    session.store.set_members(active, members)?;
    debug!(group = active, added, "added members to active group");
    Ok(added)
}

/// Remove one entrant from a group. `MemberNotFound` leaves state untouched.
pub fn remove_member(
    session: &mut Session,
    group_index: usize,
    entrant_id: &str,
) -> Result<(), EngineError> {
    let group = session.store.group(group_index)?;
    let position = group
        .members
        .iter()
        .position(|member| member == entrant_id)
        .ok_or_else(|| EngineError::MemberNotFound {
            group: group_index,
            entrant: entrant_id.to_string(),
        })?;

    session.store.begin_local_edit();
    let mut members = session.store.group(group_index)?.members.clone();
    members.remove(position);
    session.store.set_members(group_index, members)?;
    Ok(())
}

/// Empty one group's member list. `GroupAlreadyEmpty` is informational and
/// leaves state untouched. Returns the number of members removed.
pub fn remove_all_members(session: &mut Session, group_index: usize) -> Result<usize, EngineError> {
    let count = session.store.group(group_index)?.members.len();
    if count == 0 {
        return Err(EngineError::GroupAlreadyEmpty { group: group_index });
    }

    session.store.begin_local_edit();
    session.store.set_members(group_index, Vec::new())?;
    Ok(count)
}

/// Flatten all members in group order and re-deal them round-robin over the
/// current group count. A permutation: never adds or drops a member.
pub fn redistribute_evenly(session: &mut Session) -> Result<(), EngineError> {
    let flattened = session.store.flatten_all_members();
    if flattened.is_empty() {
        return Ok(());
    }
    let count = session.store.total_groups();
    let layout = plan_partition(&flattened, PartitionMethod::FixedCount(count as i64))?;

    session.store.begin_local_edit();
    for (index, members) in layout.into_iter().enumerate() {
        session.store.set_members(index, members)?;
    }
    debug!(groups = count, members = flattened.len(), "redistributed members");
    Ok(())
}

/// Assign (or clear) a group's overseer.
///
/// Exclusivity is maintained structurally: callers offer only
/// [`overseers::available_for`] results as candidates.
pub fn assign_overseer(
    session: &mut Session,
    group_index: usize,
    overseer_id: Option<String>,
) -> Result<(), EngineError> {
    session.store.group(group_index)?;
    session.store.begin_local_edit();
    session.store.set_overseer(group_index, overseer_id)
}

/// Rename a persisted group. A draft group has no remote counterpart to
/// update, so the rename is rejected with `RenameRequiresSyncedGroup`. The
/// remote rename happens first; local state changes only on success.
pub fn rename_group<G: GroupGateway>(
    session: &mut Session,
    gateway: &G,
    group_index: usize,
    new_name: &str,
) -> Result<(), EngineError> {
    let group = session.store.group(group_index)?;
    let remote_id = group
        .remote_id
        .clone()
        .ok_or(EngineError::RenameRequiresSyncedGroup { group: group_index })?;

    let renamed = gateway
        .rename_group(&remote_id, new_name)
        .map_err(EngineError::Remote)?;

    session.store.begin_local_edit();
    session.store.set_name(group_index, renamed.name)?;
    info!(group = group_index, name = new_name, "renamed group");
    Ok(())
}

/// Delete one group, re-indexing the ones after it.
///
/// In draft mode this is a pure local splice. For a persisted group the
/// remote delete runs first; on failure local state is untouched and the
/// suppression taken for the attempt is rolled back to its prior value.
pub fn delete_group<G: GroupGateway>(
    session: &mut Session,
    gateway: &G,
    group_index: usize,
) -> Result<(), EngineError> {
    let remote_id = session.store.group(group_index)?.remote_id.clone();

    if let Some(remote_id) = remote_id {
        let prior_suppression = session.store.suppress_remote_sync();
        // Lease taken before the remote call so a background snapshot cannot
        // land between the remote delete and the local splice.
        session.store.begin_local_edit();
        if let Err(err) = gateway.delete_group(&remote_id) {
            session.store.set_suppression(prior_suppression);
            return Err(EngineError::Remote(err));
        }
        session.store.remove_group(group_index)?;
    } else {
        session.store.begin_local_edit();
        session.store.remove_group(group_index)?;
    }

    session.clamp_active_group();
    info!(group = group_index, "deleted group");
    Ok(())
}

/// Create one empty group with the first available overseer auto-assigned, so
/// a newly created group is never left supervisor-less. Refused with
/// `NoOverseerAvailable` when every overseer is taken.
///
/// In synced mode the group is created remotely first so it carries a remote
/// id; in draft mode it is purely local. Returns the new group's index.
pub fn add_group<G: GroupGateway>(
    session: &mut Session,
    gateway: &G,
) -> Result<usize, EngineError> {
    let overseer = overseers::first_available(&session.store, &session.overseers)
        .ok_or(EngineError::NoOverseerAvailable)?
        .id
        .clone();

    let group = if session.store.mode() == EngineMode::Synced {
        let name = format!("Group {}", session.store.total_groups() + 1);
        let created = gateway
            .create_group(&session.match_id, &name, &overseer)
            .map_err(EngineError::Remote)?;
        Group {
            remote_id: Some(created.id),
            custom_name: Some(created.name),
            members: Vec::new(),
            overseer: Some(overseer),
        }
    } else {
        Group {
            overseer: Some(overseer),
            ..Group::new()
        }
    };

    session.store.begin_local_edit();
    let index = session.store.add_group(group);
    info!(group = index, "added group");
    Ok(index)
}

/// Clear the entire working partition back to `Empty`.
///
/// Persisted groups are bulk-deleted remotely first; on failure local state
/// is untouched and the suppression taken for the attempt is rolled back.
pub fn reset_all<G: GroupGateway>(session: &mut Session, gateway: &G) -> Result<(), EngineError> {
    let persisted = session.store.persisted_ids();

    if !persisted.is_empty() {
        let prior_suppression = session.store.suppress_remote_sync();
        session.store.begin_local_edit();
        match gateway.delete_groups(&persisted) {
            Ok(outcome) => {
                info!(
                    groups = outcome.deleted_groups_count,
                    members = outcome.deleted_members_count,
                    "bulk deleted persisted groups"
                );
            }
            Err(err) => {
                session.store.set_suppression(prior_suppression);
                return Err(EngineError::Remote(err));
            }
        }
    }

    session.store.reset_all();
    session.active_group = 0;
    info!("reset working partition");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invariants::validate_invariants;
    use crate::test_support::{ScriptedGateway, entrant, overseer, session_with_roster};

    fn draft_session(entrant_count: usize, overseer_count: usize) -> Session {
        let entrants = (0..entrant_count).map(|i| entrant(&format!("e{i}"))).collect();
        let overseers = (0..overseer_count)
            .map(|i| overseer(&format!("o{i}")))
            .collect();
        session_with_roster(entrants, overseers)
    }

    fn members_of(session: &Session, index: usize) -> Vec<String> {
        session.store.group(index).expect("group").members.clone()
    }

    #[test]
    fn apply_partition_installs_draft_groups() {
        let mut session = draft_session(7, 2);
        let candidates = session.unassigned_candidates();

        let count =
            apply_partition(&mut session, &candidates, PartitionMethod::FixedCount(2))
                .expect("partition");

        assert_eq!(count, 2);
        assert_eq!(session.store.mode(), EngineMode::Draft);
        assert!(session.store.suppress_remote_sync());
        assert_eq!(members_of(&session, 0).len(), 4);
        assert_eq!(members_of(&session, 1).len(), 3);
        assert!(validate_invariants(&session.store).is_empty());
    }

    #[test]
    fn apply_partition_error_leaves_store_untouched() {
        let mut session = draft_session(3, 1);
        let err = apply_partition(&mut session, &[], PartitionMethod::FixedCount(2))
            .expect_err("no candidates");
        assert!(matches!(err, EngineError::NoCandidatesSelected));
        assert_eq!(session.store.total_groups(), 0);
        assert!(!session.store.suppress_remote_sync());
    }

    /// Cross-group exclusivity: already-placed ids are skipped, and an empty
    /// remainder is a no-op rather than an error.
    #[test]
    fn add_members_skips_already_placed() {
        let mut session = draft_session(4, 1);
        let candidates = session.unassigned_candidates();
        apply_partition(&mut session, &candidates, PartitionMethod::FixedCount(2))
            .expect("partition");

        session.active_group = 1;
        let added = add_members_to_active(
            &mut session,
            &["e0".to_string(), "x1".to_string(), "x1".to_string()],
        )
        .expect("add");
        assert_eq!(added, 1);
        assert_eq!(members_of(&session, 1), vec!["e1", "e3", "x1"]);

        let added = add_members_to_active(&mut session, &["e0".to_string()]).expect("noop");
        assert_eq!(added, 0);
        assert!(validate_invariants(&session.store).is_empty());
    }

    #[test]
    fn remove_member_requires_presence() {
        let mut session = draft_session(2, 1);
        let candidates = session.unassigned_candidates();
        apply_partition(&mut session, &candidates, PartitionMethod::FixedCount(1))
            .expect("partition");

        remove_member(&mut session, 0, "e0").expect("remove");
        assert_eq!(members_of(&session, 0), vec!["e1"]);

        let err = remove_member(&mut session, 0, "missing").expect_err("absent");
        assert!(matches!(err, EngineError::MemberNotFound { .. }));
        assert!(err.is_informational());
        assert_eq!(members_of(&session, 0), vec!["e1"]);
    }

    #[test]
    fn remove_all_members_reports_already_empty() {
        let mut session = draft_session(2, 1);
        let candidates = session.unassigned_candidates();
        apply_partition(&mut session, &candidates, PartitionMethod::FixedCount(1))
            .expect("partition");

        let removed = remove_all_members(&mut session, 0).expect("remove all");
        assert_eq!(removed, 2);

        let err = remove_all_members(&mut session, 0).expect_err("empty");
        assert!(matches!(err, EngineError::GroupAlreadyEmpty { group: 0 }));
        assert!(err.is_informational());
    }

    /// Redistribution is count-preserving and evens out lopsided groups.
    #[test]
    fn redistribute_evens_out_groups() {
        let mut session = draft_session(6, 2);
        let candidates = session.unassigned_candidates();
        apply_partition(&mut session, &candidates, PartitionMethod::FixedCount(2))
            .expect("partition");

        // Make group 0 lopsided: 5 members against 0.
        remove_all_members(&mut session, 1).expect("empty group 1");
        add_members_to_active(&mut session, &["e1".to_string(), "e3".to_string()])
            .expect("pile into group 0");
        let total_before = session.store.flatten_all_members().len();
        assert_eq!(total_before, 5);

        redistribute_evenly(&mut session).expect("redistribute");

        assert_eq!(session.store.flatten_all_members().len(), total_before);
        assert_eq!(members_of(&session, 0).len(), 3);
        assert_eq!(members_of(&session, 1).len(), 2);
        assert!(validate_invariants(&session.store).is_empty());
    }

    #[test]
    fn redistribute_on_empty_store_is_noop() {
        let mut session = draft_session(0, 0);
        redistribute_evenly(&mut session).expect("noop");
        assert_eq!(session.store.total_groups(), 0);
    }

    #[test]
    fn rename_requires_persisted_group() {
        let mut session = draft_session(2, 1);
        let gateway = ScriptedGateway::new();
        let candidates = session.unassigned_candidates();
        apply_partition(&mut session, &candidates, PartitionMethod::FixedCount(1))
            .expect("partition");

        let err =
            rename_group(&mut session, &gateway, 0, "Finals A").expect_err("draft rename");
        assert!(matches!(
            err,
            EngineError::RenameRequiresSyncedGroup { group: 0 }
        ));
        assert_eq!(gateway.call_count("rename_group"), 0);
    }

    #[test]
    fn rename_updates_local_name_after_remote_success() {
        let mut session = draft_session(0, 1);
        let gateway = ScriptedGateway::new();
        session.store.install_snapshot(vec![Group {
            remote_id: Some("rg-1".to_string()),
            custom_name: Some("Group 1".to_string()),
            members: Vec::new(),
            overseer: Some("o0".to_string()),
        }]);

        rename_group(&mut session, &gateway, 0, "Finals A").expect("rename");
        assert_eq!(
            session.store.group(0).expect("group").custom_name.as_deref(),
            Some("Finals A")
        );
        assert_eq!(gateway.call_count("rename_group"), 1);
    }

    #[test]
    fn delete_draft_group_is_local_only() {
        let mut session = draft_session(7, 2);
        let gateway = ScriptedGateway::new();
        let candidates = session.unassigned_candidates();
        apply_partition(&mut session, &candidates, PartitionMethod::FixedCount(2))
            .expect("partition");
        let survivors = members_of(&session, 1);

        delete_group(&mut session, &gateway, 0).expect("delete");

        assert_eq!(session.store.total_groups(), 1);
        assert_eq!(members_of(&session, 0), survivors);
        assert_eq!(gateway.call_count("delete_group"), 0);

        // Redistribution over the single remaining group is a no-op.
        redistribute_evenly(&mut session).expect("redistribute");
        assert_eq!(members_of(&session, 0), survivors);
    }

    #[test]
    fn delete_persisted_group_calls_remote_first() {
        let mut session = draft_session(0, 1);
        let gateway = ScriptedGateway::new();
        session.store.install_snapshot(vec![Group {
            remote_id: Some("rg-1".to_string()),
            custom_name: Some("Group 1".to_string()),
            members: vec!["e1".to_string()],
            overseer: Some("o0".to_string()),
        }]);

        delete_group(&mut session, &gateway, 0).expect("delete");
        assert_eq!(session.store.total_groups(), 0);
        assert_eq!(gateway.call_count("delete_group"), 1);
    }

    /// Remote failure leaves the group in place and rolls the lease back to
    /// its prior value.
    #[test]
    fn delete_remote_failure_leaves_state_untouched() {
        let mut session = draft_session(0, 1);
        let mut gateway = ScriptedGateway::new();
        gateway.fail_remote = true;
        session.store.install_snapshot(vec![Group {
            remote_id: Some("rg-1".to_string()),
            custom_name: Some("Group 1".to_string()),
            members: vec!["e1".to_string()],
            overseer: Some("o0".to_string()),
        }]);
        assert!(!session.store.suppress_remote_sync());

        let err = delete_group(&mut session, &gateway, 0).expect_err("remote failure");
        assert!(matches!(err, EngineError::Remote(_)));
        assert_eq!(session.store.total_groups(), 1);
        assert!(!session.store.suppress_remote_sync());
    }

    #[test]
    fn add_group_requires_free_overseer() {
        let mut session = draft_session(0, 1);
        let gateway = ScriptedGateway::new();

        let index = add_group(&mut session, &gateway).expect("add");
        assert_eq!(index, 0);
        let group = session.store.group(0).expect("group");
        assert_eq!(group.overseer.as_deref(), Some("o0"));
        assert!(group.members.is_empty());

        let err = add_group(&mut session, &gateway).expect_err("no overseer left");
        assert!(matches!(err, EngineError::NoOverseerAvailable));
        assert_eq!(session.store.total_groups(), 1);
    }

    #[test]
    fn add_group_in_synced_mode_creates_remotely() {
        let mut session = draft_session(0, 2);
        let gateway = ScriptedGateway::new();
        session.store.install_snapshot(vec![Group {
            remote_id: Some("rg-1".to_string()),
            custom_name: Some("Group 1".to_string()),
            members: Vec::new(),
            overseer: Some("o0".to_string()),
        }]);

        let index = add_group(&mut session, &gateway).expect("add");
        assert_eq!(index, 1);
        let group = session.store.group(1).expect("group");
        assert!(group.is_persisted());
        assert_eq!(group.overseer.as_deref(), Some("o1"));
        assert_eq!(gateway.call_count("create_group"), 1);
    }

    #[test]
    fn reset_all_clears_draft_without_remote_calls() {
        let mut session = draft_session(4, 2);
        let gateway = ScriptedGateway::new();
        let candidates = session.unassigned_candidates();
        apply_partition(&mut session, &candidates, PartitionMethod::FixedCount(2))
            .expect("partition");

        reset_all(&mut session, &gateway).expect("reset");
        assert_eq!(session.store.total_groups(), 0);
        assert_eq!(session.store.mode(), EngineMode::Empty);
        assert_eq!(gateway.call_count("delete_groups"), 0);
    }

    #[test]
    fn reset_all_bulk_deletes_persisted_groups() {
        let mut session = draft_session(0, 2);
        let gateway = ScriptedGateway::new();
        session.store.install_snapshot(vec![
            Group {
                remote_id: Some("rg-1".to_string()),
                custom_name: Some("Group 1".to_string()),
                members: vec!["e1".to_string()],
                overseer: Some("o0".to_string()),
            },
            Group {
                remote_id: Some("rg-2".to_string()),
                custom_name: Some("Group 2".to_string()),
                members: Vec::new(),
                overseer: Some("o1".to_string()),
            },
        ]);

        reset_all(&mut session, &gateway).expect("reset");
        assert_eq!(session.store.total_groups(), 0);
        assert_eq!(session.store.mode(), EngineMode::Empty);
        assert_eq!(gateway.call_count("delete_groups"), 1);
    }

    #[test]
    fn reset_all_remote_failure_leaves_state_untouched() {
        let mut session = draft_session(0, 1);
        let mut gateway = ScriptedGateway::new();
        gateway.fail_remote = true;
        session.store.install_snapshot(vec![Group {
            remote_id: Some("rg-1".to_string()),
            custom_name: Some("Group 1".to_string()),
            members: vec!["e1".to_string()],
            overseer: Some("o0".to_string()),
        }]);

        let err = reset_all(&mut session, &gateway).expect_err("remote failure");
        assert!(matches!(err, EngineError::Remote(_)));
        assert_eq!(session.store.total_groups(), 1);
        assert!(!session.store.suppress_remote_sync());
    }
}
