//! Authoritative in-memory state for the working partition.
//!
//! The store is the single piece of mutable shared state in the engine. It is
//! mutated only by the mutation operations ([`crate::edit`]) and the
//! reconciliation controller ([`crate::reconcile`]), both on the same logical
//! thread. Local edits hold a coarse write lease (`suppress_remote_sync`)
//! that remote snapshots must respect, plus a monotonically increasing edit
//! version used to discard reads that started before the latest mutation.

use crate::core::error::EngineError;
use crate::core::types::{EngineMode, Group};

/// In-memory group store with its sync-mode state machine.
///
/// Group indices are positions in the backing list, so the contiguity
/// invariant holds by construction: removing a group re-indexes the ones
/// after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStore {
    groups: Vec<Group>,
    mode: EngineMode,
    suppress_remote_sync: bool,
    edit_version: u64,
}

impl GroupStore {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            mode: EngineMode::Empty,
            suppress_remote_sync: false,
            edit_version: 0,
        }
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    /// True while local edits hold the write lease against remote snapshots.
    pub fn suppress_remote_sync(&self) -> bool {
        self.suppress_remote_sync
    }

    /// Version counter bumped on every local edit. Snapshots fetched before
    /// the current version are stale.
    pub fn edit_version(&self) -> u64 {
        self.edit_version
    }

    /// Begin a local edit: take the write lease, bump the edit version, and
    /// promote `Empty` to `Draft`.
    ///
    /// Every mutating caller must invoke this immediately before touching the
    /// store so a concurrently-arriving snapshot cannot race with the edit.
    pub fn begin_local_edit(&mut self) {
        self.suppress_remote_sync = true;
        self.edit_version += 1;
        if self.mode == EngineMode::Empty {
            self.mode = EngineMode::Draft;
        }
    }

    /// Set or clear the write lease without recording an edit.
    pub fn set_suppression(&mut self, suppress: bool) {
        self.suppress_remote_sync = suppress;
    }

    /// Mark the current contents as corresponding to a persisted snapshot.
    pub fn mark_synced(&mut self) {
        self.mode = EngineMode::Synced;
    }

    /// Replace the entire working partition with a remote snapshot.
    ///
    /// Does not bump the edit version: installing a snapshot is not a local
    /// edit. The mode becomes `Synced`, or `Empty` for an empty snapshot.
    pub fn install_snapshot(&mut self, groups: Vec<Group>) {
        self.mode = if groups.is_empty() {
            EngineMode::Empty
        } else {
            EngineMode::Synced
        };
        self.groups = groups;
    }

    /// Replace all groups in place (local bulk edit, e.g. a freshly planned
    /// partition). Callers hold the write lease via [`Self::begin_local_edit`].
    pub fn replace_all(&mut self, groups: Vec<Group>) {
        self.groups = groups;
    }

    /// Clear everything back to `Empty` and release the write lease.
    ///
    /// Bumps the edit version so snapshots fetched before the reset cannot
    /// resurrect the cleared groups.
    pub fn reset_all(&mut self) {
        self.groups.clear();
        self.mode = EngineMode::Empty;
        self.suppress_remote_sync = false;
        self.edit_version += 1;
    }

    pub fn total_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Result<&Group, EngineError> {
        self.groups.get(index).ok_or(EngineError::GroupOutOfRange {
            index,
            total: self.groups.len(),
        })
    }

    fn group_mut(&mut self, index: usize) -> Result<&mut Group, EngineError> {
        let total = self.groups.len();
        self.groups
            .get_mut(index)
            .ok_or(EngineError::GroupOutOfRange { index, total })
    }

    pub fn set_members(&mut self, index: usize, members: Vec<String>) -> Result<(), EngineError> {
        self.group_mut(index)?.members = members;
        Ok(())
    }

    pub fn set_name(&mut self, index: usize, name: String) -> Result<(), EngineError> {
        self.group_mut(index)?.custom_name = Some(name);
        Ok(())
    }

    pub fn set_overseer(
        &mut self,
        index: usize,
        overseer: Option<String>,
    ) -> Result<(), EngineError> {
        self.group_mut(index)?.overseer = overseer;
        Ok(())
    }

    /// Append a group, returning its index.
    pub fn add_group(&mut self, group: Group) -> usize {
        self.groups.push(group);
        self.groups.len() - 1
    }

    /// Remove the group at `index`, re-indexing the ones after it.
    pub fn remove_group(&mut self, index: usize) -> Result<Group, EngineError> {
        if index >= self.groups.len() {
            return Err(EngineError::GroupOutOfRange {
                index,
                total: self.groups.len(),
            });
        }
        Ok(self.groups.remove(index))
    }

    /// All member ids in group order: group 0's members, then group 1's, ...
    pub fn flatten_all_members(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|group| group.members.iter().cloned())
            .collect()
    }

    /// Remote ids of every persisted group, in index order.
    pub fn persisted_ids(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter_map(|group| group.remote_id.clone())
            .collect()
    }
}

impl Default for GroupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_with(members: &[&str]) -> Group {
        Group {
            members: members.iter().map(|m| (*m).to_string()).collect(),
            ..Group::new()
        }
    }

    #[test]
    fn begin_local_edit_takes_lease_and_promotes_to_draft() {
        let mut store = GroupStore::new();
        assert_eq!(store.mode(), EngineMode::Empty);

        store.begin_local_edit();
        assert!(store.suppress_remote_sync());
        assert_eq!(store.mode(), EngineMode::Draft);
        assert_eq!(store.edit_version(), 1);
    }

    #[test]
    fn begin_local_edit_keeps_synced_mode() {
        let mut store = GroupStore::new();
        store.install_snapshot(vec![group_with(&["e1"])]);
        assert_eq!(store.mode(), EngineMode::Synced);

        store.begin_local_edit();
        assert_eq!(store.mode(), EngineMode::Synced);
    }

    #[test]
    fn install_snapshot_does_not_bump_edit_version() {
        let mut store = GroupStore::new();
        store.install_snapshot(vec![group_with(&["e1"])]);
        assert_eq!(store.edit_version(), 0);
        assert_eq!(store.mode(), EngineMode::Synced);

        store.install_snapshot(Vec::new());
        assert_eq!(store.mode(), EngineMode::Empty);
    }

    #[test]
    fn remove_group_reindexes_the_rest() {
        let mut store = GroupStore::new();
        store.add_group(group_with(&["a"]));
        store.add_group(group_with(&["b", "c"]));
        store.add_group(group_with(&["d"]));

        let removed = store.remove_group(0).expect("remove");
        assert_eq!(removed.members, vec!["a"]);
        assert_eq!(store.total_groups(), 2);
        assert_eq!(store.group(0).expect("group 0").members, vec!["b", "c"]);
        assert_eq!(store.group(1).expect("group 1").members, vec!["d"]);
    }

    #[test]
    fn out_of_range_access_is_tagged() {
        let mut store = GroupStore::new();
        store.add_group(group_with(&[]));

        let err = store.group(3).expect_err("out of range");
        assert!(matches!(
            err,
            EngineError::GroupOutOfRange { index: 3, total: 1 }
        ));
        let err = store.remove_group(1).expect_err("out of range");
        assert!(matches!(err, EngineError::GroupOutOfRange { .. }));
    }

    #[test]
    fn flatten_preserves_group_order() {
        let mut store = GroupStore::new();
        store.add_group(group_with(&["a", "b"]));
        store.add_group(group_with(&["c"]));
        assert_eq!(store.flatten_all_members(), vec!["a", "b", "c"]);
    }

    #[test]
    fn reset_all_clears_state_and_releases_lease() {
        let mut store = GroupStore::new();
        store.begin_local_edit();
        store.add_group(group_with(&["a"]));
        let version_before = store.edit_version();

        store.reset_all();
        assert_eq!(store.total_groups(), 0);
        assert_eq!(store.mode(), EngineMode::Empty);
        assert!(!store.suppress_remote_sync());
        assert!(store.edit_version() > version_before);
    }
}
