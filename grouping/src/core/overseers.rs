//! Overseer assignment over the working partition.
//!
//! Exclusivity (one group per overseer) is maintained structurally: callers
//! only ever offer [`available_for`] results as assignment candidates, so a
//! conflicting assignment is not constructible through this path.

use std::collections::HashSet;

use crate::core::store::GroupStore;
use crate::core::types::Overseer;

/// Overseers assignable to `group_index`: the full roster minus those
/// supervising some other group. The group's own current overseer remains
/// selectable, enabling re-confirmation.
pub fn available_for<'a>(
    store: &GroupStore,
    roster: &'a [Overseer],
    group_index: usize,
) -> Vec<&'a Overseer> {
    let taken = assigned_ids(store, Some(group_index));
    roster
        .iter()
        .filter(|overseer| !taken.contains(overseer.id.as_str()))
        .collect()
}

/// True iff at least one overseer is not supervising any group.
///
/// Adding a group must refuse when this is false: a group without a
/// supervisor cannot later be committed.
pub fn can_add_group(store: &GroupStore, roster: &[Overseer]) -> bool {
    first_available(store, roster).is_some()
}

/// First roster overseer not supervising any group, in roster order.
pub fn first_available<'a>(store: &GroupStore, roster: &'a [Overseer]) -> Option<&'a Overseer> {
    let taken = assigned_ids(store, None);
    roster
        .iter()
        .find(|overseer| !taken.contains(overseer.id.as_str()))
}

fn assigned_ids(store: &GroupStore, except_group: Option<usize>) -> HashSet<&str> {
    store
        .groups()
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != except_group)
        .filter_map(|(_, group)| group.overseer.as_deref())
        .collect()
}
