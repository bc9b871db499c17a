//! Operator session state shared by mutation, reconciliation, and commit.

use crate::core::store::GroupStore;
use crate::core::types::{Entrant, EntrantStatus, Overseer};

/// One operator session for a single match.
///
/// Rosters are immutable from the engine's perspective; the store and the
/// active group selector are the only mutable parts, and both are only ever
/// touched on the one logical thread the engine runs on.
#[derive(Debug, Clone)]
pub struct Session {
    pub match_id: String,
    /// Entrant roster, as supplied by the roster service.
    pub entrants: Vec<Entrant>,
    /// Overseer roster, as supplied by the roster service.
    pub overseers: Vec<Overseer>,
    pub store: GroupStore,
    /// Index of the group that receives member additions.
    pub active_group: usize,
}

impl Session {
    pub fn new(match_id: &str, entrants: Vec<Entrant>, overseers: Vec<Overseer>) -> Self {
        Self {
            match_id: match_id.to_string(),
            entrants,
            overseers,
            store: GroupStore::new(),
            active_group: 0,
        }
    }

    /// Ids of competing entrants not yet placed in any group, in roster order.
    ///
    /// This is the candidate set handed to the partition strategy selector.
    pub fn unassigned_candidates(&self) -> Vec<String> {
        let placed: std::collections::HashSet<String> =
            self.store.flatten_all_members().into_iter().collect();
        self.entrants
            .iter()
            .filter(|entrant| entrant.status == EntrantStatus::Competing)
            .filter(|entrant| !placed.contains(&entrant.id))
            .map(|entrant| entrant.id.clone())
            .collect()
    }

    /// Remap the active group to 0 when it no longer points at a group.
    pub(crate) fn clamp_active_group(&mut self) {
        if self.active_group >= self.store.total_groups() {
            self.active_group = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Group;
    use crate::test_support::{entrant, entrant_with_status, overseer};

    #[test]
    fn unassigned_candidates_skips_placed_and_non_competing() {
        let mut session = Session::new(
            "match-1",
            vec![
                entrant("e1"),
                entrant("e2"),
                entrant_with_status("e3", EntrantStatus::Eliminated),
            ],
            vec![overseer("o1")],
        );
        session.store.add_group(Group {
            members: vec!["e1".to_string()],
            ..Group::new()
        });

        assert_eq!(session.unassigned_candidates(), vec!["e2"]);
    }

    #[test]
    fn clamp_resets_active_group_when_out_of_range() {
        let mut session = Session::new("match-1", Vec::new(), Vec::new());
        session.store.add_group(Group::new());
        session.active_group = 5;
        session.clamp_active_group();
        assert_eq!(session.active_group, 0);
    }
}
