//! Test-only helpers: roster builders and a scripted gateway.

use std::cell::RefCell;

use anyhow::{Result, anyhow};

use crate::core::types::{Entrant, EntrantStatus, Overseer};
use crate::io::gateway::{
    BulkDeleteOutcome, GroupGateway, PartitionPayload, RemoteGroup,
};
use crate::session::Session;

/// Create a competing entrant with deterministic display fields.
pub fn entrant(id: &str) -> Entrant {
    entrant_with_status(id, EntrantStatus::Competing)
}

pub fn entrant_with_status(id: &str, status: EntrantStatus) -> Entrant {
    Entrant {
        id: id.to_string(),
        display_name: format!("{id} name"),
        round_label: "Round 1".to_string(),
        status,
    }
}

/// Create an overseer with deterministic display fields.
pub fn overseer(id: &str) -> Overseer {
    Overseer {
        id: id.to_string(),
        display_name: format!("{id} name"),
        contact: format!("{id}@example.com"),
    }
}

/// Create a session for a fixed match id with the given rosters.
pub fn session_with_roster(entrants: Vec<Entrant>, overseers: Vec<Overseer>) -> Session {
    Session::new("match-1", entrants, overseers)
}

/// Build a remote group for snapshot scripting.
pub fn remote_group(
    id: &str,
    name: &str,
    overseer_id: Option<&str>,
    entrant_ids: &[&str],
) -> RemoteGroup {
    RemoteGroup {
        id: id.to_string(),
        name: name.to_string(),
        overseer_id: overseer_id.map(str::to_string),
        entrant_ids: entrant_ids.iter().map(|e| (*e).to_string()).collect(),
    }
}

/// Scripted gateway that records calls and returns predetermined results
/// without any network access.
///
/// `commit_partition` persists the payload as the next `fetch_groups` result,
/// assigning generated remote ids, so post-commit refetches behave like a real
/// backend.
pub struct ScriptedGateway {
    /// When true, every remote operation fails.
    pub fail_remote: bool,
    calls: RefCell<Vec<String>>,
    fetch_result: RefCell<Vec<RemoteGroup>>,
    last_commit: RefCell<Option<PartitionPayload>>,
    next_id: RefCell<u64>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            fail_remote: false,
            calls: RefCell::new(Vec::new()),
            fetch_result: RefCell::new(Vec::new()),
            last_commit: RefCell::new(None),
            next_id: RefCell::new(1),
        }
    }

    /// Script the snapshot returned by subsequent `fetch_groups` calls.
    pub fn set_fetch_result(&self, groups: Vec<RemoteGroup>) {
        *self.fetch_result.borrow_mut() = groups;
    }

    /// Number of calls made to the named operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| *call == operation)
            .count()
    }

    /// Total remote calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Payload of the most recent `commit_partition` call.
    pub fn last_commit_payload(&self) -> Option<PartitionPayload> {
        self.last_commit.borrow().clone()
    }

    fn record(&self, operation: &str) -> Result<()> {
        self.calls.borrow_mut().push(operation.to_string());
        if self.fail_remote {
            return Err(anyhow!("scripted {operation} failure"));
        }
        Ok(())
    }

    fn generate_id(&self) -> String {
        let mut next = self.next_id.borrow_mut();
        let id = format!("rg-{}", *next);
        *next += 1;
        id
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupGateway for ScriptedGateway {
    fn fetch_groups(&self, _match_id: &str) -> Result<Vec<RemoteGroup>> {
        self.record("fetch_groups")?;
        Ok(self.fetch_result.borrow().clone())
    }

    fn create_group(&self, _match_id: &str, name: &str, overseer_id: &str) -> Result<RemoteGroup> {
        self.record("create_group")?;
        Ok(RemoteGroup {
            id: self.generate_id(),
            name: name.to_string(),
            overseer_id: Some(overseer_id.to_string()),
            entrant_ids: Vec::new(),
        })
    }

    fn delete_group(&self, _group_id: &str) -> Result<()> {
        self.record("delete_group")
    }

    fn delete_groups(&self, group_ids: &[String]) -> Result<BulkDeleteOutcome> {
        self.record("delete_groups")?;
        Ok(BulkDeleteOutcome {
            deleted_groups_count: group_ids.len() as u64,
            deleted_members_count: 0,
        })
    }

    fn rename_group(&self, group_id: &str, new_name: &str) -> Result<RemoteGroup> {
        self.record("rename_group")?;
        Ok(RemoteGroup {
            id: group_id.to_string(),
            name: new_name.to_string(),
            overseer_id: None,
            entrant_ids: Vec::new(),
        })
    }

    fn commit_partition(
        &self,
        _match_id: &str,
        payload: &PartitionPayload,
    ) -> Result<Vec<RemoteGroup>> {
        self.record("commit_partition")?;
        *self.last_commit.borrow_mut() = Some(payload.clone());

        let persisted: Vec<RemoteGroup> = payload
            .groups
            .iter()
            .map(|entry| RemoteGroup {
                id: self.generate_id(),
                name: entry.group_name.clone(),
                overseer_id: Some(entry.overseer_id.clone()),
                entrant_ids: entry.entrant_ids.clone(),
            })
            .collect();
        *self.fetch_result.borrow_mut() = persisted.clone();
        Ok(persisted)
    }
}
