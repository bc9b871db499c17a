//! Remote group persistence gateway.
//!
//! The [`GroupGateway`] trait decouples the engine from the backend transport.
//! Tests use scripted gateways that return predetermined snapshots without any
//! network access; production code uses [`HttpGateway`]. Gateway calls are the
//! engine's only suspension points — everything else is synchronous.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use crate::io::config::ConsoleConfig;

/// One persisted group as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGroup {
    pub id: String,
    pub name: String,
    pub overseer_id: Option<String>,
    /// Ordered entrant ids.
    pub entrant_ids: Vec<String>,
}

/// One group entry in the bulk-partition payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionEntry {
    pub overseer_id: String,
    pub group_name: String,
    pub entrant_ids: Vec<String>,
}

/// Finalized partition submitted by the commit coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPayload {
    pub groups: Vec<PartitionEntry>,
}

/// Counts returned by the bulk group delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteOutcome {
    pub deleted_groups_count: u64,
    pub deleted_members_count: u64,
}

/// Abstraction over the remote group persistence backend.
///
/// The engine never retries on its own; failures propagate to the caller as
/// tagged errors and any retry policy is left to the gateway.
pub trait GroupGateway {
    /// Unordered snapshot of the currently persisted groups for a match.
    fn fetch_groups(&self, match_id: &str) -> Result<Vec<RemoteGroup>>;

    /// Create one persisted group.
    fn create_group(&self, match_id: &str, name: &str, overseer_id: &str) -> Result<RemoteGroup>;

    /// Delete one persisted group.
    fn delete_group(&self, group_id: &str) -> Result<()>;

    /// Delete several persisted groups at once.
    fn delete_groups(&self, group_ids: &[String]) -> Result<BulkDeleteOutcome>;

    /// Rename one persisted group.
    fn rename_group(&self, group_id: &str, new_name: &str) -> Result<RemoteGroup>;

    /// Atomically persist the finalized partition, returning the persisted
    /// groups.
    fn commit_partition(&self, match_id: &str, payload: &PartitionPayload)
    -> Result<Vec<RemoteGroup>>;
}

/// Gateway over the backend's HTTP API.
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        Self::new(
            &config.gateway_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl GroupGateway for HttpGateway {
    #[instrument(skip_all, fields(match_id = %match_id))]
    fn fetch_groups(&self, match_id: &str) -> Result<Vec<RemoteGroup>> {
        let url = self.url(&format!("/matches/{match_id}/groups"));
        let groups: Vec<RemoteGroup> = self
            .client
            .get(&url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("fetch groups from {url}"))?
            .json()
            .context("parse groups snapshot")?;
        debug!(count = groups.len(), "fetched groups snapshot");
        Ok(groups)
    }

    #[instrument(skip_all, fields(match_id = %match_id, name = %name))]
    fn create_group(&self, match_id: &str, name: &str, overseer_id: &str) -> Result<RemoteGroup> {
        let url = self.url(&format!("/matches/{match_id}/groups"));
        let group: RemoteGroup = self
            .client
            .post(&url)
            .json(&json!({ "name": name, "overseerId": overseer_id }))
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("create group via {url}"))?
            .json()
            .context("parse created group")?;
        debug!(group_id = %group.id, "created group");
        Ok(group)
    }

    #[instrument(skip_all, fields(group_id = %group_id))]
    fn delete_group(&self, group_id: &str) -> Result<()> {
        let url = self.url(&format!("/groups/{group_id}"));
        self.client
            .delete(&url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("delete group via {url}"))?;
        debug!("deleted group");
        Ok(())
    }

    #[instrument(skip_all, fields(count = group_ids.len()))]
    fn delete_groups(&self, group_ids: &[String]) -> Result<BulkDeleteOutcome> {
        if group_ids.is_empty() {
            return Err(anyhow!("bulk delete requires at least one group id"));
        }
        let url = self.url("/groups");
        let outcome: BulkDeleteOutcome = self
            .client
            .delete(&url)
            .json(&json!({ "groupIds": group_ids }))
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("bulk delete groups via {url}"))?
            .json()
            .context("parse bulk delete outcome")?;
        debug!(
            groups = outcome.deleted_groups_count,
            members = outcome.deleted_members_count,
            "bulk deleted groups"
        );
        Ok(outcome)
    }

    #[instrument(skip_all, fields(group_id = %group_id, new_name = %new_name))]
    fn rename_group(&self, group_id: &str, new_name: &str) -> Result<RemoteGroup> {
        let url = self.url(&format!("/groups/{group_id}"));
        let group: RemoteGroup = self
            .client
            .patch(&url)
            .json(&json!({ "name": new_name }))
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("rename group via {url}"))?
            .json()
            .context("parse renamed group")?;
        debug!("renamed group");
        Ok(group)
    }

    #[instrument(skip_all, fields(match_id = %match_id, groups = payload.groups.len()))]
    fn commit_partition(
        &self,
        match_id: &str,
        payload: &PartitionPayload,
    ) -> Result<Vec<RemoteGroup>> {
        let url = self.url(&format!("/matches/{match_id}/groups/commit"));
        let groups: Vec<RemoteGroup> = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("commit partition via {url}"))?
            .json()
            .context("parse committed groups")?;
        debug!(count = groups.len(), "committed partition");
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wire types use camelCase field names.
    #[test]
    fn remote_group_parses_camel_case() {
        let json = r#"{
            "id": "rg-1",
            "name": "Group 1",
            "overseerId": "o1",
            "entrantIds": ["e1", "e2"]
        }"#;
        let group: RemoteGroup = serde_json::from_str(json).expect("parse");
        assert_eq!(group.overseer_id.as_deref(), Some("o1"));
        assert_eq!(group.entrant_ids, vec!["e1", "e2"]);
    }

    #[test]
    fn partition_payload_serializes_camel_case() {
        let payload = PartitionPayload {
            groups: vec![PartitionEntry {
                overseer_id: "o1".to_string(),
                group_name: "Group 1".to_string(),
                entrant_ids: vec!["e1".to_string()],
            }],
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["groups"][0]["overseerId"], "o1");
        assert_eq!(json["groups"][0]["groupName"], "Group 1");
        assert_eq!(json["groups"][0]["entrantIds"][0], "e1");
    }

    #[test]
    fn http_gateway_trims_trailing_slash() {
        let gateway =
            HttpGateway::new("http://localhost:8080/api/", Duration::from_secs(1)).expect("build");
        assert_eq!(gateway.url("/groups"), "http://localhost:8080/api/groups");
    }
}
