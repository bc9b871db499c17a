//! Tagged error taxonomy for engine operations.
//!
//! Validation failures and structural no-ops are local and never follow an
//! attempted remote call; `Remote` wraps gateway failures after which local
//! state is guaranteed untouched.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Strategy parameter was not strictly positive.
    #[error("partition parameter must be > 0 (got {0})")]
    InvalidParameter(i64),

    /// The candidate list handed to the strategy selector was empty.
    #[error("no candidates selected")]
    NoCandidatesSelected,

    /// Every overseer is already supervising a group.
    #[error("no overseer available for a new group")]
    NoOverseerAvailable,

    /// A group index outside `[0, total)` was used.
    #[error("group index {index} out of range (total {total})")]
    GroupOutOfRange { index: usize, total: usize },

    /// Remove targeted an entrant that is not in the group.
    #[error("entrant '{entrant}' not found in group {group}")]
    MemberNotFound { group: usize, entrant: String },

    /// Remove-all targeted a group with no members.
    #[error("group {group} is already empty")]
    GroupAlreadyEmpty { group: usize },

    /// Rename attempted on a group that has never been persisted.
    #[error("group {group} has no persisted counterpart to rename")]
    RenameRequiresSyncedGroup { group: usize },

    /// Commit attempted while some groups lack an overseer. Carries the
    /// 1-based group numbers shown to the operator.
    #[error("groups without an overseer: {}", join_numbers(.0))]
    IncompleteSupervisorAssignment(Vec<usize>),

    /// The remote gateway failed; no local change was applied.
    #[error("remote gateway failure: {0}")]
    Remote(anyhow::Error),
}

impl EngineError {
    /// Structural no-ops are surfaced to the operator as informational notices
    /// rather than blocking warnings.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::MemberNotFound { .. } | Self::GroupAlreadyEmpty { .. }
        )
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        Self::Remote(err)
    }
}

fn join_numbers(numbers: &[usize]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
