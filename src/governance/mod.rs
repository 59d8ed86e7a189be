// Governance core: membership guard, voting workflows, and the engine that
// runs each of them as one load-validate-mutate-persist sequence against
// the document store.

pub mod archive;
pub mod engine;
pub mod guard;
pub mod membership;
pub mod removal;
pub mod tasks;

pub use engine::{GovernanceEngine, RetryPolicy};

use thiserror::Error;

use crate::models::ValidationError;
use crate::store::StoreError;

/// Everything a governance operation can fail with. The CLI maps these to
/// exit codes; a service frontend would map them to response statuses.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("caller is not authenticated")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("lost a concurrent-update race {attempts} times; try again")]
    VersionConflict { attempts: u32 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage failure: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for GovernanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProjectNotFound(id) => GovernanceError::NotFound(format!("project {id}")),
            StoreError::TaskNotFound(id) => GovernanceError::NotFound(format!("task {id}")),
            StoreError::ProjectAlreadyExists(id) => {
                GovernanceError::Conflict(format!("project {id} already exists"))
            }
            StoreError::TaskAlreadyExists(id) => {
                GovernanceError::Conflict(format!("task {id} already exists"))
            }
            StoreError::RevisionConflict { .. } => GovernanceError::VersionConflict { attempts: 1 },
            other => GovernanceError::Store(other),
        }
    }
}

/// Where an archive call left the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// A round is open and still waiting on other admins.
    Pending { approvals: usize, required: usize },
    /// Full consensus reached; the project is archived.
    Archived,
    /// A rejection cancelled the round and the project is active again.
    Cancelled,
}

/// Where a removal call left the targeted admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// A request is open and still waiting on other admins.
    Pending { approvals: usize, required: usize },
    /// Quorum reached (or a fast path applied); the target is a member now.
    Demoted,
    /// A rejection cleared the request; the target keeps the admin role.
    Cancelled,
}
