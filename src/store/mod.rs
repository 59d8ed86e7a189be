// Document store abstraction. Every backend persists whole project and task
// documents under a per-document revision counter: `insert_*` claims a fresh
// id at revision 1, `save_*` is a compare-and-swap that only lands when the
// caller's copy carries the currently stored revision.

pub mod cached;
pub mod file;
pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

pub use cached::CachedStore;
pub use file::JsonStore;
pub use memory::MemoryStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Project, ProjectId, Task, TaskId};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("project {0} already exists")]
    ProjectAlreadyExists(ProjectId),

    #[error("task {0} already exists")]
    TaskAlreadyExists(TaskId),

    #[error("stale write on {document}: submitted revision {submitted}, stored revision {stored}")]
    RevisionConflict {
        document: String,
        submitted: u64,
        stored: u64,
    },

    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[cfg(feature = "database")]
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// True for the transient loser-of-a-race case that callers may resolve
    /// by reloading and replaying their change.
    pub fn is_revision_conflict(&self) -> bool {
        matches!(self, StoreError::RevisionConflict { .. })
    }
}

/// Persistence seam for project documents.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Stores a brand-new project at revision 1.
    async fn insert_project(&self, project: Project) -> Result<Project, StoreError>;

    async fn load_project(&self, id: ProjectId) -> Result<Project, StoreError>;

    /// Compare-and-swap write. Succeeds only while `project.revision()` still
    /// matches the stored revision, and returns the document as stored, one
    /// revision ahead of the submitted copy.
    async fn save_project(&self, project: Project) -> Result<Project, StoreError>;

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
}

/// Persistence seam for task documents.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: Task) -> Result<Task, StoreError>;

    async fn load_task(&self, id: TaskId) -> Result<Task, StoreError>;

    /// Compare-and-swap write with the same contract as
    /// [`ProjectStore::save_project`].
    async fn save_task(&self, task: Task) -> Result<Task, StoreError>;

    /// All tasks attached to one project.
    async fn list_tasks(&self, project: ProjectId) -> Result<Vec<Task>, StoreError>;
}

/// A backend that persists both document kinds. The CLI holds the configured
/// backend behind this trait so one binary can run against any of them.
pub trait DocumentStore: ProjectStore + TaskStore {}

impl<S: ProjectStore + TaskStore> DocumentStore for S {}

#[async_trait]
impl ProjectStore for Arc<dyn DocumentStore> {
    async fn insert_project(&self, project: Project) -> Result<Project, StoreError> {
        (**self).insert_project(project).await
    }

    async fn load_project(&self, id: ProjectId) -> Result<Project, StoreError> {
        (**self).load_project(id).await
    }

    async fn save_project(&self, project: Project) -> Result<Project, StoreError> {
        (**self).save_project(project).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        (**self).list_projects().await
    }
}

#[async_trait]
impl TaskStore for Arc<dyn DocumentStore> {
    async fn insert_task(&self, task: Task) -> Result<Task, StoreError> {
        (**self).insert_task(task).await
    }

    async fn load_task(&self, id: TaskId) -> Result<Task, StoreError> {
        (**self).load_task(id).await
    }

    async fn save_task(&self, task: Task) -> Result<Task, StoreError> {
        (**self).save_task(task).await
    }

    async fn list_tasks(&self, project: ProjectId) -> Result<Vec<Task>, StoreError> {
        (**self).list_tasks(project).await
    }
}
