// Boardroom — quorum-gated project governance over a shared document store.
// Privileged project changes (archiving, admin removal) only commit once
// every admin but the excluded party has agreed; one dissent cancels the
// round.

pub mod auth;
pub mod cli;
pub mod config;
pub mod governance;
pub mod models;
pub mod observability;
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use auth::{AuthError, Authenticator, SessionRegistry};
pub use config::{config, init_config, BoardroomConfig};
pub use governance::{
    ArchiveOutcome, GovernanceEngine, GovernanceError, RemovalOutcome, RetryPolicy,
};
pub use models::{
    ArchiveRequest, ArchiveState, NewProject, NewTask, PrincipalId, Project, ProjectId,
    ProjectStatus, RemovalRequest, Role, Task, TaskId, TaskPriority, TaskStatus, ValidationError,
};
pub use observability::{governance_metrics, GovernanceMetrics, GovernanceStats, OperationTimer};
#[cfg(feature = "database")]
pub use store::SqliteStore;
pub use store::{
    CachedStore, DocumentStore, JsonStore, MemoryStore, ProjectStore, StoreError, TaskStore,
};
pub use telemetry::{generate_correlation_id, governance_span, init_telemetry, shutdown_telemetry};
