// Document model types for the collaboration backend.
// Identifier newtypes and shared input validation live here; the Project and
// Task aggregates live in their own files.

pub mod project;
pub mod task;

pub use project::{
    ArchiveRequest, ArchiveState, NewProject, Project, ProjectStatus, RemovalRequest, Role,
};
pub use task::{NewTask, Task, TaskPriority, TaskStatus};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

/// Input-shape failures raised while building or updating documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} characters")]
    LengthOutOfRange {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("`{0}` is not a valid principal id")]
    InvalidPrincipal(String),
    #[error("`{0}` is not a valid project or task id")]
    InvalidId(String),
    #[error("`{0}` is not a recognized status")]
    UnknownStatus(String),
    #[error("`{0}` is not a recognized priority")]
    UnknownPriority(String),
    #[error("a task needs at least one assignee")]
    NoAssignees,
}

fn principal_pattern() -> &'static Regex {
    static PRINCIPAL_RE: OnceLock<Regex> = OnceLock::new();
    PRINCIPAL_RE.get_or_init(|| {
        // Accepts opaque account ids as well as email-shaped handles.
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9@._+-]{0,63}$").expect("valid principal pattern")
    })
}

/// Identity of an authenticated account, issued by the authentication
/// collaborator and treated as opaque here beyond a basic shape check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if principal_pattern().is_match(&raw) {
            Ok(Self(raw))
        } else {
            Err(ValidationError::InvalidPrincipal(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PrincipalId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Stable project identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(s.to_string()))
    }
}

/// Stable task identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(s.to_string()))
    }
}

/// Validates a human-facing name or title field after trimming.
pub(crate) fn validate_text(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(ValidationError::LengthOutOfRange { field, min, max });
    }
    Ok(trimmed.to_string())
}
