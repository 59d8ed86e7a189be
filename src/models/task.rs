// Task documents attached to a project. Tasks carry their own assignee list
// and lifecycle, while membership checks against the parent project happen
// in the governance layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::{validate_text, PrincipalId, ProjectId, TaskId, ValidationError};

pub(crate) const TITLE_MIN: usize = 3;
pub(crate) const TITLE_MAX: usize = 100;
pub(crate) const TASK_DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-started" => Ok(TaskStatus::NotStarted),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "blocked" => Ok(TaskStatus::Blocked),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Creation input for a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub deadline: Option<DateTime<Utc>>,
    pub assignees: Vec<PrincipalId>,
}

/// A task document. Always assigned to at least one roster principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    title: String,
    description: String,
    status: TaskStatus,
    priority: TaskPriority,
    deadline: Option<DateTime<Utc>>,
    assignees: BTreeSet<PrincipalId>,
    created_by: PrincipalId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

impl Task {
    pub fn new(
        project_id: ProjectId,
        created_by: PrincipalId,
        details: NewTask,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = validate_text("task title", &details.title, TITLE_MIN, TITLE_MAX)?;
        let description =
            validate_text("task description", &details.description, 0, TASK_DESCRIPTION_MAX)?;
        let assignees: BTreeSet<PrincipalId> = details.assignees.into_iter().collect();
        if assignees.is_empty() {
            return Err(ValidationError::NoAssignees);
        }

        Ok(Self {
            id: TaskId::generate(),
            project_id,
            title,
            description,
            status: TaskStatus::default(),
            priority: details.priority,
            deadline: details.deadline,
            assignees,
            created_by,
            created_at: now,
            updated_at: now,
            revision: 0,
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn assignees(&self) -> &BTreeSet<PrincipalId> {
        &self.assignees
    }

    pub fn is_assigned(&self, principal: &PrincipalId) -> bool {
        self.assignees.contains(principal)
    }

    pub fn created_by(&self) -> &PrincipalId {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub(crate) fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Replaces the assignee set. The replacement set must be non-empty.
    pub(crate) fn replace_assignees(&mut self, assignees: BTreeSet<PrincipalId>) {
        debug_assert!(!assignees.is_empty());
        self.assignees = assignees;
    }
}
