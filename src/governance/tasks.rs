// Task operations, validated against the owning project's roster and
// archive state. Once a project is archived its tasks are frozen.

use chrono::{DateTime, Utc};

use super::guard::{can_touch_task, require_admin};
use super::GovernanceError;
use crate::models::{NewTask, PrincipalId, Project, Task, TaskStatus, ValidationError};

fn ensure_not_frozen(project: &Project) -> Result<(), GovernanceError> {
    if project.archive().is_archived() {
        Err(GovernanceError::Conflict(format!(
            "project {} is archived; its tasks are frozen",
            project.id()
        )))
    } else {
        Ok(())
    }
}

fn ensure_roster_assignees(
    project: &Project,
    assignees: &[PrincipalId],
) -> Result<(), GovernanceError> {
    if assignees.is_empty() {
        return Err(ValidationError::NoAssignees.into());
    }
    for assignee in assignees {
        if !project.in_roster(assignee) {
            return Err(GovernanceError::NotFound(format!(
                "assignee {assignee} is not in the roster of project {}",
                project.id()
            )));
        }
    }
    Ok(())
}

/// Builds a task after checking the caller's admin role, the project's
/// archive state, and every assignee's roster membership.
pub fn create(
    project: &Project,
    caller: &PrincipalId,
    details: NewTask,
    now: DateTime<Utc>,
) -> Result<Task, GovernanceError> {
    require_admin(project, caller)?;
    ensure_not_frozen(project)?;

    ensure_roster_assignees(project, &details.assignees)?;
    let task = Task::new(project.id(), caller.clone(), details, now)?;
    Ok(task)
}

/// Replaces the assignee set of an existing task.
pub fn assign(
    project: &Project,
    task: &mut Task,
    caller: &PrincipalId,
    assignees: Vec<PrincipalId>,
    now: DateTime<Utc>,
) -> Result<(), GovernanceError> {
    require_admin(project, caller)?;
    ensure_not_frozen(project)?;

    ensure_roster_assignees(project, &assignees)?;
    task.replace_assignees(assignees.into_iter().collect());
    task.touch(now);
    Ok(())
}

/// Moves the task status. Admins and assignees may do this.
pub fn update_status(
    project: &Project,
    task: &mut Task,
    caller: &PrincipalId,
    status: TaskStatus,
    now: DateTime<Utc>,
) -> Result<(), GovernanceError> {
    if !can_touch_task(project, caller, task.assignees()) {
        return Err(GovernanceError::Forbidden(format!(
            "{caller} is neither an admin nor assigned to task {}",
            task.id()
        )));
    }
    ensure_not_frozen(project)?;

    task.set_status(status);
    task.touch(now);
    Ok(())
}
