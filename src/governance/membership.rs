// Roster operations that need no voting round: adding a member, promoting a
// member to admin, and moving the delivery status.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::guard::require_admin;
use super::GovernanceError;
use crate::models::{PrincipalId, Project, ProjectStatus, Role};

/// Adds a brand-new principal to the roster as a member.
pub fn add_member(
    project: &mut Project,
    caller: &PrincipalId,
    target: &PrincipalId,
    now: DateTime<Utc>,
) -> Result<(), GovernanceError> {
    require_admin(project, caller)?;

    if project.in_roster(target) {
        return Err(GovernanceError::Conflict(format!(
            "{target} is already in the roster of project {}",
            project.id()
        )));
    }

    project.insert_member(target.clone());
    project.touch(now);
    Ok(())
}

/// Promotes an existing member to admin. Unilateral: any admin may do this,
/// no quorum involved.
pub fn promote_to_admin(
    project: &mut Project,
    caller: &PrincipalId,
    target: &PrincipalId,
    now: DateTime<Utc>,
) -> Result<(), GovernanceError> {
    require_admin(project, caller)?;

    match project.role_of(target) {
        None => {
            return Err(GovernanceError::NotFound(format!(
                "{target} is not in the roster of project {}",
                project.id()
            )))
        }
        Some(Role::Admin) => {
            return Err(GovernanceError::Conflict(format!(
                "{target} is already an admin of project {}",
                project.id()
            )))
        }
        Some(Role::Member) => {}
    }

    debug!(project = %project.id(), %target, "member promoted to admin");
    project.grant_admin(target);
    project.touch(now);
    Ok(())
}

/// Moves the delivery status. Archived projects are read-only.
pub fn set_status(
    project: &mut Project,
    caller: &PrincipalId,
    status: ProjectStatus,
    now: DateTime<Utc>,
) -> Result<(), GovernanceError> {
    require_admin(project, caller)?;

    if project.archive().is_archived() {
        return Err(GovernanceError::Conflict(format!(
            "project {} is archived and cannot change status",
            project.id()
        )));
    }

    project.set_status(status);
    project.touch(now);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProject;

    fn principal(raw: &str) -> PrincipalId {
        PrincipalId::new(raw).unwrap()
    }

    fn sample_project() -> Project {
        Project::new(
            principal("olive"),
            NewProject {
                name: "membership fixture".to_string(),
                seed_members: vec![principal("ana")],
                ..NewProject::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn promotion_moves_a_member_into_the_admin_set() {
        let mut project = sample_project();
        promote_to_admin(&mut project, &principal("olive"), &principal("ana"), Utc::now())
            .unwrap();
        assert_eq!(project.role_of(&principal("ana")), Some(Role::Admin));
        assert_eq!(project.admin_count(), 2);
    }

    #[test]
    fn promoting_an_admin_again_is_a_conflict() {
        let mut project = sample_project();
        let now = Utc::now();
        promote_to_admin(&mut project, &principal("olive"), &principal("ana"), now).unwrap();

        let err =
            promote_to_admin(&mut project, &principal("olive"), &principal("ana"), now)
                .unwrap_err();
        assert!(matches!(err, GovernanceError::Conflict(_)));
    }

    #[test]
    fn promoting_an_outsider_is_not_found() {
        let mut project = sample_project();
        let err = promote_to_admin(
            &mut project,
            &principal("olive"),
            &principal("mallory"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::NotFound(_)));
    }

    #[test]
    fn members_cannot_promote() {
        let mut project = sample_project();
        project.insert_member(principal("ben"));

        let err = promote_to_admin(
            &mut project,
            &principal("ana"),
            &principal("ben"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::Forbidden(_)));
    }

    #[test]
    fn adding_an_existing_principal_is_a_conflict() {
        let mut project = sample_project();
        let err = add_member(
            &mut project,
            &principal("olive"),
            &principal("ana"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::Conflict(_)));
    }

    #[test]
    fn archived_projects_refuse_status_changes() {
        let mut project = sample_project();
        let now = Utc::now();
        set_status(&mut project, &principal("olive"), ProjectStatus::InProgress, now).unwrap();
        assert_eq!(project.status(), ProjectStatus::InProgress);

        project.finish_archive(now);
        let err =
            set_status(&mut project, &principal("olive"), ProjectStatus::Completed, now)
                .unwrap_err();
        assert!(matches!(err, GovernanceError::Conflict(_)));
        assert_eq!(project.status(), ProjectStatus::InProgress);
    }
}
