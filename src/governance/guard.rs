// Membership guard. Pure role checks over a loaded project, shared by every
// workflow entry point.

use super::GovernanceError;
use crate::models::{PrincipalId, Project, Role};

/// Passes only for principals holding the admin role on this project.
pub fn require_admin(project: &Project, principal: &PrincipalId) -> Result<(), GovernanceError> {
    if project.is_admin(principal) {
        Ok(())
    } else {
        Err(GovernanceError::Forbidden(format!(
            "{principal} is not an admin of project {}",
            project.id()
        )))
    }
}

/// Passes for any roster role, admin or member.
pub fn require_member(project: &Project, principal: &PrincipalId) -> Result<(), GovernanceError> {
    if project.in_roster(principal) {
        Ok(())
    } else {
        Err(GovernanceError::Forbidden(format!(
            "{principal} is not in the roster of project {}",
            project.id()
        )))
    }
}

pub fn is_owner(project: &Project, principal: &PrincipalId) -> bool {
    project.owner() == principal
}

/// Admin or assignee check used by the task status path.
pub fn can_touch_task(
    project: &Project,
    principal: &PrincipalId,
    assignees: &std::collections::BTreeSet<PrincipalId>,
) -> bool {
    project.role_of(principal) == Some(Role::Admin) || assignees.contains(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProject;
    use chrono::Utc;

    fn principal(raw: &str) -> PrincipalId {
        PrincipalId::new(raw).unwrap()
    }

    fn project_with_member() -> Project {
        Project::new(
            principal("olive"),
            NewProject {
                name: "guard checks".to_string(),
                seed_members: vec![principal("ana")],
                ..NewProject::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn members_fail_the_admin_gate() {
        let project = project_with_member();
        assert!(require_admin(&project, &principal("olive")).is_ok());
        assert!(matches!(
            require_admin(&project, &principal("ana")),
            Err(GovernanceError::Forbidden(_))
        ));
        assert!(matches!(
            require_admin(&project, &principal("mallory")),
            Err(GovernanceError::Forbidden(_))
        ));
    }

    #[test]
    fn any_roster_role_passes_the_member_gate() {
        let project = project_with_member();
        assert!(require_member(&project, &principal("olive")).is_ok());
        assert!(require_member(&project, &principal("ana")).is_ok());
        assert!(require_member(&project, &principal("mallory")).is_err());
    }

    #[test]
    fn owner_is_detected() {
        let project = project_with_member();
        assert!(is_owner(&project, &principal("olive")));
        assert!(!is_owner(&project, &principal("ana")));
    }
}
