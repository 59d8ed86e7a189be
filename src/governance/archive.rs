// Archive workflow transitions. Archiving needs every current admin to
// approve; one rejection cancels the whole round. All functions mutate an
// owned project copy and leave persistence to the engine.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::guard::require_admin;
use super::{ArchiveOutcome, GovernanceError};
use crate::models::{ArchiveRequest, PrincipalId, Project};

/// Opens an archive round, or archives outright when the caller is the only
/// admin and a round would be a one-voter formality.
pub fn initiate(
    project: &mut Project,
    caller: &PrincipalId,
    now: DateTime<Utc>,
) -> Result<ArchiveOutcome, GovernanceError> {
    require_admin(project, caller)?;

    if project.archive().is_archived() {
        return Err(GovernanceError::Conflict(format!(
            "project {} is already archived",
            project.id()
        )));
    }
    if project.archive().pending_request().is_some() {
        return Err(GovernanceError::Conflict(format!(
            "project {} already has a pending archive round",
            project.id()
        )));
    }

    let required = project.admin_count();
    if required == 1 {
        debug!(project = %project.id(), %caller, "sole admin, archiving without a round");
        project.finish_archive(now);
        project.touch(now);
        return Ok(ArchiveOutcome::Archived);
    }

    project.start_archive_round(ArchiveRequest::new(caller.clone()));
    project.touch(now);
    Ok(ArchiveOutcome::Pending {
        approvals: 1,
        required,
    })
}

/// Records one approval; archives the project once every current admin has
/// approved.
pub fn approve(
    project: &mut Project,
    caller: &PrincipalId,
    now: DateTime<Utc>,
) -> Result<ArchiveOutcome, GovernanceError> {
    require_admin(project, caller)?;

    let required = project.admin_count();
    let request = project.pending_archive_mut().ok_or_else(|| {
        GovernanceError::Conflict("no archive round is pending".to_string())
    })?;

    if request.requested_by() == caller {
        return Err(GovernanceError::Forbidden(
            "the requester's approval is implicit; other admins must vote".to_string(),
        ));
    }
    if request.has_approved(caller) {
        return Err(GovernanceError::Conflict(format!(
            "{caller} already approved this archive round"
        )));
    }
    if request.has_rejected(caller) || !request.rejections().is_empty() {
        return Err(GovernanceError::Conflict(
            "this archive round has a recorded rejection".to_string(),
        ));
    }

    request.insert_approval(caller.clone());
    let approvals = request.approvals().len();

    // >= rather than ==: admins demoted mid-round must not strand the vote.
    if approvals >= required {
        debug!(project = %project.id(), approvals, required, "archive quorum reached");
        project.finish_archive(now);
        project.touch(now);
        return Ok(ArchiveOutcome::Archived);
    }

    project.touch(now);
    Ok(ArchiveOutcome::Pending {
        approvals,
        required,
    })
}

/// Vetoes the round. A single rejection restores the active state and drops
/// the request entirely.
pub fn reject(
    project: &mut Project,
    caller: &PrincipalId,
    now: DateTime<Utc>,
) -> Result<ArchiveOutcome, GovernanceError> {
    require_admin(project, caller)?;

    let request = project.archive().pending_request().ok_or_else(|| {
        GovernanceError::Conflict("no archive round is pending".to_string())
    })?;

    if request.requested_by() == caller {
        return Err(GovernanceError::Forbidden(
            "the requester cannot veto their own archive round".to_string(),
        ));
    }
    if request.has_approved(caller) {
        return Err(GovernanceError::Conflict(format!(
            "{caller} already approved this round; an approval cannot be withdrawn"
        )));
    }
    if request.has_rejected(caller) {
        return Err(GovernanceError::Conflict(format!(
            "{caller} already rejected this archive round"
        )));
    }

    debug!(project = %project.id(), %caller, "archive round vetoed");
    project.cancel_archive_round();
    project.touch(now);
    Ok(ArchiveOutcome::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProject;

    fn principal(raw: &str) -> PrincipalId {
        PrincipalId::new(raw).unwrap()
    }

    fn three_admin_project() -> Project {
        let mut project = Project::new(
            principal("olive"),
            NewProject {
                name: "sunset the beta".to_string(),
                seed_members: vec![principal("ana"), principal("ben")],
                ..NewProject::default()
            },
            Utc::now(),
        )
        .unwrap();
        project.grant_admin(&principal("ana"));
        project.grant_admin(&principal("ben"));
        project
    }

    #[test]
    fn sole_admin_archives_without_a_round() {
        let mut project = Project::new(
            principal("olive"),
            NewProject {
                name: "solo project".to_string(),
                ..NewProject::default()
            },
            Utc::now(),
        )
        .unwrap();

        let outcome = initiate(&mut project, &principal("olive"), Utc::now()).unwrap();
        assert_eq!(outcome, ArchiveOutcome::Archived);
        assert!(project.archive().is_archived());
    }

    #[test]
    fn full_consensus_archives_at_the_last_approval() {
        let mut project = three_admin_project();
        let now = Utc::now();

        assert_eq!(
            initiate(&mut project, &principal("olive"), now).unwrap(),
            ArchiveOutcome::Pending {
                approvals: 1,
                required: 3
            }
        );
        assert_eq!(
            approve(&mut project, &principal("ana"), now).unwrap(),
            ArchiveOutcome::Pending {
                approvals: 2,
                required: 3
            }
        );
        assert!(!project.archive().is_archived());

        assert_eq!(
            approve(&mut project, &principal("ben"), now).unwrap(),
            ArchiveOutcome::Archived
        );
        assert!(project.archive().is_archived());
        assert!(project.archive().pending_request().is_none());
    }

    #[test]
    fn one_veto_cancels_and_later_votes_find_no_round() {
        let mut project = three_admin_project();
        let now = Utc::now();

        initiate(&mut project, &principal("olive"), now).unwrap();
        assert_eq!(
            reject(&mut project, &principal("ana"), now).unwrap(),
            ArchiveOutcome::Cancelled
        );
        assert!(project.archive().is_active());

        let err = approve(&mut project, &principal("ben"), now).unwrap_err();
        assert!(matches!(err, GovernanceError::Conflict(_)));
    }

    #[test]
    fn requester_cannot_vote_on_their_own_round() {
        let mut project = three_admin_project();
        let now = Utc::now();
        initiate(&mut project, &principal("olive"), now).unwrap();

        assert!(matches!(
            approve(&mut project, &principal("olive"), now),
            Err(GovernanceError::Forbidden(_))
        ));
        assert!(matches!(
            reject(&mut project, &principal("olive"), now),
            Err(GovernanceError::Forbidden(_))
        ));
    }

    #[test]
    fn duplicate_approval_is_a_conflict() {
        let mut project = three_admin_project();
        let now = Utc::now();
        initiate(&mut project, &principal("olive"), now).unwrap();
        approve(&mut project, &principal("ana"), now).unwrap();

        let err = approve(&mut project, &principal("ana"), now).unwrap_err();
        assert!(matches!(err, GovernanceError::Conflict(_)));
    }

    #[test]
    fn members_cannot_initiate() {
        let mut project = three_admin_project();
        project.insert_member(principal("casey"));

        let err = initiate(&mut project, &principal("casey"), Utc::now()).unwrap_err();
        assert!(matches!(err, GovernanceError::Forbidden(_)));
    }

    #[test]
    fn initiating_twice_is_a_conflict() {
        let mut project = three_admin_project();
        let now = Utc::now();
        initiate(&mut project, &principal("olive"), now).unwrap();

        let err = initiate(&mut project, &principal("ana"), now).unwrap_err();
        assert!(matches!(err, GovernanceError::Conflict(_)));
    }

    #[test]
    fn quorum_completes_even_after_the_admin_set_shrank_mid_round() {
        let mut project = three_admin_project();
        let now = Utc::now();
        initiate(&mut project, &principal("olive"), now).unwrap();

        // ben loses the admin role while the round is pending, so the
        // remaining quorum is two and ana's approval closes it.
        project.demote_to_member(&principal("ben"));
        assert_eq!(
            approve(&mut project, &principal("ana"), now).unwrap(),
            ArchiveOutcome::Archived
        );
    }
}
