// Admin-removal workflow. Demoting an admin needs every other admin to
// approve, with three fast paths that skip the round: self-removal, an
// owner facing a single other admin, and any rejection killing the request.
// The owner can never be targeted.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::guard::{is_owner, require_admin};
use super::{GovernanceError, RemovalOutcome};
use crate::models::{PrincipalId, Project, RemovalRequest};

fn ensure_not_owner(project: &Project, target: &PrincipalId) -> Result<(), GovernanceError> {
    if is_owner(project, target) {
        Err(GovernanceError::Forbidden(format!(
            "the owner of project {} cannot be removed from the admin role",
            project.id()
        )))
    } else {
        Ok(())
    }
}

fn ensure_still_admin(project: &Project, target: &PrincipalId) -> Result<(), GovernanceError> {
    if project.is_admin(target) {
        Ok(())
    } else {
        Err(GovernanceError::NotFound(format!(
            "{target} is not an admin of project {}",
            project.id()
        )))
    }
}

fn quorum(project: &Project) -> usize {
    // Everyone but the target. Recomputed per call so a shrinking admin set
    // lowers the bar instead of stranding the round.
    project.admin_count().saturating_sub(1)
}

/// Starts (or re-joins) a removal round against `target`, demoting outright
/// on the fast paths.
pub fn initiate(
    project: &mut Project,
    caller: &PrincipalId,
    target: &PrincipalId,
    now: DateTime<Utc>,
) -> Result<RemovalOutcome, GovernanceError> {
    require_admin(project, caller)?;
    ensure_not_owner(project, target)?;
    ensure_still_admin(project, target)?;

    // Self-removal: no round needed, the target consents by asking. The
    // project must keep at least one admin.
    if caller == target {
        if project.admin_count() <= 1 {
            return Err(GovernanceError::Conflict(
                "the last admin cannot demote themself".to_string(),
            ));
        }
        debug!(project = %project.id(), %target, "self-removal fast path");
        project.demote_to_member(target);
        project.touch(now);
        return Ok(RemovalOutcome::Demoted);
    }

    // Owner facing exactly one other admin: the round would only ever
    // contain the owner's own vote, so apply it unilaterally.
    if is_owner(project, caller) && project.admin_count() == 2 {
        debug!(project = %project.id(), %target, "owner fast path removal");
        project.demote_to_member(target);
        project.touch(now);
        return Ok(RemovalOutcome::Demoted);
    }

    match project.removal_request_mut(target) {
        Some(request) => {
            // Re-initiation is idempotent: it only adds the caller's
            // approval when absent, then falls through to the quorum check.
            if request.has_rejected(caller) {
                return Err(GovernanceError::Conflict(format!(
                    "{caller} already rejected the removal of {target}"
                )));
            }
            if !request.has_approved(caller) {
                request.insert_approval(caller.clone());
            }
        }
        None => {
            project.insert_removal_request(target.clone(), RemovalRequest::new(caller.clone(), now));
        }
    }

    conclude_round(project, target, now)
}

/// Records one approval on the pending round against `target`.
pub fn approve(
    project: &mut Project,
    caller: &PrincipalId,
    target: &PrincipalId,
    now: DateTime<Utc>,
) -> Result<RemovalOutcome, GovernanceError> {
    require_admin(project, caller)?;
    ensure_not_owner(project, target)?;
    ensure_still_admin(project, target)?;

    if caller == target {
        return Err(GovernanceError::Forbidden(
            "the targeted admin cannot vote on their own removal".to_string(),
        ));
    }

    let request = project.removal_request_mut(target).ok_or_else(|| {
        GovernanceError::NotFound(format!("no removal request targets {target}"))
    })?;

    if request.has_approved(caller) {
        return Err(GovernanceError::Conflict(format!(
            "{caller} already approved the removal of {target}"
        )));
    }
    if request.has_rejected(caller) {
        return Err(GovernanceError::Conflict(format!(
            "{caller} already rejected the removal of {target}"
        )));
    }

    request.insert_approval(caller.clone());
    conclude_round(project, target, now)
}

/// Rejects the pending round against `target`. One rejection clears the
/// request and the target keeps the admin role.
pub fn reject(
    project: &mut Project,
    caller: &PrincipalId,
    target: &PrincipalId,
    now: DateTime<Utc>,
) -> Result<RemovalOutcome, GovernanceError> {
    require_admin(project, caller)?;
    ensure_not_owner(project, target)?;
    ensure_still_admin(project, target)?;

    if caller == target {
        return Err(GovernanceError::Forbidden(
            "the targeted admin cannot vote on their own removal".to_string(),
        ));
    }

    let request = project.removal_request(target).ok_or_else(|| {
        GovernanceError::NotFound(format!("no removal request targets {target}"))
    })?;

    if request.has_approved(caller) {
        return Err(GovernanceError::Conflict(format!(
            "{caller} already approved the removal of {target}; an approval cannot be withdrawn"
        )));
    }
    if request.has_rejected(caller) {
        return Err(GovernanceError::Conflict(format!(
            "{caller} already rejected the removal of {target}"
        )));
    }

    debug!(project = %project.id(), %target, %caller, "removal round rejected");
    project.clear_removal_request(target);
    project.touch(now);
    Ok(RemovalOutcome::Cancelled)
}

fn conclude_round(
    project: &mut Project,
    target: &PrincipalId,
    now: DateTime<Utc>,
) -> Result<RemovalOutcome, GovernanceError> {
    let required = quorum(project);
    let approvals = match project.removal_request(target) {
        Some(request) => request.approvals().len(),
        None => {
            return Err(GovernanceError::NotFound(format!(
                "no removal request targets {target}"
            )))
        }
    };

    if approvals >= required {
        debug!(project = %project.id(), %target, approvals, required, "removal quorum reached");
        project.demote_to_member(target);
        project.touch(now);
        return Ok(RemovalOutcome::Demoted);
    }

    project.touch(now);
    Ok(RemovalOutcome::Pending {
        approvals,
        required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, Role};

    fn principal(raw: &str) -> PrincipalId {
        PrincipalId::new(raw).unwrap()
    }

    fn project_with_admins(admins: &[&str]) -> Project {
        let mut project = Project::new(
            principal("olive"),
            NewProject {
                name: "governance fixture".to_string(),
                seed_members: admins.iter().map(|raw| principal(raw)).collect(),
                ..NewProject::default()
            },
            Utc::now(),
        )
        .unwrap();
        for admin in admins {
            project.grant_admin(&principal(admin));
        }
        project
    }

    #[test]
    fn owner_with_one_other_admin_removes_unilaterally() {
        let mut project = project_with_admins(&["ana"]);

        let outcome = initiate(
            &mut project,
            &principal("olive"),
            &principal("ana"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(outcome, RemovalOutcome::Demoted);
        assert_eq!(project.role_of(&principal("ana")), Some(Role::Member));
        assert!(project.removal_request(&principal("ana")).is_none());
    }

    #[test]
    fn four_admin_removal_completes_at_the_third_distinct_approval() {
        let mut project = project_with_admins(&["ana", "ben", "casey"]);
        let now = Utc::now();
        let ben = principal("ben");

        assert_eq!(
            initiate(&mut project, &principal("ana"), &ben, now).unwrap(),
            RemovalOutcome::Pending {
                approvals: 1,
                required: 3
            }
        );
        assert_eq!(
            approve(&mut project, &principal("olive"), &ben, now).unwrap(),
            RemovalOutcome::Pending {
                approvals: 2,
                required: 3
            }
        );
        assert!(project.is_admin(&ben));

        assert_eq!(
            approve(&mut project, &principal("casey"), &ben, now).unwrap(),
            RemovalOutcome::Demoted
        );
        assert_eq!(project.role_of(&ben), Some(Role::Member));
        assert!(project.removal_request(&ben).is_none());
    }

    #[test]
    fn rejecting_after_approving_is_a_conflict_and_changes_nothing() {
        let mut project = project_with_admins(&["ana", "ben", "casey"]);
        let now = Utc::now();
        let ben = principal("ben");

        initiate(&mut project, &principal("ana"), &ben, now).unwrap();
        approve(&mut project, &principal("olive"), &ben, now).unwrap();

        let err = reject(&mut project, &principal("olive"), &ben, now).unwrap_err();
        assert!(matches!(err, GovernanceError::Conflict(_)));
        assert!(project.is_admin(&ben));
        let request = project.removal_request(&ben).unwrap();
        assert_eq!(request.approvals().len(), 2);
    }

    #[test]
    fn one_rejection_clears_the_request_without_demotion() {
        let mut project = project_with_admins(&["ana", "ben", "casey"]);
        let now = Utc::now();
        let ben = principal("ben");

        initiate(&mut project, &principal("ana"), &ben, now).unwrap();
        assert_eq!(
            reject(&mut project, &principal("casey"), &ben, now).unwrap(),
            RemovalOutcome::Cancelled
        );
        assert!(project.is_admin(&ben));
        assert!(project.removal_request(&ben).is_none());
    }

    #[test]
    fn the_owner_cannot_be_targeted() {
        let mut project = project_with_admins(&["ana", "ben"]);

        let err = initiate(
            &mut project,
            &principal("ana"),
            &principal("olive"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::Forbidden(_)));
    }

    #[test]
    fn self_removal_demotes_immediately() {
        let mut project = project_with_admins(&["ana", "ben"]);

        let outcome = initiate(
            &mut project,
            &principal("ana"),
            &principal("ana"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(outcome, RemovalOutcome::Demoted);
        assert_eq!(project.role_of(&principal("ana")), Some(Role::Member));
    }

    #[test]
    fn re_initiation_is_idempotent_for_the_same_requester() {
        let mut project = project_with_admins(&["ana", "ben", "casey"]);
        let now = Utc::now();
        let ben = principal("ben");

        initiate(&mut project, &principal("ana"), &ben, now).unwrap();
        let outcome = initiate(&mut project, &principal("ana"), &ben, now).unwrap();

        assert_eq!(
            outcome,
            RemovalOutcome::Pending {
                approvals: 1,
                required: 3
            }
        );
        assert_eq!(project.removal_requests().len(), 1);
    }

    #[test]
    fn re_initiation_by_another_admin_counts_as_an_approval() {
        let mut project = project_with_admins(&["ana", "ben", "casey"]);
        let now = Utc::now();
        let ben = principal("ben");

        initiate(&mut project, &principal("ana"), &ben, now).unwrap();
        approve(&mut project, &principal("casey"), &ben, now).unwrap();

        // olive "initiates" the same removal instead of approving; the call
        // lands as the third approval and completes the round.
        let outcome = initiate(&mut project, &principal("olive"), &ben, now).unwrap();
        assert_eq!(outcome, RemovalOutcome::Demoted);
        assert_eq!(project.role_of(&ben), Some(Role::Member));
    }

    #[test]
    fn targeting_a_plain_member_is_not_found() {
        let mut project = project_with_admins(&["ana"]);
        project.insert_member(principal("casey"));

        let err = initiate(
            &mut project,
            &principal("olive"),
            &principal("casey"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::NotFound(_)));
    }

    #[test]
    fn the_target_cannot_vote_on_their_own_removal() {
        let mut project = project_with_admins(&["ana", "ben", "casey"]);
        let now = Utc::now();
        let ben = principal("ben");

        initiate(&mut project, &principal("ana"), &ben, now).unwrap();
        assert!(matches!(
            approve(&mut project, &ben, &ben, now),
            Err(GovernanceError::Forbidden(_))
        ));
        assert!(matches!(
            reject(&mut project, &ben, &ben, now),
            Err(GovernanceError::Forbidden(_))
        ));
    }
}
