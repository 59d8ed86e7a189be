// Project aggregate: canonical membership roster plus governance-request
// state. Transition policy lives in crate::governance; this module owns the
// data shapes and the invariant-preserving primitives the policy relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::{validate_text, PrincipalId, ProjectId, ValidationError};

pub(crate) const NAME_MIN: usize = 3;
pub(crate) const NAME_MAX: usize = 100;
pub(crate) const DESCRIPTION_MAX: usize = 500;

/// Roster role for one principal. A principal holds exactly one role, which
/// keeps the admin and member sets disjoint by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Member => f.write_str("member"),
        }
    }
}

/// Delivery status advertised on the project card. Unrelated to archival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    OnHold,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::NotStarted => "not-started",
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on-hold",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-started" => Ok(ProjectStatus::NotStarted),
            "in-progress" => Ok(ProjectStatus::InProgress),
            "completed" => Ok(ProjectStatus::Completed),
            "on-hold" => Ok(ProjectStatus::OnHold),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// One pending archive round. Created with the requester's implicit approval
/// already recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRequest {
    requested_by: PrincipalId,
    approvals: BTreeSet<PrincipalId>,
    rejections: BTreeSet<PrincipalId>,
}

impl ArchiveRequest {
    pub(crate) fn new(requested_by: PrincipalId) -> Self {
        let mut approvals = BTreeSet::new();
        approvals.insert(requested_by.clone());
        Self {
            requested_by,
            approvals,
            rejections: BTreeSet::new(),
        }
    }

    pub fn requested_by(&self) -> &PrincipalId {
        &self.requested_by
    }

    pub fn approvals(&self) -> &BTreeSet<PrincipalId> {
        &self.approvals
    }

    pub fn rejections(&self) -> &BTreeSet<PrincipalId> {
        &self.rejections
    }

    pub fn has_approved(&self, principal: &PrincipalId) -> bool {
        self.approvals.contains(principal)
    }

    pub fn has_rejected(&self, principal: &PrincipalId) -> bool {
        self.rejections.contains(principal)
    }

    /// Records an approval. Callers validate vote eligibility first; one
    /// principal never lands in both ballot sets.
    pub(crate) fn insert_approval(&mut self, principal: PrincipalId) {
        debug_assert!(!self.rejections.contains(&principal));
        self.approvals.insert(principal);
    }
}

/// Archive lifecycle of a project. The pending request only exists inside
/// the `PendingArchive` variant, so an archived project structurally cannot
/// carry a leftover request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ArchiveState {
    Active,
    PendingArchive { request: ArchiveRequest },
    Archived { archived_at: DateTime<Utc> },
}

impl ArchiveState {
    pub fn is_active(&self) -> bool {
        matches!(self, ArchiveState::Active)
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, ArchiveState::Archived { .. })
    }

    pub fn pending_request(&self) -> Option<&ArchiveRequest> {
        match self {
            ArchiveState::PendingArchive { request } => Some(request),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveState::Active => "active",
            ArchiveState::PendingArchive { .. } => "pending-archive",
            ArchiveState::Archived { .. } => "archived",
        }
    }
}

/// One pending admin-removal round, keyed by its target in the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalRequest {
    requested_by: PrincipalId,
    approvals: BTreeSet<PrincipalId>,
    rejections: BTreeSet<PrincipalId>,
    created_at: DateTime<Utc>,
}

impl RemovalRequest {
    pub(crate) fn new(requested_by: PrincipalId, created_at: DateTime<Utc>) -> Self {
        let mut approvals = BTreeSet::new();
        approvals.insert(requested_by.clone());
        Self {
            requested_by,
            approvals,
            rejections: BTreeSet::new(),
            created_at,
        }
    }

    pub fn requested_by(&self) -> &PrincipalId {
        &self.requested_by
    }

    pub fn approvals(&self) -> &BTreeSet<PrincipalId> {
        &self.approvals
    }

    pub fn rejections(&self) -> &BTreeSet<PrincipalId> {
        &self.rejections
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn has_approved(&self, principal: &PrincipalId) -> bool {
        self.approvals.contains(principal)
    }

    pub fn has_rejected(&self, principal: &PrincipalId) -> bool {
        self.rejections.contains(principal)
    }

    pub(crate) fn insert_approval(&mut self, principal: PrincipalId) {
        debug_assert!(!self.rejections.contains(&principal));
        self.approvals.insert(principal);
    }
}

/// Creation input for a project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    /// Principals seeded straight into the roster as members. Duplicates and
    /// the owner are filtered out.
    pub seed_members: Vec<PrincipalId>,
}

/// The project document. Field access goes through methods so every mutation
/// path can uphold the membership invariants:
///
/// - the owner is always in the roster with the admin role
/// - a principal holds exactly one role
/// - a removal request exists only while its target is still an admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: String,
    description: String,
    owner: PrincipalId,
    roster: BTreeMap<PrincipalId, Role>,
    status: ProjectStatus,
    deadline: Option<DateTime<Utc>>,
    archive: ArchiveState,
    admin_removal_requests: BTreeMap<PrincipalId, RemovalRequest>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

impl Project {
    pub fn new(
        owner: PrincipalId,
        details: NewProject,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let name = validate_text("project name", &details.name, NAME_MIN, NAME_MAX)?;
        let description = validate_text("project description", &details.description, 0, DESCRIPTION_MAX)?;

        let mut roster = BTreeMap::new();
        roster.insert(owner.clone(), Role::Admin);
        for member in details.seed_members {
            if member != owner {
                roster.entry(member).or_insert(Role::Member);
            }
        }

        Ok(Self {
            id: ProjectId::generate(),
            name,
            description,
            owner,
            roster,
            status: ProjectStatus::default(),
            deadline: details.deadline,
            archive: ArchiveState::Active,
            admin_removal_requests: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            revision: 0,
        })
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn owner(&self) -> &PrincipalId {
        &self.owner
    }

    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn archive(&self) -> &ArchiveState {
        &self.archive
    }

    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        match &self.archive {
            ArchiveState::Archived { archived_at } => Some(*archived_at),
            _ => None,
        }
    }

    pub fn roster(&self) -> &BTreeMap<PrincipalId, Role> {
        &self.roster
    }

    pub fn role_of(&self, principal: &PrincipalId) -> Option<Role> {
        self.roster.get(principal).copied()
    }

    pub fn is_admin(&self, principal: &PrincipalId) -> bool {
        self.role_of(principal) == Some(Role::Admin)
    }

    pub fn in_roster(&self, principal: &PrincipalId) -> bool {
        self.roster.contains_key(principal)
    }

    pub fn admins(&self) -> impl Iterator<Item = &PrincipalId> {
        self.roster
            .iter()
            .filter(|(_, role)| **role == Role::Admin)
            .map(|(principal, _)| principal)
    }

    pub fn admin_count(&self) -> usize {
        self.admins().count()
    }

    pub fn removal_requests(&self) -> &BTreeMap<PrincipalId, RemovalRequest> {
        &self.admin_removal_requests
    }

    pub fn removal_request(&self, target: &PrincipalId) -> Option<&RemovalRequest> {
        self.admin_removal_requests.get(target)
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

    pub(crate) fn set_status(&mut self, status: ProjectStatus) {
        self.status = status;
    }

    /// Adds a brand-new principal to the roster as a member.
    pub(crate) fn insert_member(&mut self, principal: PrincipalId) {
        debug_assert!(!self.roster.contains_key(&principal));
        self.roster.insert(principal, Role::Member);
    }

    /// Grants the admin role to an existing roster entry.
    pub(crate) fn grant_admin(&mut self, principal: &PrincipalId) {
        debug_assert!(self.roster.contains_key(principal));
        self.roster.insert(principal.clone(), Role::Admin);
    }

    /// Demotes an admin back to member and drops any removal round that was
    /// targeting them, since such a round may only exist while the target is
    /// still an admin.
    pub(crate) fn demote_to_member(&mut self, principal: &PrincipalId) {
        debug_assert!(self.is_admin(principal));
        debug_assert!(*principal != self.owner);
        self.roster.insert(principal.clone(), Role::Member);
        self.admin_removal_requests.remove(principal);
    }

    pub(crate) fn start_archive_round(&mut self, request: ArchiveRequest) {
        debug_assert!(self.archive.is_active());
        self.archive = ArchiveState::PendingArchive { request };
    }

    pub(crate) fn pending_archive_mut(&mut self) -> Option<&mut ArchiveRequest> {
        match &mut self.archive {
            ArchiveState::PendingArchive { request } => Some(request),
            _ => None,
        }
    }

    pub(crate) fn finish_archive(&mut self, archived_at: DateTime<Utc>) {
        self.archive = ArchiveState::Archived { archived_at };
    }

    pub(crate) fn cancel_archive_round(&mut self) {
        debug_assert!(self.archive.pending_request().is_some());
        self.archive = ArchiveState::Active;
    }

    pub(crate) fn insert_removal_request(&mut self, target: PrincipalId, request: RemovalRequest) {
        debug_assert!(self.is_admin(&target));
        self.admin_removal_requests.insert(target, request);
    }

    pub(crate) fn removal_request_mut(&mut self, target: &PrincipalId) -> Option<&mut RemovalRequest> {
        self.admin_removal_requests.get_mut(target)
    }

    pub(crate) fn clear_removal_request(&mut self, target: &PrincipalId) -> Option<RemovalRequest> {
        self.admin_removal_requests.remove(target)
    }
}
