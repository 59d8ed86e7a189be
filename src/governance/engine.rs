// Orchestration layer. Every mutating operation runs as a single
// load-validate-mutate-persist sequence against the store; a lost
// compare-and-swap reloads the document and replays the transition,
// bounded by the retry policy.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn, Instrument};

use super::{
    archive, membership, removal, tasks, ArchiveOutcome, GovernanceError, RemovalOutcome,
};
use crate::models::{
    NewProject, NewTask, PrincipalId, Project, ProjectId, ProjectStatus, Task, TaskId, TaskStatus,
};
use crate::observability::governance_metrics;
use crate::store::{ProjectStore, TaskStore};
use crate::telemetry::governance_span;

/// Bounded retry for lost revision races.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(250),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let mut delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        if self.jitter {
            let spread = (delay.as_millis() as u64).max(1) / 2;
            delay += Duration::from_millis(rand::rng().random_range(0..=spread));
        }
        delay
    }
}

/// The governance surface. Generic over the store so the CLI, tests, and a
/// future service frontend can run the same engine against different
/// backends.
#[derive(Debug, Clone)]
pub struct GovernanceEngine<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S> GovernanceEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ProjectStore> GovernanceEngine<S> {
    pub async fn create_project(
        &self,
        owner: &PrincipalId,
        details: NewProject,
    ) -> Result<Project, GovernanceError> {
        governance_metrics().record_operation();
        let project = Project::new(owner.clone(), details, Utc::now())?;
        let stored = self.store.insert_project(project).await?;
        info!(project = %stored.id(), %owner, "project created");
        Ok(stored)
    }

    pub async fn project(&self, id: ProjectId) -> Result<Project, GovernanceError> {
        Ok(self.store.load_project(id).await?)
    }

    pub async fn projects(&self) -> Result<Vec<Project>, GovernanceError> {
        Ok(self.store.list_projects().await?)
    }

    pub async fn add_member(
        &self,
        caller: &PrincipalId,
        id: ProjectId,
        target: &PrincipalId,
    ) -> Result<Project, GovernanceError> {
        let (project, ()) = self
            .commit_project("add_member", caller, id, |project, now| {
                membership::add_member(project, caller, target, now)
            })
            .await?;
        Ok(project)
    }

    pub async fn promote_to_admin(
        &self,
        caller: &PrincipalId,
        id: ProjectId,
        target: &PrincipalId,
    ) -> Result<Project, GovernanceError> {
        let (project, ()) = self
            .commit_project("promote_to_admin", caller, id, |project, now| {
                membership::promote_to_admin(project, caller, target, now)
            })
            .await?;
        Ok(project)
    }

    pub async fn set_status(
        &self,
        caller: &PrincipalId,
        id: ProjectId,
        status: ProjectStatus,
    ) -> Result<Project, GovernanceError> {
        let (project, ()) = self
            .commit_project("set_status", caller, id, |project, now| {
                membership::set_status(project, caller, status, now)
            })
            .await?;
        Ok(project)
    }

    pub async fn initiate_archive(
        &self,
        caller: &PrincipalId,
        id: ProjectId,
    ) -> Result<(Project, ArchiveOutcome), GovernanceError> {
        let result = self
            .commit_project("initiate_archive", caller, id, |project, now| {
                archive::initiate(project, caller, now)
            })
            .await?;
        if result.1 == ArchiveOutcome::Archived {
            governance_metrics().record_archive_completed();
        }
        Ok(result)
    }

    pub async fn approve_archive(
        &self,
        caller: &PrincipalId,
        id: ProjectId,
    ) -> Result<(Project, ArchiveOutcome), GovernanceError> {
        let result = self
            .commit_project("approve_archive", caller, id, |project, now| {
                archive::approve(project, caller, now)
            })
            .await?;
        if result.1 == ArchiveOutcome::Archived {
            governance_metrics().record_archive_completed();
        }
        Ok(result)
    }

    pub async fn reject_archive(
        &self,
        caller: &PrincipalId,
        id: ProjectId,
    ) -> Result<(Project, ArchiveOutcome), GovernanceError> {
        let result = self
            .commit_project("reject_archive", caller, id, |project, now| {
                archive::reject(project, caller, now)
            })
            .await?;
        governance_metrics().record_rejection();
        Ok(result)
    }

    pub async fn initiate_admin_removal(
        &self,
        caller: &PrincipalId,
        id: ProjectId,
        target: &PrincipalId,
    ) -> Result<(Project, RemovalOutcome), GovernanceError> {
        let result = self
            .commit_project("initiate_admin_removal", caller, id, |project, now| {
                removal::initiate(project, caller, target, now)
            })
            .await?;
        if result.1 == RemovalOutcome::Demoted {
            governance_metrics().record_removal_completed();
        }
        Ok(result)
    }

    pub async fn approve_admin_removal(
        &self,
        caller: &PrincipalId,
        id: ProjectId,
        target: &PrincipalId,
    ) -> Result<(Project, RemovalOutcome), GovernanceError> {
        let result = self
            .commit_project("approve_admin_removal", caller, id, |project, now| {
                removal::approve(project, caller, target, now)
            })
            .await?;
        if result.1 == RemovalOutcome::Demoted {
            governance_metrics().record_removal_completed();
        }
        Ok(result)
    }

    pub async fn reject_admin_removal(
        &self,
        caller: &PrincipalId,
        id: ProjectId,
        target: &PrincipalId,
    ) -> Result<(Project, RemovalOutcome), GovernanceError> {
        let result = self
            .commit_project("reject_admin_removal", caller, id, |project, now| {
                removal::reject(project, caller, target, now)
            })
            .await?;
        governance_metrics().record_rejection();
        Ok(result)
    }

    /// Shared load-mutate-save loop for project documents.
    async fn commit_project<T, F>(
        &self,
        operation: &'static str,
        caller: &PrincipalId,
        id: ProjectId,
        op: F,
    ) -> Result<(Project, T), GovernanceError>
    where
        F: Fn(&mut Project, DateTime<Utc>) -> Result<T, GovernanceError>,
    {
        let span = governance_span(operation, &id.to_string(), caller.as_str());
        async {
            governance_metrics().record_operation();
            let mut attempt = 0u32;
            loop {
                attempt += 1;
                let mut project = self.store.load_project(id).await?;
                let outcome = op(&mut project, Utc::now())?;
                match self.store.save_project(project).await {
                    Ok(stored) => return Ok((stored, outcome)),
                    Err(err) if err.is_revision_conflict() => {
                        if attempt >= self.retry.max_attempts {
                            governance_metrics().record_revision_failure();
                            return Err(GovernanceError::VersionConflict { attempts: attempt });
                        }
                        governance_metrics().record_revision_retry();
                        let delay = self.retry.delay_for(attempt);
                        warn!(
                            project = %id,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "revision conflict, replaying transition"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl<S: ProjectStore + TaskStore> GovernanceEngine<S> {
    pub async fn create_task(
        &self,
        caller: &PrincipalId,
        project_id: ProjectId,
        details: NewTask,
    ) -> Result<Task, GovernanceError> {
        let span = governance_span("create_task", &project_id.to_string(), caller.as_str());
        async {
            governance_metrics().record_operation();
            let project = self.store.load_project(project_id).await?;
            let task = tasks::create(&project, caller, details, Utc::now())?;
            let stored = self.store.insert_task(task).await?;
            info!(task = %stored.id(), project = %project_id, "task created");
            Ok(stored)
        }
        .instrument(span)
        .await
    }

    pub async fn assign_task(
        &self,
        caller: &PrincipalId,
        id: TaskId,
        assignees: Vec<PrincipalId>,
    ) -> Result<Task, GovernanceError> {
        self.commit_task("assign_task", caller, id, |project, task, now| {
            tasks::assign(project, task, caller, assignees.clone(), now)
        })
        .await
    }

    pub async fn update_task_status(
        &self,
        caller: &PrincipalId,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<Task, GovernanceError> {
        self.commit_task("update_task_status", caller, id, |project, task, now| {
            tasks::update_status(project, task, caller, status, now)
        })
        .await
    }

    pub async fn task(&self, id: TaskId) -> Result<Task, GovernanceError> {
        Ok(self.store.load_task(id).await?)
    }

    pub async fn tasks(&self, project: ProjectId) -> Result<Vec<Task>, GovernanceError> {
        // Surface an unknown project as NotFound instead of an empty list.
        self.store.load_project(project).await?;
        Ok(self.store.list_tasks(project).await?)
    }

    /// Shared load-mutate-save loop for task documents. The owning project
    /// is reloaded on every attempt so roster and archive checks always see
    /// current state.
    async fn commit_task<F>(
        &self,
        operation: &'static str,
        caller: &PrincipalId,
        id: TaskId,
        op: F,
    ) -> Result<Task, GovernanceError>
    where
        F: Fn(&Project, &mut Task, DateTime<Utc>) -> Result<(), GovernanceError>,
    {
        let span = governance_span(operation, &id.to_string(), caller.as_str());
        async {
            governance_metrics().record_operation();
            let mut attempt = 0u32;
            loop {
                attempt += 1;
                let mut task = self.store.load_task(id).await?;
                let project = self.store.load_project(task.project_id()).await?;
                op(&project, &mut task, Utc::now())?;
                match self.store.save_task(task).await {
                    Ok(stored) => return Ok(stored),
                    Err(err) if err.is_revision_conflict() => {
                        if attempt >= self.retry.max_attempts {
                            governance_metrics().record_revision_failure();
                            return Err(GovernanceError::VersionConflict { attempts: attempt });
                        }
                        governance_metrics().record_revision_retry();
                        let delay = self.retry.delay_for(attempt);
                        warn!(
                            task = %id,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "revision conflict, replaying transition"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
        .instrument(span)
        .await
    }
}
