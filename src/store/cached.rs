// Caching and throttling wrapper around any store backend. Keeps hot project
// and task documents in a TTL cache and rate-limits trips to the backend so
// a chatty caller cannot hammer shared storage.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{ProjectStore, StoreError, TaskStore};
use crate::models::{Project, ProjectId, Task, TaskId};

#[derive(Debug, Clone)]
pub struct CachedStore<S> {
    inner: S,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    projects: Cache<ProjectId, Project>,
    tasks: Cache<TaskId, Task>,
}

impl<S> CachedStore<S> {
    /// Wraps `inner` with a 30 second document cache and a backend budget of
    /// 20 trips per second with bursts up to 50.
    pub fn new(inner: S) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(20).unwrap())
            .allow_burst(NonZeroU32::new(50).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let projects = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(30))
            .build();
        let tasks = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(30))
            .build();

        Self {
            inner,
            rate_limiter,
            projects,
            tasks,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn tick(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;
    }
}

#[async_trait]
impl<S: ProjectStore> ProjectStore for CachedStore<S> {
    async fn insert_project(&self, project: Project) -> Result<Project, StoreError> {
        self.tick().await;
        let stored = self.inner.insert_project(project).await?;
        self.projects.insert(stored.id(), stored.clone()).await;
        Ok(stored)
    }

    async fn load_project(&self, id: ProjectId) -> Result<Project, StoreError> {
        if let Some(cached) = self.projects.get(&id).await {
            debug!(project = %id, "project cache hit");
            return Ok(cached);
        }
        self.tick().await;
        let loaded = self.inner.load_project(id).await?;
        self.projects.insert(id, loaded.clone()).await;
        Ok(loaded)
    }

    async fn save_project(&self, project: Project) -> Result<Project, StoreError> {
        self.tick().await;
        let id = project.id();
        match self.inner.save_project(project).await {
            Ok(stored) => {
                self.projects.insert(stored.id(), stored.clone()).await;
                Ok(stored)
            }
            Err(err) => {
                // A stale cached copy lost the race; drop it so the next
                // load refetches.
                if err.is_revision_conflict() {
                    debug!(project = %id, "evicting cached project after revision conflict");
                    self.projects.invalidate(&id).await;
                }
                Err(err)
            }
        }
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.tick().await;
        self.inner.list_projects().await
    }
}

#[async_trait]
impl<S: TaskStore> TaskStore for CachedStore<S> {
    async fn insert_task(&self, task: Task) -> Result<Task, StoreError> {
        self.tick().await;
        let stored = self.inner.insert_task(task).await?;
        self.tasks.insert(stored.id(), stored.clone()).await;
        Ok(stored)
    }

    async fn load_task(&self, id: TaskId) -> Result<Task, StoreError> {
        if let Some(cached) = self.tasks.get(&id).await {
            debug!(task = %id, "task cache hit");
            return Ok(cached);
        }
        self.tick().await;
        let loaded = self.inner.load_task(id).await?;
        self.tasks.insert(id, loaded.clone()).await;
        Ok(loaded)
    }

    async fn save_task(&self, task: Task) -> Result<Task, StoreError> {
        self.tick().await;
        let id = task.id();
        match self.inner.save_task(task).await {
            Ok(stored) => {
                self.tasks.insert(stored.id(), stored.clone()).await;
                Ok(stored)
            }
            Err(err) => {
                if err.is_revision_conflict() {
                    self.tasks.invalidate(&id).await;
                }
                Err(err)
            }
        }
    }

    async fn list_tasks(&self, project: ProjectId) -> Result<Vec<Task>, StoreError> {
        self.tick().await;
        self.inner.list_tasks(project).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, PrincipalId};
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn sample_project() -> Project {
        Project::new(
            PrincipalId::new("olive").unwrap(),
            NewProject {
                name: "cache coverage".to_string(),
                ..NewProject::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn loads_are_served_from_cache_after_insert() {
        let store = CachedStore::new(MemoryStore::new());
        let stored = store.insert_project(sample_project()).await.unwrap();
        let loaded = store.load_project(stored.id()).await.unwrap();
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn conflict_evicts_the_stale_copy() {
        let backend = MemoryStore::new();
        let store = CachedStore::new(backend.clone());

        let stored = store.insert_project(sample_project()).await.unwrap();
        // Another writer lands a revision directly against the backend.
        let behind_our_back = backend.load_project(stored.id()).await.unwrap();
        backend.save_project(behind_our_back).await.unwrap();

        let err = store.save_project(stored.clone()).await.unwrap_err();
        assert!(err.is_revision_conflict());

        // The next load must come back at the backend's revision.
        let reloaded = store.load_project(stored.id()).await.unwrap();
        assert_eq!(reloaded.revision(), 2);
    }
}
