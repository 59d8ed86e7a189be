// In-process store backed by a shared map. The default backend for tests and
// for single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{ProjectStore, StoreError, TaskStore};
use crate::models::{Project, ProjectId, Task, TaskId};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, mut project: Project) -> Result<Project, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.projects.contains_key(&project.id()) {
            return Err(StoreError::ProjectAlreadyExists(project.id()));
        }
        project.set_revision(1);
        inner.projects.insert(project.id(), project.clone());
        Ok(project)
    }

    async fn load_project(&self, id: ProjectId) -> Result<Project, StoreError> {
        let inner = self.inner.read().await;
        inner
            .projects
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProjectNotFound(id))
    }

    async fn save_project(&self, mut project: Project) -> Result<Project, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .projects
            .get(&project.id())
            .ok_or(StoreError::ProjectNotFound(project.id()))?;
        if stored.revision() != project.revision() {
            return Err(StoreError::RevisionConflict {
                document: format!("project {}", project.id()),
                submitted: project.revision(),
                stored: stored.revision(),
            });
        }
        project.set_revision(project.revision() + 1);
        inner.projects.insert(project.id(), project.clone());
        Ok(project)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.read().await;
        let mut projects: Vec<Project> = inner.projects.values().cloned().collect();
        projects.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(projects)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, mut task: Task) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.tasks.contains_key(&task.id()) {
            return Err(StoreError::TaskAlreadyExists(task.id()));
        }
        task.set_revision(1);
        inner.tasks.insert(task.id(), task.clone());
        Ok(task)
    }

    async fn load_task(&self, id: TaskId) -> Result<Task, StoreError> {
        let inner = self.inner.read().await;
        inner
            .tasks
            .get(&id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(id))
    }

    async fn save_task(&self, mut task: Task) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .tasks
            .get(&task.id())
            .ok_or(StoreError::TaskNotFound(task.id()))?;
        if stored.revision() != task.revision() {
            return Err(StoreError::RevisionConflict {
                document: format!("task {}", task.id()),
                submitted: task.revision(),
                stored: stored.revision(),
            });
        }
        task.set_revision(task.revision() + 1);
        inner.tasks.insert(task.id(), task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, project: ProjectId) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|t| t.project_id() == project)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at(), t.id()));
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, PrincipalId};
    use chrono::Utc;

    fn sample_project() -> Project {
        Project::new(
            PrincipalId::new("olive").unwrap(),
            NewProject {
                name: "roadmap cleanup".to_string(),
                ..NewProject::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_revision_one() {
        let store = MemoryStore::new();
        let stored = store.insert_project(sample_project()).await.unwrap();
        assert_eq!(stored.revision(), 1);

        let loaded = store.load_project(stored.id()).await.unwrap();
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn double_insert_is_rejected() {
        let store = MemoryStore::new();
        let stored = store.insert_project(sample_project()).await.unwrap();
        let err = store.insert_project(stored).await.unwrap_err();
        assert!(matches!(err, StoreError::ProjectAlreadyExists(_)));
    }

    #[tokio::test]
    async fn save_bumps_the_revision() {
        let store = MemoryStore::new();
        let stored = store.insert_project(sample_project()).await.unwrap();
        let saved = store.save_project(stored).await.unwrap();
        assert_eq!(saved.revision(), 2);
    }

    #[tokio::test]
    async fn stale_save_is_a_revision_conflict() {
        let store = MemoryStore::new();
        let first_copy = store.insert_project(sample_project()).await.unwrap();
        let second_copy = first_copy.clone();

        store.save_project(first_copy).await.unwrap();
        let err = store.save_project(second_copy).await.unwrap_err();
        assert!(err.is_revision_conflict());
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let store = MemoryStore::new();
        let err = store.load_project(ProjectId::generate()).await.unwrap_err();
        assert!(matches!(err, StoreError::ProjectNotFound(_)));
    }
}
