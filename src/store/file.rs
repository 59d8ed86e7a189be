// Flat-file JSON backend. One document per file under the store root, with
// an advisory file lock serializing writers across processes.

use async_trait::async_trait;
use fd_lock::RwLock as FileLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ProjectStore, StoreError, TaskStore};
use crate::models::{Project, ProjectId, Task, TaskId};

const LOCK_FILE: &str = "store.lock";
const PROJECTS_DIR: &str = "projects";
const TASKS_DIR: &str = "tasks";

#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
    lock_path: PathBuf,
}

impl JsonStore {
    /// Opens (and lays out, if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(PROJECTS_DIR))?;
        fs::create_dir_all(root.join(TASKS_DIR))?;
        let lock_path = root.join(LOCK_FILE);
        debug!(root = %root.display(), "opened json document store");
        Ok(Self { root, lock_path })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock_handle(&self) -> Result<FileLock<File>, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        Ok(FileLock::new(file))
    }

    fn project_path(&self, id: ProjectId) -> PathBuf {
        self.root.join(PROJECTS_DIR).join(format!("{id}.json"))
    }

    fn task_path(&self, id: TaskId) -> PathBuf {
        self.root.join(TASKS_DIR).join(format!("{id}.json"))
    }

    fn read_doc<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    // Write-then-rename keeps readers from ever observing a torn document.
    fn write_doc<T: Serialize>(path: &Path, doc: &T) -> Result<(), StoreError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(doc)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn list_dir<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>, StoreError> {
        let mut docs = Vec::new();
        for entry in fs::read_dir(self.root.join(dir))? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(doc) = Self::read_doc(&path)? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }
}

#[async_trait]
impl ProjectStore for JsonStore {
    async fn insert_project(&self, mut project: Project) -> Result<Project, StoreError> {
        let mut lock = self.lock_handle()?;
        let _guard = lock.write()?;

        let path = self.project_path(project.id());
        if path.exists() {
            return Err(StoreError::ProjectAlreadyExists(project.id()));
        }
        project.set_revision(1);
        Self::write_doc(&path, &project)?;
        Ok(project)
    }

    async fn load_project(&self, id: ProjectId) -> Result<Project, StoreError> {
        let mut lock = self.lock_handle()?;
        let _guard = lock.read()?;

        Self::read_doc(&self.project_path(id))?.ok_or(StoreError::ProjectNotFound(id))
    }

    async fn save_project(&self, mut project: Project) -> Result<Project, StoreError> {
        let mut lock = self.lock_handle()?;
        let _guard = lock.write()?;

        let path = self.project_path(project.id());
        let stored: Project =
            Self::read_doc(&path)?.ok_or(StoreError::ProjectNotFound(project.id()))?;
        if stored.revision() != project.revision() {
            return Err(StoreError::RevisionConflict {
                document: format!("project {}", project.id()),
                submitted: project.revision(),
                stored: stored.revision(),
            });
        }
        project.set_revision(project.revision() + 1);
        Self::write_doc(&path, &project)?;
        Ok(project)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut lock = self.lock_handle()?;
        let _guard = lock.read()?;

        let mut projects: Vec<Project> = self.list_dir(PROJECTS_DIR)?;
        projects.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(projects)
    }
}

#[async_trait]
impl TaskStore for JsonStore {
    async fn insert_task(&self, mut task: Task) -> Result<Task, StoreError> {
        let mut lock = self.lock_handle()?;
        let _guard = lock.write()?;

        let path = self.task_path(task.id());
        if path.exists() {
            return Err(StoreError::TaskAlreadyExists(task.id()));
        }
        task.set_revision(1);
        Self::write_doc(&path, &task)?;
        Ok(task)
    }

    async fn load_task(&self, id: TaskId) -> Result<Task, StoreError> {
        let mut lock = self.lock_handle()?;
        let _guard = lock.read()?;

        Self::read_doc(&self.task_path(id))?.ok_or(StoreError::TaskNotFound(id))
    }

    async fn save_task(&self, mut task: Task) -> Result<Task, StoreError> {
        let mut lock = self.lock_handle()?;
        let _guard = lock.write()?;

        let path = self.task_path(task.id());
        let stored: Task = Self::read_doc(&path)?.ok_or(StoreError::TaskNotFound(task.id()))?;
        if stored.revision() != task.revision() {
            return Err(StoreError::RevisionConflict {
                document: format!("task {}", task.id()),
                submitted: task.revision(),
                stored: stored.revision(),
            });
        }
        task.set_revision(task.revision() + 1);
        Self::write_doc(&path, &task)?;
        Ok(task)
    }

    async fn list_tasks(&self, project: ProjectId) -> Result<Vec<Task>, StoreError> {
        let mut lock = self.lock_handle()?;
        let _guard = lock.read()?;

        let mut tasks: Vec<Task> = self.list_dir(TASKS_DIR)?;
        tasks.retain(|t| t.project_id() == project);
        tasks.sort_by_key(|t| (t.created_at(), t.id()));
        Ok(tasks)
    }
}
