// SQLite backend for deployments that outgrow flat files. Documents are
// stored as JSON bodies next to a revision column; the compare-and-swap
// happens in the UPDATE predicate, so concurrent writers race at the
// database instead of in process memory.

use async_trait::async_trait;
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
use tracing::info;

use super::{ProjectStore, StoreError, TaskStore};
use crate::models::{Project, ProjectId, Task, TaskId};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to `database_url`, creating the database and schema on first
    /// use.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                revision INTEGER NOT NULL,
                body TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                revision INTEGER NOT NULL,
                body TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS tasks_project_idx ON tasks (project_id)")
            .execute(&pool)
            .await?;

        info!("sqlite document store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn shutdown(&self) {
        info!("closing sqlite connections");
        self.pool.close().await;
    }

    fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
    }
}

#[async_trait]
impl ProjectStore for SqliteStore {
    async fn insert_project(&self, mut project: Project) -> Result<Project, StoreError> {
        project.set_revision(1);
        let body = serde_json::to_string(&project)?;
        let result = sqlx::query("INSERT INTO projects (id, revision, body) VALUES (?1, 1, ?2)")
            .bind(project.id().to_string())
            .bind(body)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(project),
            Err(err) if Self::is_unique_violation(&err) => {
                Err(StoreError::ProjectAlreadyExists(project.id()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn load_project(&self, id: ProjectId) -> Result<Project, StoreError> {
        let row = sqlx::query("SELECT body FROM projects WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(serde_json::from_str(&body)?)
            }
            None => Err(StoreError::ProjectNotFound(id)),
        }
    }

    async fn save_project(&self, mut project: Project) -> Result<Project, StoreError> {
        let submitted = project.revision();
        project.set_revision(submitted + 1);
        let body = serde_json::to_string(&project)?;

        let result = sqlx::query(
            "UPDATE projects SET revision = ?2, body = ?3 WHERE id = ?1 AND revision = ?4",
        )
        .bind(project.id().to_string())
        .bind(project.revision() as i64)
        .bind(body)
        .bind(submitted as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(project);
        }

        // The predicate missed: either the row is gone or another writer
        // moved the revision. Look at what is stored to tell the two apart.
        let row = sqlx::query("SELECT revision FROM projects WHERE id = ?1")
            .bind(project.id().to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let stored: i64 = row.get("revision");
                Err(StoreError::RevisionConflict {
                    document: format!("project {}", project.id()),
                    submitted,
                    stored: stored as u64,
                })
            }
            None => Err(StoreError::ProjectNotFound(project.id())),
        }
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query("SELECT body FROM projects")
            .fetch_all(&self.pool)
            .await?;

        let mut projects = Vec::with_capacity(rows.len());
        for row in rows {
            let body: String = row.get("body");
            projects.push(serde_json::from_str(&body)?);
        }
        projects.sort_by_key(|p: &Project| (p.created_at(), p.id()));
        Ok(projects)
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn insert_task(&self, mut task: Task) -> Result<Task, StoreError> {
        task.set_revision(1);
        let body = serde_json::to_string(&task)?;
        let result =
            sqlx::query("INSERT INTO tasks (id, project_id, revision, body) VALUES (?1, ?2, 1, ?3)")
                .bind(task.id().to_string())
                .bind(task.project_id().to_string())
                .bind(body)
                .execute(&self.pool)
                .await;

        match result {
            Ok(_) => Ok(task),
            Err(err) if Self::is_unique_violation(&err) => {
                Err(StoreError::TaskAlreadyExists(task.id()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn load_task(&self, id: TaskId) -> Result<Task, StoreError> {
        let row = sqlx::query("SELECT body FROM tasks WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(serde_json::from_str(&body)?)
            }
            None => Err(StoreError::TaskNotFound(id)),
        }
    }

    async fn save_task(&self, mut task: Task) -> Result<Task, StoreError> {
        let submitted = task.revision();
        task.set_revision(submitted + 1);
        let body = serde_json::to_string(&task)?;

        let result = sqlx::query(
            "UPDATE tasks SET revision = ?2, body = ?3 WHERE id = ?1 AND revision = ?4",
        )
        .bind(task.id().to_string())
        .bind(task.revision() as i64)
        .bind(body)
        .bind(submitted as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(task);
        }

        let row = sqlx::query("SELECT revision FROM tasks WHERE id = ?1")
            .bind(task.id().to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let stored: i64 = row.get("revision");
                Err(StoreError::RevisionConflict {
                    document: format!("task {}", task.id()),
                    submitted,
                    stored: stored as u64,
                })
            }
            None => Err(StoreError::TaskNotFound(task.id())),
        }
    }

    async fn list_tasks(&self, project: ProjectId) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query("SELECT body FROM tasks WHERE project_id = ?1")
            .bind(project.to_string())
            .fetch_all(&self.pool)
            .await?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            let body: String = row.get("body");
            tasks.push(serde_json::from_str(&body)?);
        }
        tasks.sort_by_key(|t: &Task| (t.created_at(), t.id()));
        Ok(tasks)
    }
}
