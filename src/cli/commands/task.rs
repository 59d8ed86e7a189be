use anyhow::Result;

use super::{
    acting_principal, open_engine, parse_deadline, parse_principals, parse_project_id,
    parse_task_id, Command,
};
use crate::models::{NewTask, TaskPriority, TaskStatus};

pub struct TaskCreateCommand {
    actor: Option<String>,
    project: String,
    title: String,
    description: String,
    priority: String,
    deadline: Option<String>,
    assignees: Vec<String>,
}

impl TaskCreateCommand {
    pub fn new(
        actor: Option<String>,
        project: String,
        title: String,
        description: String,
        priority: String,
        deadline: Option<String>,
        assignees: Vec<String>,
    ) -> Self {
        Self {
            actor,
            project,
            title,
            description,
            priority,
            deadline,
            assignees,
        }
    }
}

impl Command for TaskCreateCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;
        let priority: TaskPriority = self.priority.parse()?;

        let engine = open_engine().await?;
        let task = engine
            .create_task(
                &caller,
                id,
                NewTask {
                    title: self.title.clone(),
                    description: self.description.clone(),
                    priority,
                    deadline: parse_deadline(&self.deadline)?,
                    assignees: parse_principals(&self.assignees)?,
                },
            )
            .await?;

        println!("✅ Created task '{}'", task.title());
        println!("   id: {}", task.id());
        println!("   priority: {}", task.priority());
        println!(
            "   assignees: {}",
            task.assignees()
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }
}

pub struct TaskAssignCommand {
    actor: Option<String>,
    task: String,
    assignees: Vec<String>,
}

impl TaskAssignCommand {
    pub fn new(actor: Option<String>, task: String, assignees: Vec<String>) -> Self {
        Self {
            actor,
            task,
            assignees,
        }
    }
}

impl Command for TaskAssignCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_task_id(&self.task)?;
        let assignees = parse_principals(&self.assignees)?;

        let engine = open_engine().await?;
        let task = engine.assign_task(&caller, id, assignees).await?;
        println!(
            "✅ Task '{}' now assigned to: {}",
            task.title(),
            task.assignees()
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }
}

pub struct TaskStatusCommand {
    actor: Option<String>,
    task: String,
    status: String,
}

impl TaskStatusCommand {
    pub fn new(actor: Option<String>, task: String, status: String) -> Self {
        Self {
            actor,
            task,
            status,
        }
    }
}

impl Command for TaskStatusCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_task_id(&self.task)?;
        let status: TaskStatus = self.status.parse()?;

        let engine = open_engine().await?;
        let task = engine.update_task_status(&caller, id, status).await?;
        println!("✅ Task '{}' is now {}", task.title(), task.status());
        Ok(())
    }
}

pub struct TaskListCommand {
    project: String,
}

impl TaskListCommand {
    pub fn new(project: String) -> Self {
        Self { project }
    }
}

impl Command for TaskListCommand {
    async fn execute(&self) -> Result<()> {
        let id = parse_project_id(&self.project)?;
        let engine = open_engine().await?;
        let tasks = engine.tasks(id).await?;

        if tasks.is_empty() {
            println!("📭 No tasks in this project yet");
            return Ok(());
        }

        println!("📝 {} task(s):", tasks.len());
        for task in &tasks {
            println!(
                "   {} — {} [{} | {}] → {}",
                task.id(),
                task.title(),
                task.status(),
                task.priority(),
                task.assignees()
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(())
    }
}
