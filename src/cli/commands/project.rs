use anyhow::Result;

use super::{acting_principal, open_engine, parse_deadline, parse_principals, parse_project_id, Command};
use crate::models::{NewProject, Project, ProjectStatus, Role};

/// One-project summary shared by `project show` and the mutating commands.
pub(crate) fn print_project(project: &Project) {
    println!("📋 {} ({})", project.name(), project.id());
    if !project.description().is_empty() {
        println!("   {}", project.description());
    }
    println!("   status: {}", project.status());
    println!("   lifecycle: {}", project.archive().as_str());
    if let Some(deadline) = project.deadline() {
        println!("   deadline: {}", deadline.to_rfc3339());
    }
    if let Some(archived_at) = project.archived_at() {
        println!("   archived at: {}", archived_at.to_rfc3339());
    }

    println!("   roster:");
    for (principal, role) in project.roster() {
        let marker = if principal == project.owner() {
            "owner"
        } else {
            match role {
                Role::Admin => "admin",
                Role::Member => "member",
            }
        };
        println!("     {principal} ({marker})");
    }

    if let Some(request) = project.archive().pending_request() {
        println!(
            "   pending archive round: requested by {}, approvals [{}]",
            request.requested_by(),
            request
                .approvals()
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    for (target, request) in project.removal_requests() {
        println!(
            "   pending removal of {target}: requested by {}, approvals [{}]",
            request.requested_by(),
            request
                .approvals()
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

pub struct ProjectCreateCommand {
    actor: Option<String>,
    name: String,
    description: String,
    deadline: Option<String>,
    members: Vec<String>,
}

impl ProjectCreateCommand {
    pub fn new(
        actor: Option<String>,
        name: String,
        description: String,
        deadline: Option<String>,
        members: Vec<String>,
    ) -> Self {
        Self {
            actor,
            name,
            description,
            deadline,
            members,
        }
    }
}

impl Command for ProjectCreateCommand {
    async fn execute(&self) -> Result<()> {
        let owner = acting_principal(&self.actor)?;
        let engine = open_engine().await?;
        let project = engine
            .create_project(
                &owner,
                NewProject {
                    name: self.name.clone(),
                    description: self.description.clone(),
                    deadline: parse_deadline(&self.deadline)?,
                    seed_members: parse_principals(&self.members)?,
                },
            )
            .await?;

        println!("✅ Created project '{}'", project.name());
        println!("   id: {}", project.id());
        println!("   owner: {}", project.owner());
        println!("   roster size: {}", project.roster().len());
        Ok(())
    }
}

pub struct ProjectShowCommand {
    project: String,
}

impl ProjectShowCommand {
    pub fn new(project: String) -> Self {
        Self { project }
    }
}

impl Command for ProjectShowCommand {
    async fn execute(&self) -> Result<()> {
        let id = parse_project_id(&self.project)?;
        let engine = open_engine().await?;
        let project = engine.project(id).await?;
        print_project(&project);
        Ok(())
    }
}

pub struct ProjectListCommand;

impl ProjectListCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProjectListCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for ProjectListCommand {
    async fn execute(&self) -> Result<()> {
        let engine = open_engine().await?;
        let projects = engine.projects().await?;
        if projects.is_empty() {
            println!("📭 No projects in the store yet");
            return Ok(());
        }

        println!("📚 {} project(s):", projects.len());
        for project in &projects {
            println!(
                "   {} — {} [{}] ({} roster, {} admin)",
                project.id(),
                project.name(),
                project.archive().as_str(),
                project.roster().len(),
                project.admin_count()
            );
        }
        Ok(())
    }
}

pub struct ProjectStatusCommand {
    actor: Option<String>,
    project: String,
    status: String,
}

impl ProjectStatusCommand {
    pub fn new(actor: Option<String>, project: String, status: String) -> Self {
        Self {
            actor,
            project,
            status,
        }
    }
}

impl Command for ProjectStatusCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;
        let status: ProjectStatus = self.status.parse()?;

        let engine = open_engine().await?;
        let project = engine.set_status(&caller, id, status).await?;
        println!("✅ Project '{}' is now {}", project.name(), project.status());
        Ok(())
    }
}
