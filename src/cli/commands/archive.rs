use anyhow::Result;

use super::{acting_principal, open_engine, parse_project_id, Command};
use crate::governance::ArchiveOutcome;
use crate::models::Project;

fn print_archive_outcome(project: &Project, outcome: ArchiveOutcome) {
    match outcome {
        ArchiveOutcome::Pending {
            approvals,
            required,
        } => {
            println!(
                "🗳️  Archive round for '{}' pending: {approvals}/{required} approvals",
                project.name()
            );
        }
        ArchiveOutcome::Archived => println!("📦 Project '{}' is archived", project.name()),
        ArchiveOutcome::Cancelled => {
            println!(
                "🚫 Archive round for '{}' cancelled; the project stays active",
                project.name()
            );
        }
    }
}

pub struct ArchiveStartCommand {
    actor: Option<String>,
    project: String,
}

impl ArchiveStartCommand {
    pub fn new(actor: Option<String>, project: String) -> Self {
        Self { actor, project }
    }
}

impl Command for ArchiveStartCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;

        let engine = open_engine().await?;
        let (project, outcome) = engine.initiate_archive(&caller, id).await?;
        print_archive_outcome(&project, outcome);
        Ok(())
    }
}

pub struct ArchiveApproveCommand {
    actor: Option<String>,
    project: String,
}

impl ArchiveApproveCommand {
    pub fn new(actor: Option<String>, project: String) -> Self {
        Self { actor, project }
    }
}

impl Command for ArchiveApproveCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;

        let engine = open_engine().await?;
        let (project, outcome) = engine.approve_archive(&caller, id).await?;
        print_archive_outcome(&project, outcome);
        Ok(())
    }
}

pub struct ArchiveRejectCommand {
    actor: Option<String>,
    project: String,
}

impl ArchiveRejectCommand {
    pub fn new(actor: Option<String>, project: String) -> Self {
        Self { actor, project }
    }
}

impl Command for ArchiveRejectCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;

        let engine = open_engine().await?;
        let (project, outcome) = engine.reject_archive(&caller, id).await?;
        print_archive_outcome(&project, outcome);
        Ok(())
    }
}
