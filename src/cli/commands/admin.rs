use anyhow::Result;

use super::{acting_principal, open_engine, parse_principal, parse_project_id, Command};
use crate::governance::RemovalOutcome;

fn print_removal_outcome(target: &str, outcome: RemovalOutcome) {
    match outcome {
        RemovalOutcome::Pending {
            approvals,
            required,
        } => {
            println!("🗳️  Removal of {target} pending: {approvals}/{required} approvals");
        }
        RemovalOutcome::Demoted => println!("✅ {target} is a member now"),
        RemovalOutcome::Cancelled => {
            println!("🚫 Removal round for {target} cancelled; they keep the admin role");
        }
    }
}

pub struct AdminPromoteCommand {
    actor: Option<String>,
    project: String,
    target: String,
}

impl AdminPromoteCommand {
    pub fn new(actor: Option<String>, project: String, target: String) -> Self {
        Self {
            actor,
            project,
            target,
        }
    }
}

impl Command for AdminPromoteCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;
        let target = parse_principal(&self.target)?;

        let engine = open_engine().await?;
        let project = engine.promote_to_admin(&caller, id, &target).await?;
        println!(
            "✅ {target} is an admin of '{}' now ({} admins total)",
            project.name(),
            project.admin_count()
        );
        Ok(())
    }
}

pub struct AdminRemoveCommand {
    actor: Option<String>,
    project: String,
    target: String,
}

impl AdminRemoveCommand {
    pub fn new(actor: Option<String>, project: String, target: String) -> Self {
        Self {
            actor,
            project,
            target,
        }
    }
}

impl Command for AdminRemoveCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;
        let target = parse_principal(&self.target)?;

        let engine = open_engine().await?;
        let (_, outcome) = engine.initiate_admin_removal(&caller, id, &target).await?;
        print_removal_outcome(target.as_str(), outcome);
        Ok(())
    }
}

pub struct AdminApproveCommand {
    actor: Option<String>,
    project: String,
    target: String,
}

impl AdminApproveCommand {
    pub fn new(actor: Option<String>, project: String, target: String) -> Self {
        Self {
            actor,
            project,
            target,
        }
    }
}

impl Command for AdminApproveCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;
        let target = parse_principal(&self.target)?;

        let engine = open_engine().await?;
        let (_, outcome) = engine.approve_admin_removal(&caller, id, &target).await?;
        print_removal_outcome(target.as_str(), outcome);
        Ok(())
    }
}

pub struct AdminRejectCommand {
    actor: Option<String>,
    project: String,
    target: String,
}

impl AdminRejectCommand {
    pub fn new(actor: Option<String>, project: String, target: String) -> Self {
        Self {
            actor,
            project,
            target,
        }
    }
}

impl Command for AdminRejectCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;
        let target = parse_principal(&self.target)?;

        let engine = open_engine().await?;
        let (_, outcome) = engine.reject_admin_removal(&caller, id, &target).await?;
        print_removal_outcome(target.as_str(), outcome);
        Ok(())
    }
}
