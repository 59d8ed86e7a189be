use anyhow::Result;

use super::{acting_principal, open_engine, parse_principal, parse_project_id, Command};

pub struct MemberAddCommand {
    actor: Option<String>,
    project: String,
    principal: String,
}

impl MemberAddCommand {
    pub fn new(actor: Option<String>, project: String, principal: String) -> Self {
        Self {
            actor,
            project,
            principal,
        }
    }
}

impl Command for MemberAddCommand {
    async fn execute(&self) -> Result<()> {
        let caller = acting_principal(&self.actor)?;
        let id = parse_project_id(&self.project)?;
        let target = parse_principal(&self.principal)?;

        let engine = open_engine().await?;
        let project = engine.add_member(&caller, id, &target).await?;
        println!(
            "✅ {target} joined '{}' as a member ({} on the roster)",
            project.name(),
            project.roster().len()
        );
        Ok(())
    }
}
