use anyhow::{bail, Context, Result};
use std::path::Path;

use super::Command;
use crate::config::BoardroomConfig;
use crate::store::JsonStore;

const CONFIG_FILE: &str = "boardroom.toml";

/// Writes a default configuration and lays out the json store directory.
pub struct InitCommand {
    force: bool,
}

impl InitCommand {
    pub fn new(force: bool) -> Self {
        Self { force }
    }
}

impl Command for InitCommand {
    async fn execute(&self) -> Result<()> {
        if Path::new(CONFIG_FILE).exists() && !self.force {
            bail!("{CONFIG_FILE} already exists; pass --force to overwrite it");
        }

        let config = BoardroomConfig::default();
        config
            .save_to_file(CONFIG_FILE)
            .with_context(|| format!("writing {CONFIG_FILE}"))?;
        JsonStore::open(&config.store.path).context("laying out the document store")?;

        println!("✅ Wrote {CONFIG_FILE}");
        println!("📁 Document store ready under {}/", config.store.path);
        println!();
        println!("Next: boardroom project create --name 'My project' --as you");
        Ok(())
    }
}
