use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod admin;
pub mod archive;
pub mod init;
pub mod member;
pub mod project;
pub mod task;

use crate::config::config;
use crate::governance::GovernanceEngine;
use crate::models::{PrincipalId, ProjectId, TaskId};
use crate::store::{CachedStore, DocumentStore, JsonStore, MemoryStore};

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

fn wrap<S: DocumentStore + 'static>(inner: S, cached: bool) -> Arc<dyn DocumentStore> {
    if cached {
        Arc::new(CachedStore::new(inner))
    } else {
        Arc::new(inner)
    }
}

/// Builds the governance engine against whichever backend the configuration
/// selects.
pub async fn open_engine() -> Result<GovernanceEngine<Arc<dyn DocumentStore>>> {
    let config = config()?;
    let store: Arc<dyn DocumentStore> = match config.store.backend.as_str() {
        "memory" => wrap(MemoryStore::new(), config.store.cached),
        "json" => wrap(
            JsonStore::open(&config.store.path).context("opening the json document store")?,
            config.store.cached,
        ),
        #[cfg(feature = "database")]
        "sqlite" => {
            let database = config
                .database
                .as_ref()
                .ok_or_else(|| anyhow!("store.backend is 'sqlite' but [database] is not set"))?;
            wrap(
                crate::store::SqliteStore::connect(&database.url)
                    .await
                    .context("connecting to the sqlite document store")?,
                config.store.cached,
            )
        }
        #[cfg(not(feature = "database"))]
        "sqlite" => {
            bail!("store.backend is 'sqlite' but this binary was built without the 'database' feature")
        }
        other => bail!("unknown store backend '{other}' (expected memory, json or sqlite)"),
    };
    Ok(GovernanceEngine::with_retry(store, config.retry_policy()))
}

/// Resolves the `--as` flag into a principal. Every mutating command needs
/// one.
pub(crate) fn acting_principal(raw: &Option<String>) -> Result<PrincipalId> {
    let raw = raw
        .as_deref()
        .ok_or_else(|| anyhow!("this command needs an acting principal; pass --as <principal>"))?;
    Ok(raw.parse()?)
}

pub(crate) fn parse_principal(raw: &str) -> Result<PrincipalId> {
    Ok(raw.parse()?)
}

pub(crate) fn parse_principals(raw: &[String]) -> Result<Vec<PrincipalId>> {
    raw.iter().map(|p| parse_principal(p)).collect()
}

pub(crate) fn parse_project_id(raw: &str) -> Result<ProjectId> {
    Ok(raw.parse()?)
}

pub(crate) fn parse_task_id(raw: &str) -> Result<TaskId> {
    Ok(raw.parse()?)
}

pub(crate) fn parse_deadline(raw: &Option<String>) -> Result<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("'{raw}' is not an RFC 3339 timestamp"))?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
    }
}
