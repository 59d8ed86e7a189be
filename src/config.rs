use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Boardroom
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardroomConfig {
    /// Document store selection and location
    pub store: StoreConfig,
    /// Retry behavior for lost revision races
    pub governance: GovernanceRetryConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Session token settings
    pub auth: AuthConfig,
    /// Database settings (used by the `sqlite` backend)
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Which backend to run against: "memory", "json" or "sqlite"
    pub backend: String,
    /// Root directory for the json backend
    pub path: String,
    /// Wrap the backend in the caching/throttling layer
    pub cached: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GovernanceRetryConfig {
    /// Attempts before a revision conflict is surfaced to the caller
    pub max_retry_attempts: u32,
    /// First backoff delay in milliseconds
    pub retry_base_delay_ms: u64,
    /// Backoff ceiling in milliseconds
    pub retry_max_delay_ms: u64,
    /// Randomize backoff delays
    pub retry_jitter: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level when RUST_LOG is unset
    pub log_level: String,
    /// Enable the governance operation counters
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Session token lifetime in hours
    pub session_ttl_hours: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file path or connection string
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
}

impl Default for BoardroomConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: "json".to_string(),
                path: ".boardroom".to_string(),
                cached: false,
            },
            governance: GovernanceRetryConfig {
                max_retry_attempts: 3,
                retry_base_delay_ms: 25,
                retry_max_delay_ms: 250,
                retry_jitter: true,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_enabled: true,
            },
            auth: AuthConfig {
                session_ttl_hours: 24,
            },
            database: Some(DatabaseConfig {
                url: "sqlite://.boardroom/boardroom.db".to_string(),
                max_connections: 10,
            }),
        }
    }
}

impl BoardroomConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (boardroom.toml, .boardroom-rc)
    /// 3. Environment variables (prefixed with BOARDROOM_)
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&BoardroomConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if Path::new("boardroom.toml").exists() {
            builder = builder.add_source(File::with_name("boardroom"));
        }

        if Path::new(".boardroom-rc").exists() {
            builder = builder.add_source(File::with_name(".boardroom-rc"));
        }

        builder = builder.add_source(
            Environment::with_prefix("BOARDROOM")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// Retry policy for the governance engine, as configured.
    pub fn retry_policy(&self) -> crate::governance::RetryPolicy {
        crate::governance::RetryPolicy {
            max_attempts: self.governance.max_retry_attempts,
            base_delay: std::time::Duration::from_millis(self.governance.retry_base_delay_ms),
            max_delay: std::time::Duration::from_millis(self.governance.retry_max_delay_ms),
            jitter: self.governance.retry_jitter,
        }
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<BoardroomConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = BoardroomConfig::load_env_file();
        BoardroomConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static BoardroomConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
