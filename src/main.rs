use anyhow::Result;
use clap::Parser;

use boardroom::cli::{run, Cli};
use boardroom::{config, governance_metrics, init_telemetry, shutdown_telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_telemetry()?;
    boardroom::init_config()?;

    let result = run(cli).await;

    if let Ok(config) = config() {
        if config.observability.metrics_enabled {
            governance_metrics().log_stats();
        }
    }
    shutdown_telemetry();

    result
}
