use anyhow::Context;
use clap::Parser;
use neurograph_client::cli::{self, Cli};
use neurograph_client::ClientConfig;
use neurograph_monitoring::{init_logging, LogExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut config = ClientConfig::load().context("Failed to load configuration")?;
    if args.json_logs {
        config.json_logs = true;
    }
    init_logging(&config.monitoring("neurograph"))?;

    let graph = cli::run(&args, config).await.log_err("Graph generation failed")?;

    let json = serde_json::to_string_pretty(&graph).context("Failed to serialize graph")?;
    println!("{json}");
    Ok(())
}
