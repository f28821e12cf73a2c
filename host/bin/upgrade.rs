use anyhow::{Ok, Result};
use clap::Parser;
use host::{cli::UpgradeConfig, env::init_console_subscriber, upgrader::run_upgrade};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_console_subscriber();
    let config = UpgradeConfig::parse();
    info!("{}", serde_json::to_string_pretty(&config).unwrap());
    let outcome = run_upgrade(&config).await?;
    println!("{}", outcome.new_implementation);
    Ok(())
}
