use anyhow::{Ok, Result};
use clap::Parser;
use host::{cli::BaseConfig, deployer::run_deploy, env::init_console_subscriber};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_console_subscriber();
    let config = BaseConfig::parse();
    info!("{}", serde_json::to_string_pretty(&config).unwrap());
    let outcome = run_deploy(&config).await?;
    println!("{}", outcome.proxy);
    Ok(())
}
