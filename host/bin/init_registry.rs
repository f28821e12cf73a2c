use std::str::FromStr;

use alloy::{
    primitives::utils::format_ether, providers::Provider, signers::local::PrivateKeySigner,
};
use anyhow::{Ok, Result};
use clap::Parser;
use host::{
    cli::BaseConfig,
    env::{create_provider, init_console_subscriber},
};
use registry::{DeploymentRegistry, NetworkId, RegistryStore};
use tracing::info;

/// Creates the registry file if it is missing and reconciles it against
/// the known-network skeleton if it exists. Existing data is preserved,
/// only empty fields are filled in.
async fn init_registry(config: BaseConfig) -> Result<RegistryStore> {
    info!("{}", serde_json::to_string_pretty(&config).unwrap());

    let store = RegistryStore::new(&config.registry_path);
    let mut doc = store.load();
    doc.merge_defaults();
    doc.touch();
    store.save(&doc)?;

    info!("Registry written to {}", store.path().display());
    for (name, record) in &doc.networks {
        info!("  {} (chain id {})", name, record.chain_id);
    }

    if let Err(err) = stamp_local_deployer(&config, &store, &mut doc).await {
        info!("Skipping the deployer stamp, no node information: {}", err);
    }
    Ok(store)
}

/// Best effort: only a local dev chain gets its deployer recorded up
/// front, and only while the field is still empty.
async fn stamp_local_deployer(
    config: &BaseConfig,
    store: &RegistryStore,
    doc: &mut DeploymentRegistry,
) -> Result<()> {
    let owner = PrivateKeySigner::from_str(config.owner_key.as_str())?;
    let provider = create_provider(config.node_url()?, owner.clone());
    let chain_id = provider.get_chain_id().await?;
    let network = NetworkId::from_chain_id(chain_id);
    let balance = provider.get_balance(owner.address()).await?;
    info!("Connected to {} (chain id {})", network, chain_id);
    info!(
        "Account {:#} holds {} ETH",
        owner.address(),
        format_ether(balance)
    );

    if chain_id != 31337 {
        info!("Not a local dev chain, leaving the deployer field alone");
        return Ok(());
    }
    let record = doc.ensure_network(&network);
    if record.deployer.is_empty() {
        record.deployer = owner.address().to_string();
        doc.touch();
        store.save(doc)?;
        info!("Recorded {:#} as the localhost deployer", owner.address());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_console_subscriber();
    let config = BaseConfig::parse();
    let store = init_registry(config).await?;
    println!("{}", store.path().display());
    Ok(())
}
