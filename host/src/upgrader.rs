use std::str::FromStr;

use alloy::{
    network::Ethereum,
    primitives::{utils::format_ether, Address, Bytes, TxHash},
    providers::Provider,
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use anyhow::{anyhow, ensure, Result};
use registry::{query, ContractRole, DeploymentRecorder, ErrorEntry, NetworkId, RegistryStore};
use tracing::info;

use crate::{
    cli::UpgradeConfig,
    contract::platform::{NFTAuctionPlatform, NFTAuctionPlatformV2},
    env::create_provider,
    transport::ContractTransport,
};

#[derive(Debug)]
pub struct UpgradeOutcome {
    pub network: NetworkId,
    pub proxy: Address,
    pub previous_implementation: Address,
    pub new_implementation: Address,
    pub transaction: TxHash,
}

/// Moves the recorded proxy onto a fresh V2 implementation. Permission
/// and input problems abort before anything is written to the registry;
/// failures past that point are appended to its error log.
pub async fn run_upgrade(config: &UpgradeConfig) -> Result<UpgradeOutcome> {
    let upgrader = PrivateKeySigner::from_str(config.base.owner_key.as_str())?;
    let node_url = config.node_url()?;
    let provider = create_provider(node_url.clone(), upgrader.clone());

    let network = {
        let chain_id = match config.base.chain_id {
            Some(id) => id,
            None => provider.get_chain_id().await?,
        };
        NetworkId::from_chain_id(chain_id)
    };
    let balance = provider.get_balance(upgrader.address()).await?;
    info!("Upgrading on {} (chain id {})", network, network.chain_id());
    info!(
        "Upgrader {:#} holds {} ETH",
        upgrader.address(),
        format_ether(balance)
    );

    let store = RegistryStore::new(&config.base.registry_path);
    let proxy = config
        .proxy_address
        .or_else(|| query::deployed_address(&store, &network, ContractRole::Proxy))
        .ok_or_else(|| {
            anyhow!(
                "no proxy to upgrade on {}: pass --proxy-address (or PROXY_ADDRESS), \
                 or record a deployment in {} first",
                network,
                store.path().display()
            )
        })?;
    info!("Target proxy: {}", proxy);

    let transport = ContractTransport::new(provider.clone(), &config.base.artifacts_dir);
    let previous = transport.implementation_address(proxy).await?;
    info!("Proxy currently delegates to {:#}", previous);

    let owner = NFTAuctionPlatform::new(proxy, provider.clone())
        .owner()
        .call()
        .await?
        ._0;
    ensure!(
        owner == upgrader.address(),
        "only the platform owner may upgrade: owner is {}, this key controls {}",
        owner,
        upgrader.address()
    );

    let mut doc = store.load();
    let mut recorder = DeploymentRecorder::new(&store, &mut doc);
    let result = upgrade_stack(
        provider,
        &transport,
        &mut recorder,
        &network,
        proxy,
        previous,
        owner,
    )
    .await;
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            recorder.record_error(ErrorEntry::new(
                &network,
                upgrader.address(),
                format!("{:#}", err),
            ));
            return Err(err);
        }
    };

    info!("Upgrade complete on {}", outcome.network);
    info!("  proxy:       {}", outcome.proxy);
    info!("  previous:    {}", outcome.previous_implementation);
    info!("  active:      {}", outcome.new_implementation);
    info!("  transaction: {}", outcome.transaction);
    Ok(outcome)
}

async fn upgrade_stack<P>(
    provider: P,
    transport: &ContractTransport<P>,
    recorder: &mut DeploymentRecorder<'_>,
    network: &NetworkId,
    proxy: Address,
    previous: Address,
    owner_before: Address,
) -> Result<UpgradeOutcome>
where
    P: Provider<Http<Client>, Ethereum> + Clone,
{
    info!("Deploying the V2 implementation");
    let v2 = transport
        .deploy_contract("NFTAuctionPlatformV2", Vec::new())
        .await?;

    info!("Upgrading proxy {:#} to {:#}", proxy, v2);
    let platform = NFTAuctionPlatform::new(proxy, provider.clone());
    let receipt = platform
        .upgradeToAndCall(v2, Bytes::new())
        .send()
        .await?
        .get_receipt()
        .await?;
    let transaction = receipt.transaction_hash;
    ensure!(receipt.status(), "upgrade transaction {} reverted", transaction);

    let active = transport.implementation_address(proxy).await?;
    ensure!(
        active == v2,
        "implementation slot still holds {} after the upgrade",
        active
    );
    let owner_after = platform.owner().call().await?._0;
    ensure!(
        owner_after == owner_before,
        "owner changed across the upgrade, from {} to {}",
        owner_before,
        owner_after
    );

    initialize_v2(&provider, proxy).await;

    recorder.record_upgrade(network, v2, transaction)?;

    Ok(UpgradeOutcome {
        network: network.clone(),
        proxy,
        previous_implementation: previous,
        new_implementation: v2,
        transaction,
    })
}

/// Best effort: V2 state may already be initialized, and some V2 builds
/// have nothing to initialize at all. Neither case fails the upgrade.
async fn initialize_v2<P>(provider: &P, proxy: Address)
where
    P: Provider<Http<Client>, Ethereum> + Clone,
{
    let platform = NFTAuctionPlatformV2::new(proxy, provider.clone());
    match platform.initializeV2().send().await {
        Ok(pending) => match pending.watch().await {
            Ok(tx) => info!("V2 state initialized in {:#}", tx),
            Err(err) => info!("initializeV2 did not confirm: {}", err),
        },
        Err(err) => {
            let message = err.to_string();
            if message.contains("already initialized") {
                info!("V2 state was already initialized");
            } else {
                info!("Skipping initializeV2: {}", message);
            }
        }
    }
    if let Ok(version) = platform.version().call().await {
        info!("Platform now reports version {}", version._0);
    }
}
