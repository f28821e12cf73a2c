use std::str::FromStr;

use alloy::{
    network::Ethereum,
    primitives::{utils::format_ether, Address},
    providers::Provider,
    signers::local::PrivateKeySigner,
    sol_types::{SolCall, SolConstructor},
    transports::http::{Client, Http},
};
use anyhow::{ensure, Result};
use registry::{query, ContractRole, DeploymentRecorder, ErrorEntry, NetworkId, RegistryStore};
use tracing::{info, warn};

use crate::{
    cli::BaseConfig,
    contract::{platform::NFTAuctionPlatform, proxy::ERC1967Proxy},
    env::create_provider,
    transport::ContractTransport,
};

#[derive(Debug)]
pub struct DeployOutcome {
    pub network: NetworkId,
    pub proxy: Address,
    pub implementation: Address,
    pub test_nft: Address,
    pub factory: Address,
}

/// The production deployment workflow: stand up the auction platform
/// behind an ERC-1967 proxy and record every address in the registry as
/// soon as it is known, so a failure later in the run loses nothing.
pub async fn run_deploy(config: &BaseConfig) -> Result<DeployOutcome> {
    let owner = PrivateKeySigner::from_str(config.owner_key.as_str())?;
    let node_url = config.node_url()?;
    let provider = create_provider(node_url.clone(), owner.clone());

    let network = {
        let chain_id = match config.chain_id {
            Some(id) => id,
            None => provider.get_chain_id().await?,
        };
        NetworkId::from_chain_id(chain_id)
    };
    let balance = provider.get_balance(owner.address()).await?;
    info!("Deploying to {} (chain id {})", network, network.chain_id());
    info!(
        "Deployer {:#} holds {} ETH",
        owner.address(),
        format_ether(balance)
    );
    if network.is_mainnet() {
        warn!("Mainnet deployment: make sure this exact revision was exercised on a testnet");
    }

    let store = RegistryStore::new(&config.registry_path);
    let mut doc = store.load();
    {
        let record = doc.ensure_network(&network);
        if record.has_deployment() {
            warn!(
                "{} already has a recorded deployment (proxy {}), continuing anyway",
                network, record.proxy
            );
        }
    }

    let transport = ContractTransport::new(provider.clone(), &config.artifacts_dir);
    let mut recorder = DeploymentRecorder::new(&store, &mut doc);
    let outcome = {
        let result = deploy_stack(
            provider,
            &transport,
            &store,
            &mut recorder,
            &network,
            owner.address(),
        )
        .await;
        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                recorder.record_error(ErrorEntry::new(
                    &network,
                    owner.address(),
                    format!("{:#}", err),
                ));
                return Err(err);
            }
        }
    };

    info!("Deployment complete on {}", outcome.network);
    info!("  proxy:          {}", outcome.proxy);
    info!("  implementation: {}", outcome.implementation);
    info!("  test NFT:       {}", outcome.test_nft);
    info!("  factory:        {}", outcome.factory);
    info!("Registry updated at {}", store.path().display());
    Ok(outcome)
}

async fn deploy_stack<P>(
    provider: P,
    transport: &ContractTransport<P>,
    store: &RegistryStore,
    recorder: &mut DeploymentRecorder<'_>,
    network: &NetworkId,
    deployer: Address,
) -> Result<DeployOutcome>
where
    P: Provider<Http<Client>, Ethereum> + Clone,
{
    let test_nft = match query::deployed_address(store, network, ContractRole::TestNft) {
        Some(address) => {
            info!("Reusing recorded test NFT at {:#}", address);
            address
        }
        None => {
            info!("Deploying test NFT");
            let address = transport.deploy_contract("TestERC721", Vec::new()).await?;
            recorder.record_deployment(network, ContractRole::TestNft, address, deployer)?;
            address
        }
    };

    info!("Deploying auction platform implementation");
    let implementation = transport
        .deploy_contract("NFTAuctionPlatform", Vec::new())
        .await?;
    recorder.record_deployment(network, ContractRole::Implementation, implementation, deployer)?;

    info!("Deploying ERC-1967 proxy wired to initialize()");
    let proxy = {
        let init_data = NFTAuctionPlatform::initializeCall {}.abi_encode();
        let args = ERC1967Proxy::constructorCall {
            implementation,
            _data: init_data.into(),
        }
        .abi_encode();
        transport.deploy_contract("ERC1967Proxy", args).await?
    };
    recorder.record_deployment(network, ContractRole::Proxy, proxy, deployer)?;

    info!("Deploying auction factory");
    let factory = transport
        .deploy_contract("NFTAuctionFactory", Vec::new())
        .await?;
    recorder.record_deployment(network, ContractRole::Factory, factory, deployer)?;

    info!("Verifying the deployment");
    let active = transport.implementation_address(proxy).await?;
    ensure!(
        active == implementation,
        "proxy {} delegates to {} instead of the fresh implementation {}",
        proxy,
        active,
        implementation
    );
    let platform_owner = NFTAuctionPlatform::new(proxy, provider)
        .owner()
        .call()
        .await?
        ._0;
    ensure!(
        platform_owner == deployer,
        "proxy initialized with owner {} instead of the deployer {}",
        platform_owner,
        deployer
    );
    info!("Proxy delegates to the new implementation and is owned by the deployer");

    Ok(DeployOutcome {
        network: network.clone(),
        proxy,
        implementation,
        test_nft,
        factory,
    })
}
