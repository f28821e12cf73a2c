#![cfg(feature = "node_test")]

use std::path::Path;
use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use anyhow::{Ok, Result};
use clap::Parser;
use host::{
    cli::{BaseConfig, UpgradeConfig},
    deployer::run_deploy,
    env::create_provider,
    transport::ContractTransport,
    upgrader::run_upgrade,
};
use registry::RegistryStore;

// Dev node keys, printed when the node starts up. Each comes funded with
// 10000 ETH.
static ANVIL_PRIVATE_KEYS: [&str; 2] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
];

// Host, port and artifacts dir still come from the environment, like the
// binaries; only the registry is redirected into a temp dir.
fn test_config(registry_path: &Path) -> BaseConfig {
    let mut config = BaseConfig::parse_from(["host-tests", "--owner-key", ANVIL_PRIVATE_KEYS[0]]);
    config.registry_path = registry_path.to_path_buf();
    config
}

#[tokio::test]
async fn deploy_and_upgrade_lifecycle() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = test_config(&dir.path().join("deployments.json"));
    let owner = PrivateKeySigner::from_str(ANVIL_PRIVATE_KEYS[0])?;

    eprintln!("Deploying the auction stack");
    let first = run_deploy(&config).await?;
    assert_eq!(first.network.name(), "localhost");

    let store = RegistryStore::new(&config.registry_path);
    {
        let doc = store.load();
        let record = &doc.networks["localhost"];
        assert_eq!(record.chain_id, 31337);
        assert_eq!(record.proxy, first.proxy.to_string());
        assert_eq!(record.implementation, first.implementation.to_string());
        assert_eq!(record.test_nft, first.test_nft.to_string());
        assert_eq!(record.factory, first.factory.to_string());
        assert_eq!(record.deployer, owner.address().to_string());
        assert!(!record.deployed_at.is_empty());
        let last = doc
            .metadata
            .last_deployment
            .as_ref()
            .expect("a deploy stamps lastDeployment");
        assert_eq!(last.network, "localhost");
        assert_eq!(last.deployer, owner.address().to_string());
    }

    eprintln!("Deploying again to check the recorded test NFT is reused");
    let second = run_deploy(&config).await?;
    assert_eq!(
        second.test_nft, first.test_nft,
        "recorded test NFT was not reused"
    );
    assert_ne!(second.proxy, first.proxy);
    assert_ne!(second.implementation, first.implementation);
    assert_eq!(
        store.load().networks["localhost"].proxy,
        second.proxy.to_string()
    );

    eprintln!("Attempting the upgrade with a key that is not the owner");
    let intruder = {
        let mut base = config.clone();
        base.owner_key = ANVIL_PRIVATE_KEYS[1].to_string();
        UpgradeConfig {
            base,
            proxy_address: None,
        }
    };
    let err = run_upgrade(&intruder).await.unwrap_err();
    assert!(
        err.to_string().contains("only the platform owner may upgrade"),
        "unexpected refusal: {err:#}"
    );
    {
        let doc = store.load();
        assert!(
            doc.networks["localhost"].implementation_v2.is_empty(),
            "a refused upgrade touched the registry"
        );
        assert!(doc.errors.is_empty());
    }

    eprintln!("Upgrading as the owner");
    let upgrade = run_upgrade(&UpgradeConfig {
        base: config.clone(),
        proxy_address: None,
    })
    .await?;
    assert_eq!(upgrade.proxy, second.proxy);
    assert_eq!(upgrade.previous_implementation, second.implementation);
    assert_ne!(upgrade.new_implementation, second.implementation);

    {
        let doc = store.load();
        let record = &doc.networks["localhost"];
        assert_eq!(
            record.implementation_v2,
            upgrade.new_implementation.to_string()
        );
        assert_eq!(record.upgrade_transaction, upgrade.transaction.to_string());
        assert!(!record.upgraded_at.is_empty());
        // the upgrade leaves the deployment fields alone
        assert_eq!(record.proxy, second.proxy.to_string());
        assert_eq!(record.implementation, second.implementation.to_string());
    }

    let provider = create_provider(config.node_url()?, owner);
    let transport = ContractTransport::new(provider, &config.artifacts_dir);
    let active = transport.implementation_address(upgrade.proxy).await?;
    assert_eq!(
        active, upgrade.new_implementation,
        "implementation slot and registry disagree"
    );

    Ok(())
}

#[tokio::test]
async fn upgrade_without_a_recorded_proxy_asks_for_one() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = UpgradeConfig {
        base: test_config(&dir.path().join("deployments.json")),
        proxy_address: None,
    };
    let err = run_upgrade(&config).await.unwrap_err();
    assert!(
        err.to_string().contains("no proxy to upgrade"),
        "unexpected error: {err:#}"
    );
    assert!(
        !config.base.registry_path.exists(),
        "a failed lookup should not create the registry"
    );
    Ok(())
}
