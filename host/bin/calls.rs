use std::str::FromStr;

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::{SolCall, SolConstructor},
};
use anyhow::{ensure, Ok, Result};
use clap::Parser;
use host::{
    cli::BaseConfig,
    contract::calls::{CallTestCaller, CallTestTarget, SimpleProxyDemo},
    env::{create_provider, init_console_subscriber},
    transport::ContractTransport,
};
use tracing::info;

/// Walks through call, delegatecall and a fallback proxy against the two
/// test contracts, checking after each step whose storage was written
/// and what msg.sender looked like from inside.
async fn run_demo(config: BaseConfig) -> Result<Address> {
    info!("{}", serde_json::to_string_pretty(&config).unwrap());

    let owner = PrivateKeySigner::from_str(config.owner_key.as_str())?;
    let node_url = config.node_url()?;
    let provider = create_provider(node_url, owner.clone());
    let transport = ContractTransport::new(provider.clone(), &config.artifacts_dir);

    info!("Deploying the test contracts");
    let target_address = transport
        .deploy_contract("CallTestTarget", Vec::new())
        .await?;
    let caller_address = transport
        .deploy_contract("CallTestCaller", Vec::new())
        .await?;
    let target = CallTestTarget::new(target_address, provider.clone());
    let caller = CallTestCaller::new(caller_address, provider.clone());

    info!(
        "Initial state: target value {}, caller value {}",
        target.value().call().await?._0,
        caller.value().call().await?._0
    );

    info!("caller.testCall(target, 100)");
    caller
        .testCall(target_address, U256::from(100))
        .send()
        .await?
        .watch()
        .await?;
    let target_value = target.value().call().await?._0;
    let target_sender = target.sender().call().await?._0;
    let target_self = target.contractAddress().call().await?._0;
    let caller_value = caller.value().call().await?._0;
    info!(
        "  target: value {}, sender {:#}, self {:#}",
        target_value, target_sender, target_self
    );
    info!("  caller: value {}", caller_value);
    ensure!(
        target_value == U256::from(100),
        "call did not write the target's storage"
    );
    ensure!(
        target_sender == caller_address,
        "inside a call, msg.sender is the calling contract"
    );
    ensure!(target_self == target_address, "call ran in the wrong context");
    ensure!(
        caller_value == U256::ZERO,
        "call must not touch the caller's storage"
    );
    info!("call wrote the target's storage, with the caller contract as msg.sender");

    target.reset().send().await?.watch().await?;

    info!("caller.testDelegateCall(target, 200)");
    caller
        .testDelegateCall(target_address, U256::from(200))
        .send()
        .await?
        .watch()
        .await?;
    let caller_value = caller.value().call().await?._0;
    let caller_sender = caller.sender().call().await?._0;
    let caller_self = caller.contractAddress().call().await?._0;
    let target_value = target.value().call().await?._0;
    info!(
        "  caller: value {}, sender {:#}, self {:#}",
        caller_value, caller_sender, caller_self
    );
    info!("  target: value {}", target_value);
    ensure!(
        caller_value == U256::from(200),
        "delegatecall did not write the caller's storage"
    );
    ensure!(
        caller_sender == owner.address(),
        "delegatecall must preserve the original msg.sender"
    );
    ensure!(
        caller_self == caller_address,
        "delegatecall ran in the wrong context"
    );
    ensure!(
        target_value == U256::ZERO,
        "delegatecall must not touch the target's storage"
    );
    info!("delegatecall ran the target's code against the caller's storage");

    info!("Deploying a fallback proxy over the target");
    let proxy_address = {
        let args = SimpleProxyDemo::constructorCall {
            target: target_address,
        }
        .abi_encode();
        transport.deploy_contract("SimpleProxyDemo", args).await?
    };
    // selector-carrying calldata goes through the fallback untouched
    let raw = TransactionRequest::default()
        .to(proxy_address)
        .with_input(Bytes::from(
            CallTestTarget::updateStateCall {
                newValue: U256::from(300),
            }
            .abi_encode(),
        ))
        .with_gas_limit(config.max_gas);
    provider.send_transaction(raw).await?.watch().await?;

    let proxied = CallTestTarget::new(proxy_address, provider.clone());
    let proxy_value = proxied.value().call().await?._0;
    let proxy_sender = proxied.sender().call().await?._0;
    let proxy_self = proxied.contractAddress().call().await?._0;
    let target_value = target.value().call().await?._0;
    info!(
        "  proxy:  value {}, sender {:#}, self {:#}",
        proxy_value, proxy_sender, proxy_self
    );
    info!("  target: value {}", target_value);
    ensure!(
        proxy_value == U256::from(300),
        "the proxy's storage should hold the new value"
    );
    ensure!(
        proxy_sender == owner.address(),
        "the proxy must preserve the original msg.sender"
    );
    ensure!(proxy_self == proxy_address, "proxied call ran in the wrong context");
    ensure!(
        target_value == U256::ZERO,
        "the implementation's own storage must stay untouched"
    );
    info!("The proxy keeps the state while the target only supplies the code");

    Ok(proxy_address)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_console_subscriber();
    let config = BaseConfig::parse();
    let proxy = run_demo(config).await?;
    println!("{}", proxy);
    Ok(())
}
