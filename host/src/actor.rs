use alloy::{
    network::TransactionBuilder,
    primitives::Address,
    primitives::U256,
    providers::Provider,
    rpc::types::TransactionRequest,
    signers::{local::PrivateKeySigner, Signer},
};
use anyhow::{Ok, Result};
use tracing::info;
use url::Url;

#[derive(Clone)]
pub struct Config {
    pub node_url: Url,
    pub initial_balance: U256,
    pub max_gas: u64,
    pub chain_id: u64,
}

/// A throwaway account playing a named role in a demo run, funded out of
/// the owner account.
#[derive(Clone)]
pub struct Actor {
    pub name: &'static str,
    pub wallet: PrivateKeySigner,
}

impl Actor {
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

/// Creates one fresh random account per name and concurrently faucets
/// each with the configured balance. Nonces are assigned up front so the
/// faucet transactions never race each other.
pub async fn create_actors(
    config: &Config,
    owner: PrivateKeySigner,
    names: &[&'static str],
) -> Result<Vec<Actor>> {
    let provider = crate::env::create_provider(config.node_url.clone(), owner.clone());
    let start_nonce = provider.get_transaction_count(owner.address()).await?;

    let futures: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let provider = provider.clone();
            let wallet = PrivateKeySigner::random().with_chain_id(Some(config.chain_id));
            let config = config.clone();
            async move {
                info!("Fauceting account for {} at {:#}", name, wallet.address());
                let faucet_tx = TransactionRequest::default()
                    .to(wallet.address())
                    .value(config.initial_balance)
                    .nonce(start_nonce + i as u64)
                    .with_gas_limit(config.max_gas)
                    .with_chain_id(config.chain_id);
                provider.send_transaction(faucet_tx).await?.watch().await?;
                Ok(Actor { name, wallet })
            }
        })
        .collect();

    futures::future::try_join_all(futures).await
}
