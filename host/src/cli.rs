use std::path::PathBuf;

use alloy::primitives::Address;
use clap::Parser;
use serde::Serialize;
use url::Url;

#[derive(Clone, Parser, Serialize)]
#[command(author, version, about, long_about = None)]
pub struct BaseConfig {
    /// Node host
    #[arg(long, env = "NODE_HOST", default_value = "localhost")]
    pub node_host: String,

    /// Node port
    #[arg(long, env = "NODE_PORT", default_value = "8545")]
    pub node_port: String,

    /// Deployer private key (with or without 0x prefix)
    #[arg(long, env = "OWNER_KEY")]
    #[serde(skip_serializing)]
    pub owner_key: String,

    /// Chain ID; when omitted the node is asked
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Maximum gas limit for transactions
    #[arg(long, env = "MAX_GAS", default_value_t = 1_000_000u64)]
    pub max_gas: u64,

    /// Path to the deployment registry file
    #[arg(long, env = "REGISTRY_PATH", default_value = "deployments.json")]
    pub registry_path: PathBuf,

    /// Path to compiled contract artifacts
    #[arg(long, env = "ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts_dir: PathBuf,
}

impl BaseConfig {
    pub fn node_url(&self) -> Result<Url, url::ParseError> {
        let node_url = format!("http://{}:{}", self.node_host, self.node_port);
        Url::parse(&node_url)
    }
}

#[derive(Clone, Parser, Serialize)]
#[command(author, version, about, long_about = None)]
pub struct UpgradeConfig {
    #[clap(flatten)]
    pub base: BaseConfig,

    /// Proxy to upgrade; falls back to the registry entry for the network
    #[arg(long, env = "PROXY_ADDRESS")]
    pub proxy_address: Option<Address>,
}

#[derive(Clone, Parser, Serialize)]
#[command(author, version, about, long_about = None)]
pub struct DemoConfig {
    #[clap(flatten)]
    pub base: BaseConfig,

    /// Initial ETH balance for demo accounts
    #[arg(long, env = "INITIAL_BALANCE", default_value = "5")]
    pub initial_balance: String,
}

#[derive(Clone, Parser, Serialize)]
#[command(author, version, about, long_about = None)]
pub struct CrossChainConfig {
    #[clap(flatten)]
    pub base: BaseConfig,

    /// Initial ETH balance for demo accounts
    #[arg(long, env = "INITIAL_BALANCE", default_value = "5")]
    pub initial_balance: String,

    /// ETH float the bridge holds for paying out transfers
    #[arg(long, env = "BRIDGE_BALANCE", default_value = "10")]
    pub bridge_balance: String,
}

impl UpgradeConfig {
    pub fn node_url(&self) -> Result<Url, url::ParseError> {
        self.base.node_url()
    }
}

impl DemoConfig {
    pub fn node_url(&self) -> Result<Url, url::ParseError> {
        self.base.node_url()
    }
}

impl CrossChainConfig {
    pub fn node_url(&self) -> Result<Url, url::ParseError> {
        self.base.node_url()
    }
}
