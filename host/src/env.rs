use alloy::{
    network::{Ethereum, EthereumWallet},
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use time::macros::format_description;
use tracing_subscriber::{fmt::time::UtcTime, EnvFilter};
use url::Url;

/// Initialize the console subscriber for logging
pub fn init_console_subscriber() {
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour repr:24]:[minute]:[second].[subsecond digits:3]Z"
    ));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stdout)
        .init();
}

pub fn create_provider(
    node_url: Url,
    signer: PrivateKeySigner,
) -> impl Provider<Http<Client>, Ethereum> + Clone {
    let wallet = EthereumWallet::from(signer);
    ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet)
        .on_http(node_url)
}
