use std::str::FromStr;

use alloy::{
    network::{Ethereum, TransactionBuilder},
    primitives::{
        utils::{format_ether, parse_ether},
        Address, I256, U256,
    },
    providers::Provider,
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::SolConstructor,
    transports::http::{Client, Http},
};
use anyhow::{anyhow, ensure, Ok, Result};
use clap::Parser;
use host::{
    actor::{self, Actor},
    cli::CrossChainConfig,
    contract::{
        bridge::SimpleCrossChainBridge,
        decode_event,
        factory::NFTAuctionFactory,
        nft::AuctionNFT,
        platform::NFTAuctionPlatform,
        token::{MockPriceFeed, MyToken},
    },
    env::{create_provider, init_console_subscriber},
    transport::ContractTransport,
};
use tracing::info;

const ETH_CHAIN_ID: u64 = 1;
const POLYGON_CHAIN_ID: u64 = 137;

struct CrossChainStack {
    nft: Address,
    usdt: Address,
    bridge: Address,
    factory: Address,
    platform: Address,
}

async fn deploy_feed<P>(
    transport: &ContractTransport<P>,
    pair: &str,
    answer: i64,
) -> Result<Address>
where
    P: Provider<Http<Client>, Ethereum> + Clone,
{
    let args = MockPriceFeed::constructorCall {
        decimals: 8,
        description: pair.to_string(),
        version: U256::from(1),
        initialAnswer: I256::try_from(answer)?,
    }
    .abi_encode();
    let feed = transport.deploy_contract("MockPriceFeed", args).await?;
    info!("Price feed {} at {:#}", pair, feed);
    Ok(feed)
}

/// The auction stack plus a bridge, with the platform pointed at the
/// bridge and the bridge configured for two remote chains.
async fn deploy_stack<P>(transport: &ContractTransport<P>, provider: P) -> Result<CrossChainStack>
where
    P: Provider<Http<Client>, Ethereum> + Clone,
{
    info!("Deploying the NFT collection");
    let nft = {
        let args = AuctionNFT::constructorCall {
            name: "Auction NFT".to_string(),
            symbol: "ANFT".to_string(),
            baseURI: "https://ipfs.io/ipfs/".to_string(),
        }
        .abi_encode();
        transport.deploy_contract("AuctionNFT", args).await?
    };

    info!("Deploying price feeds");
    let eth_feed = deploy_feed(transport, "ETH/USD", 200_000_000_000).await?;
    let usdt_feed = deploy_feed(transport, "USDT/USD", 100_000_000).await?;

    info!("Deploying the settlement token");
    let usdt = {
        let args = MyToken::constructorCall {
            initialSupply: parse_ether("1000000")?,
        }
        .abi_encode();
        transport.deploy_contract("MyToken", args).await?
    };

    info!("Deploying the cross-chain bridge");
    let bridge = transport
        .deploy_contract("SimpleCrossChainBridge", Vec::new())
        .await?;

    info!("Deploying the auction factory");
    let factory = transport
        .deploy_contract("NFTAuctionFactory", Vec::new())
        .await?;
    let factory_contract = NFTAuctionFactory::new(factory, provider.clone());
    factory_contract
        .addDefaultPriceFeed(Address::ZERO, eth_feed)
        .send()
        .await?
        .watch()
        .await?;
    factory_contract
        .addDefaultPriceFeed(usdt, usdt_feed)
        .send()
        .await?
        .watch()
        .await?;

    let platform = {
        let receipt = factory_contract
            .createAuctionPlatform()
            .send()
            .await?
            .get_receipt()
            .await?;
        decode_event::<NFTAuctionFactory::AuctionPlatformCreated>(&receipt)?.auctionPlatform
    };
    info!("Created auction platform at {:#}", platform);

    NFTAuctionPlatform::new(platform, provider.clone())
        .setCrossChainBridge(bridge)
        .send()
        .await?
        .watch()
        .await?;
    info!("Platform wired to the bridge");

    info!("Configuring the bridge");
    let bridge_contract = SimpleCrossChainBridge::new(bridge, provider);
    for chain in [ETH_CHAIN_ID, POLYGON_CHAIN_ID] {
        bridge_contract
            .setSupportedChain(chain, true)
            .send()
            .await?
            .watch()
            .await?;
        // a single local deployment stands in for the remote side too
        bridge_contract
            .setRemoteBridge(chain, bridge)
            .send()
            .await?
            .watch()
            .await?;
    }
    bridge_contract
        .setTransferFee(parse_ether("0.001")?)
        .send()
        .await?
        .watch()
        .await?;
    info!(
        "Bridge supports chains {} and {}, transfer fee 0.001 ETH",
        ETH_CHAIN_ID, POLYGON_CHAIN_ID
    );

    Ok(CrossChainStack {
        nft,
        usdt,
        bridge,
        factory,
        platform,
    })
}

async fn run_demo(config: CrossChainConfig) -> Result<CrossChainStack> {
    info!("{}", serde_json::to_string_pretty(&config).unwrap());

    let owner = PrivateKeySigner::from_str(config.base.owner_key.as_str())?;
    let node_url = config.node_url()?;
    let provider = create_provider(node_url.clone(), owner.clone());
    let chain_id = match config.base.chain_id {
        Some(id) => id,
        None => provider.get_chain_id().await?,
    };

    info!("Setting up demo accounts");
    let [seller, bidder1, bidder2]: [Actor; 3] = {
        let actor_config = actor::Config {
            node_url: node_url.clone(),
            initial_balance: parse_ether(&config.initial_balance)?,
            max_gas: config.base.max_gas,
            chain_id,
        };
        actor::create_actors(&actor_config, owner.clone(), &["seller", "bidder1", "bidder2"])
            .await?
            .try_into()
            .map_err(|_| anyhow!("expected exactly three demo accounts"))?
    };

    let transport = ContractTransport::new(provider.clone(), &config.base.artifacts_dir);
    let stack = deploy_stack(&transport, provider.clone()).await?;

    info!("Preparing funds");
    let nft = AuctionNFT::new(stack.nft, provider.clone());
    let token_id = {
        let receipt = nft
            .mint(seller.address(), "QmTest1".to_string())
            .send()
            .await?
            .get_receipt()
            .await?;
        decode_event::<AuctionNFT::NFTMinted>(&receipt)?.tokenId
    };
    let seller_provider = create_provider(node_url.clone(), seller.wallet.clone());
    AuctionNFT::new(stack.nft, seller_provider.clone())
        .setApprovalForAll(stack.platform, true)
        .send()
        .await?
        .watch()
        .await?;
    info!("Minted token {} to {} and approved the platform", token_id, seller.name);

    let usdt = MyToken::new(stack.usdt, provider.clone());
    let bankroll = parse_ether("10000")?;
    usdt.transfer(bidder1.address(), bankroll)
        .send()
        .await?
        .watch()
        .await?;
    usdt.transfer(bidder2.address(), bankroll)
        .send()
        .await?
        .watch()
        .await?;
    for bidder in [&bidder1, &bidder2] {
        let bidder_provider = create_provider(node_url.clone(), bidder.wallet.clone());
        MyToken::new(stack.usdt, bidder_provider)
            .approve(stack.bridge, bankroll)
            .send()
            .await?
            .watch()
            .await?;
    }
    info!("Each bidder holds 10000 USDT and has approved the bridge");

    let float = parse_ether(&config.bridge_balance)?;
    let fund_tx = TransactionRequest::default()
        .to(stack.bridge)
        .value(float)
        .with_gas_limit(config.base.max_gas);
    provider.send_transaction(fund_tx).await?.watch().await?;
    info!("Bridge funded with {} ETH for payouts", format_ether(float));

    info!("Creating an auction");
    let auction_id = {
        let receipt = NFTAuctionPlatform::new(stack.platform, seller_provider)
            .createAuction(
                U256::from(60 * 60 * 24),
                parse_ether("100")?,
                parse_ether("200")?,
                stack.nft,
                token_id,
            )
            .send()
            .await?
            .get_receipt()
            .await?;
        decode_event::<NFTAuctionPlatform::AuctionCreated>(&receipt)?.auctionId
    };
    info!(
        "Auction #{} open: token {}, start $100, reserve $200",
        auction_id, token_id
    );

    info!("ETH cross-chain transfer");
    let eth_message = "Cross-chain ETH transfer for auction";
    let bridge_as_bidder1 = SimpleCrossChainBridge::new(
        stack.bridge,
        create_provider(node_url.clone(), bidder1.wallet.clone()),
    );
    let eth_transfer_id = {
        // 0.5 ETH for the recipient plus the 0.001 fee
        let receipt = bridge_as_bidder1
            .transferETHCrossChain(POLYGON_CHAIN_ID, bidder2.address(), eth_message.to_string())
            .value(parse_ether("0.501")?)
            .send()
            .await?
            .get_receipt()
            .await?;
        info!("Initiated in {}", receipt.transaction_hash);
        decode_event::<SimpleCrossChainBridge::CrossChainTransferInitiated>(&receipt)?.transferId
    };
    info!(
        "{} sent 0.5 ETH to {} on chain {}, transfer {:#}",
        bidder1.name,
        bidder2.name,
        POLYGON_CHAIN_ID,
        eth_transfer_id
    );

    let bridge_contract = SimpleCrossChainBridge::new(stack.bridge, provider.clone());
    bridge_contract
        .simulateReceiveTransfer(
            bidder1.address(),
            bidder2.address(),
            Address::ZERO,
            parse_ether("0.5")?,
            eth_message.to_string(),
        )
        .send()
        .await?
        .watch()
        .await?;
    info!("Simulated delivery of the ETH transfer");

    info!("USDT cross-chain transfer");
    let token_message = "Cross-chain USDT transfer for auction";
    let bridge_as_bidder2 = SimpleCrossChainBridge::new(
        stack.bridge,
        create_provider(node_url.clone(), bidder2.wallet.clone()),
    );
    let token_transfer_id = {
        let receipt = bridge_as_bidder2
            .transferTokenCrossChain(
                ETH_CHAIN_ID,
                bidder1.address(),
                stack.usdt,
                parse_ether("1000")?,
                token_message.to_string(),
            )
            .value(parse_ether("0.001")?)
            .send()
            .await?
            .get_receipt()
            .await?;
        info!("Initiated in {}", receipt.transaction_hash);
        decode_event::<SimpleCrossChainBridge::CrossChainTransferInitiated>(&receipt)?.transferId
    };
    info!(
        "{} sent 1000 USDT to {} on chain {}, transfer {:#}",
        bidder2.name,
        bidder1.name,
        ETH_CHAIN_ID,
        token_transfer_id
    );

    bridge_contract
        .simulateReceiveTransfer(
            bidder2.address(),
            bidder1.address(),
            stack.usdt,
            parse_ether("1000")?,
            token_message.to_string(),
        )
        .send()
        .await?
        .watch()
        .await?;
    info!("Simulated delivery of the USDT transfer");

    for (label, transfer_id) in [("ETH", eth_transfer_id), ("USDT", token_transfer_id)] {
        let transfer = bridge_contract.getTransfer(transfer_id).call().await?;
        ensure!(
            transfer.completed,
            "{} transfer {} never completed",
            label,
            transfer_id
        );
        info!("{} transfer {:#}:", label, transfer_id);
        info!("  sender:    {:#}", transfer.sender);
        info!("  recipient: {:#}", transfer.recipient);
        info!("  amount:    {} {}", format_ether(transfer.amount), label);
        info!("  to chain:  {}", transfer.destinationChain);
        info!("  message:   {}", transfer.message);
    }

    let platform = NFTAuctionPlatform::new(stack.platform, provider.clone());
    let auction = platform.getAuction(auction_id).call().await?;
    let active = platform.isAuctionActive(auction_id).call().await?._0;
    info!("Auction #{} status:", auction_id);
    info!("  seller:  {:#}", auction.seller);
    info!("  start:   {} USD", format_ether(auction.startPrice));
    info!("  reserve: {} USD", format_ether(auction.reservePrice));
    info!("  active:  {}", active);

    info!("Final balances:");
    for (name, address) in [
        ("owner", owner.address()),
        (bidder1.name, bidder1.address()),
        (bidder2.name, bidder2.address()),
        ("bridge", stack.bridge),
    ] {
        let balance = provider.get_balance(address).await?;
        info!("  {}: {} ETH", name, format_ether(balance));
    }
    for (name, address) in [
        (bidder1.name, bidder1.address()),
        (bidder2.name, bidder2.address()),
        ("bridge", stack.bridge),
    ] {
        let balance = usdt.balanceOf(address).call().await?._0;
        info!("  {}: {} USDT", name, format_ether(balance));
    }

    info!("Cross-chain demo complete");
    info!("  NFT collection: {}", stack.nft);
    info!("  USDT token:     {}", stack.usdt);
    info!("  bridge:         {}", stack.bridge);
    info!("  factory:        {}", stack.factory);
    info!("  platform:       {}", stack.platform);
    Ok(stack)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_console_subscriber();
    let config = CrossChainConfig::parse();
    let stack = run_demo(config).await?;
    println!("{}", stack.bridge);
    Ok(())
}
