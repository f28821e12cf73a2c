use std::str::FromStr;

use alloy::{
    network::Ethereum,
    primitives::{
        utils::{format_ether, parse_ether},
        Address, I256, U256,
    },
    providers::Provider,
    signers::local::PrivateKeySigner,
    sol_types::SolConstructor,
    transports::http::{Client, Http},
};
use anyhow::{anyhow, ensure, Ok, Result};
use clap::Parser;
use host::{
    actor::{self, Actor},
    cli::DemoConfig,
    contract::{
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

struct DemoStack {
    nft: Address,
    usdt: Address,
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

/// Stands up the full demo stack: NFT collection, price feeds, a
/// settlement token and a factory-created auction platform.
async fn deploy_stack<P>(transport: &ContractTransport<P>, provider: P) -> Result<DemoStack>
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
    // $2000 and $1, both at 8 decimals
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

    info!("Deploying the auction factory");
    let factory = transport
        .deploy_contract("NFTAuctionFactory", Vec::new())
        .await?;

    let factory_contract = NFTAuctionFactory::new(factory, provider);
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
    info!("Wired the default price feeds into the factory");

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

    Ok(DemoStack {
        nft,
        usdt,
        factory,
        platform,
    })
}

async fn run_demo(config: DemoConfig) -> Result<DemoStack> {
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

    info!("Minting NFTs to {}", seller.name);
    let nft = AuctionNFT::new(stack.nft, provider.clone());
    let token1 = {
        let receipt = nft
            .mint(seller.address(), "QmTest1".to_string())
            .send()
            .await?
            .get_receipt()
            .await?;
        decode_event::<AuctionNFT::NFTMinted>(&receipt)?.tokenId
    };
    let token2 = {
        let receipt = nft
            .mint(seller.address(), "QmTest2".to_string())
            .send()
            .await?
            .get_receipt()
            .await?;
        decode_event::<AuctionNFT::NFTMinted>(&receipt)?.tokenId
    };
    info!("Minted tokens {} and {}", token1, token2);

    let operator_approved = nft
        .isApprovedForAll(seller.address(), stack.platform)
        .call()
        .await?
        ._0;
    let single_approved = nft.getApproved(token1).call().await?._0;
    info!(
        "Approvals before: operator {}, single {:#}",
        operator_approved, single_approved
    );

    let seller_provider = create_provider(node_url.clone(), seller.wallet.clone());
    AuctionNFT::new(stack.nft, seller_provider.clone())
        .setApprovalForAll(stack.platform, true)
        .send()
        .await?
        .watch()
        .await?;
    let operator_approved = nft
        .isApprovedForAll(seller.address(), stack.platform)
        .call()
        .await?
        ._0;
    ensure!(operator_approved, "platform approval did not stick");
    info!("{} approved the platform for the whole collection", seller.name);

    info!("Funding bidders with USDT");
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
            .approve(stack.platform, bankroll)
            .send()
            .await?
            .watch()
            .await?;
    }
    info!("Each bidder holds 10000 USDT and has approved the platform");

    info!("Creating auctions");
    let platform_as_seller = NFTAuctionPlatform::new(stack.platform, seller_provider);
    let auction1 = {
        let receipt = platform_as_seller
            .createAuction(
                U256::from(60 * 60 * 24),
                parse_ether("100")?,
                parse_ether("200")?,
                stack.nft,
                token1,
            )
            .send()
            .await?
            .get_receipt()
            .await?;
        decode_event::<NFTAuctionPlatform::AuctionCreated>(&receipt)?.auctionId
    };
    info!("Auction #{} opened: start $100, reserve $200", auction1);
    let auction2 = {
        let receipt = platform_as_seller
            .createAuction(
                U256::from(60 * 60 * 12),
                parse_ether("50")?,
                parse_ether("100")?,
                stack.nft,
                token2,
            )
            .send()
            .await?
            .get_receipt()
            .await?;
        decode_event::<NFTAuctionPlatform::AuctionCreated>(&receipt)?.auctionId
    };
    info!("Auction #{} opened: start $50, reserve $100", auction2);

    let custodian = nft.ownerOf(token1).call().await?._0;
    ensure!(
        custodian == stack.platform,
        "token {} is held by {} instead of the platform",
        token1,
        custodian
    );
    info!("Token {} is escrowed by the platform", token1);

    info!("Bidding with ETH on auction #{}", auction1);
    let platform_as_bidder1 = NFTAuctionPlatform::new(
        stack.platform,
        create_provider(node_url.clone(), bidder1.wallet.clone()),
    );
    let platform_as_bidder2 = NFTAuctionPlatform::new(
        stack.platform,
        create_provider(node_url.clone(), bidder2.wallet.clone()),
    );
    platform_as_bidder1
        .placeBidWithETH(auction1)
        .value(parse_ether("0.06")?)
        .send()
        .await?
        .watch()
        .await?;
    info!("{} bid 0.06 ETH ($120)", bidder1.name);
    platform_as_bidder2
        .placeBidWithETH(auction1)
        .value(parse_ether("0.08")?)
        .send()
        .await?
        .watch()
        .await?;
    info!("{} bid 0.08 ETH ($160)", bidder2.name);

    info!("Bidding with USDT on auction #{}", auction2);
    platform_as_bidder1
        .placeBidWithToken(auction2, stack.usdt, parse_ether("80")?)
        .send()
        .await?
        .watch()
        .await?;
    info!("{} bid 80 USDT", bidder1.name);
    platform_as_bidder2
        .placeBidWithToken(auction2, stack.usdt, parse_ether("120")?)
        .send()
        .await?
        .watch()
        .await?;
    info!("{} bid 120 USDT", bidder2.name);

    let platform = NFTAuctionPlatform::new(stack.platform, provider.clone());
    for auction_id in [auction1, auction2] {
        let auction = platform.getAuction(auction_id).call().await?;
        let active = platform.isAuctionActive(auction_id).call().await?._0;
        info!("Auction #{} status:", auction_id);
        info!("  highest bidder: {:#}", auction.highestBidder);
        info!("  highest bid:    {} USD", format_ether(auction.highestBid));
        info!(
            "  bid token:      {}",
            if auction.bidToken == Address::ZERO {
                "ETH"
            } else {
                "ERC20"
            }
        );
        info!("  active:         {}", active);
    }

    info!("Factory bookkeeping");
    let factory_as_bidder1 = NFTAuctionFactory::new(
        stack.factory,
        create_provider(node_url.clone(), bidder1.wallet.clone()),
    );
    let second_platform = {
        let receipt = factory_as_bidder1
            .createAuctionPlatform()
            .send()
            .await?
            .get_receipt()
            .await?;
        decode_event::<NFTAuctionFactory::AuctionPlatformCreated>(&receipt)?.auctionPlatform
    };
    info!(
        "{} created a platform of their own at {:#}",
        bidder1.name, second_platform
    );
    let factory = NFTAuctionFactory::new(stack.factory, provider.clone());
    let owner_platforms = factory.getUserAuctions(owner.address()).call().await?._0;
    let bidder_platforms = factory.getUserAuctions(bidder1.address()).call().await?._0;
    info!(
        "Platforms created: owner {}, {} {}",
        owner_platforms.len(),
        bidder1.name,
        bidder_platforms.len()
    );

    let eth_value = platform
        .getTokenPriceInUSD(Address::ZERO, parse_ether("1")?)
        .call()
        .await?
        ._0;
    let usdt_value = platform
        .getTokenPriceInUSD(stack.usdt, parse_ether("100")?)
        .call()
        .await?
        ._0;
    info!(
        "Oracle valuations: 1 ETH = {} USD, 100 USDT = {} USD",
        format_ether(eth_value),
        format_ether(usdt_value)
    );

    info!("Demo complete");
    info!("  NFT collection: {}", stack.nft);
    info!("  USDT token:     {}", stack.usdt);
    info!("  factory:        {}", stack.factory);
    info!("  platform:       {}", stack.platform);
    info!("  platform #2:    {}", second_platform);
    Ok(stack)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_console_subscriber();
    let config = DemoConfig::parse();
    let stack = run_demo(config).await?;
    println!("{}", stack.platform);
    Ok(())
}
