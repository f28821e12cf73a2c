use alloy::sol;

sol! {
    #[sol(rpc, all_derives)]
    interface NFTAuctionFactory {
        function createAuctionPlatform() external returns (address);

        function auctionImplementation() external view returns (address);

        function getUserAuctions(address user) external view returns (address[]);

        function addDefaultPriceFeed(address token, address feed) external;

        event AuctionPlatformCreated(address indexed auctionPlatform, address indexed creator);
    }
}
