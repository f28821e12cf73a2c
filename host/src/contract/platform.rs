use alloy::sol;

sol! {
    #[sol(rpc, all_derives)]
    interface NFTAuctionPlatform {
        function initialize() external;

        function owner() external view returns (address);

        function createAuction(uint256 duration, uint256 startPrice, uint256 reservePrice, address nftAddress, uint256 tokenId) external;

        function placeBidWithETH(uint256 auctionId) external payable;

        function placeBidWithToken(uint256 auctionId, address tokenAddress, uint256 amount) external;

        function getAuction(uint256 auctionId) external view returns (
            address seller,
            address nftContract,
            uint256 tokenId,
            uint256 startPrice,
            uint256 reservePrice,
            address highestBidder,
            uint256 highestBid,
            address bidToken,
            bool ended
        );

        function isAuctionActive(uint256 auctionId) external view returns (bool);

        function getTokenPriceInUSD(address token, uint256 amount) external view returns (uint256);

        function setCrossChainBridge(address bridge) external;

        function upgradeToAndCall(address newImplementation, bytes data) external payable;

        event AuctionCreated(uint256 indexed auctionId, address indexed seller, address nftContract, uint256 tokenId, uint256 startPrice);

        event BidPlaced(uint256 indexed auctionId, address indexed bidder, uint256 amount, address bidToken);
    }
}

sol! {
    #[sol(rpc, all_derives)]
    interface NFTAuctionPlatformV2 {
        function initializeV2() external;

        function version() external view returns (string);
    }
}
