use alloy::sol;

sol! {
    #[sol(rpc, all_derives)]
    contract AuctionNFT {
        constructor(string name, string symbol, string baseURI);

        function mint(address to, string tokenURI) external returns (uint256);

        function ownerOf(uint256 tokenId) external view returns (address);

        function getApproved(uint256 tokenId) external view returns (address);

        function isApprovedForAll(address owner, address operator) external view returns (bool);

        function setApprovalForAll(address operator, bool approved) external;

        event NFTMinted(address indexed to, uint256 indexed tokenId, string tokenURI);
    }
}

// Plain ERC-721 used as a placeholder collection on production deploys.
sol! {
    #[sol(rpc, all_derives)]
    interface TestERC721 {
        function mint(address to, uint256 tokenId) external;

        function ownerOf(uint256 tokenId) external view returns (address);
    }
}
