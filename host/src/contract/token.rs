use alloy::sol;

sol! {
    #[sol(rpc, all_derives)]
    contract MyToken {
        constructor(uint256 initialSupply);

        function transfer(address to, uint256 amount) external returns (bool);

        function approve(address spender, uint256 amount) external returns (bool);

        function balanceOf(address account) external view returns (uint256);
    }
}

// Chainlink-shaped aggregator the auction platform prices bids against.
sol! {
    #[sol(rpc, all_derives)]
    contract MockPriceFeed {
        constructor(uint8 decimals, string description, uint256 version, int256 initialAnswer);

        function decimals() external view returns (uint8);

        function description() external view returns (string);

        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );
    }
}
