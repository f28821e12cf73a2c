use alloy::sol;

sol! {
    #[sol(rpc, all_derives)]
    interface SimpleCrossChainBridge {
        function setSupportedChain(uint64 chainId, bool supported) external;

        function setRemoteBridge(uint64 chainId, address bridge) external;

        function setTransferFee(uint256 fee) external;

        function transferETHCrossChain(uint64 destinationChain, address recipient, string message) external payable;

        function transferTokenCrossChain(uint64 destinationChain, address recipient, address token, uint256 amount, string message) external payable;

        function simulateReceiveTransfer(address sender, address recipient, address token, uint256 amount, string message) external;

        function getTransfer(bytes32 transferId) external view returns (
            address sender,
            address recipient,
            address token,
            uint256 amount,
            uint64 destinationChain,
            string message,
            bool completed
        );

        event CrossChainTransferInitiated(bytes32 indexed transferId, address indexed sender, address recipient, uint64 destinationChain, uint256 amount);
    }
}
