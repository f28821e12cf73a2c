use alloy::sol;

// Both contracts carry the same three storage slots so the delegatecall
// demonstration can show which side's storage a call wrote into.
sol! {
    #[sol(rpc, all_derives)]
    interface CallTestTarget {
        function value() external view returns (uint256);

        function sender() external view returns (address);

        function contractAddress() external view returns (address);

        function updateState(uint256 newValue) external;

        function reset() external;
    }
}

sol! {
    #[sol(rpc, all_derives)]
    interface CallTestCaller {
        function value() external view returns (uint256);

        function sender() external view returns (address);

        function contractAddress() external view returns (address);

        function testCall(address target, uint256 newValue) external;

        function testDelegateCall(address target, uint256 newValue) external;
    }
}

// Minimal delegating proxy with the target's storage layout, for showing
// where writes land when calls are forwarded through a fallback.
sol! {
    contract SimpleProxyDemo {
        constructor(address target);
    }
}
