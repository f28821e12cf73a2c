use alloy::{
    primitives::{b256, B256},
    sol,
};

sol! {
    contract ERC1967Proxy {
        constructor(address implementation, bytes _data);
    }
}

/// keccak256("eip1967.proxy.implementation") - 1, per EIP-1967.
pub const IMPLEMENTATION_SLOT: B256 =
    b256!("0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{keccak256, U256};

    #[test]
    fn implementation_slot_matches_the_eip1967_formula() {
        let hash = keccak256("eip1967.proxy.implementation");
        let slot = B256::from(U256::from_be_bytes(hash.0) - U256::from(1));
        assert_eq!(IMPLEMENTATION_SLOT, slot);
    }

    #[test]
    fn proxy_constructor_args_abi_encode_as_two_words_plus_data() {
        use alloy::{primitives::Address, sol_types::SolConstructor};

        let call = ERC1967Proxy::constructorCall {
            implementation: Address::repeat_byte(0x42),
            _data: Vec::<u8>::new().into(),
        };
        let encoded = call.abi_encode();
        // address word + bytes offset word + bytes length word
        assert_eq!(encoded.len(), 96);
        assert!(encoded[12..32] == Address::repeat_byte(0x42)[..]);
    }
}
