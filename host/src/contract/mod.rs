//! Typed RPC surfaces of the on-chain collaborators. The auction, bridge
//! and token logic lives in Solidity; these interfaces only describe the
//! calls and events the workflows drive.

use alloy::{rpc::types::TransactionReceipt, sol_types::SolEvent};
use anyhow::{anyhow, Result};

pub mod bridge;
pub mod calls;
pub mod factory;
pub mod nft;
pub mod platform;
pub mod proxy;
pub mod token;

/// Pulls the first `E` out of a receipt's logs. Factory-style creation
/// flows report the new address this way rather than as a return value.
pub fn decode_event<E: SolEvent>(receipt: &TransactionReceipt) -> Result<E> {
    receipt
        .inner
        .logs()
        .iter()
        .find_map(|log| log.log_decode::<E>().ok())
        .map(|log| log.inner.data)
        .ok_or_else(|| {
            anyhow!(
                "receipt {} carries no {} event",
                receipt.transaction_hash,
                E::SIGNATURE
            )
        })
}
