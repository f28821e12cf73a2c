use std::fs;
use std::path::{Path, PathBuf};

use alloy::{
    network::{Ethereum, TransactionBuilder},
    primitives::Address,
    providers::Provider,
    rpc::types::TransactionRequest,
    transports::http::{Client, Http},
};
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::contract::proxy::IMPLEMENTATION_SLOT;

/// Compiled-artifact shapes in the wild: Hardhat emits the creation
/// bytecode as a bare hex string, Foundry as an object with an `object`
/// field. Everything else in the artifact is irrelevant here.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Bytecode {
    Plain(String),
    Object { object: String },
}

impl Bytecode {
    fn hex(&self) -> &str {
        match self {
            Bytecode::Plain(hex) => hex,
            Bytecode::Object { object } => object,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Artifact {
    bytecode: Bytecode,
}

/// Deploys contracts from compiled artifacts looked up at runtime, the
/// way a deployment pipeline that doesn't compile Solidity itself has to.
/// Method calls go through the typed interfaces in [`crate::contract`];
/// this only covers creation transactions and raw storage reads.
pub struct ContractTransport<P> {
    provider: P,
    artifacts_dir: PathBuf,
}

impl<P> ContractTransport<P>
where
    P: Provider<Http<Client>, Ethereum> + Clone,
{
    pub fn new(provider: P, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            artifacts_dir: artifacts_dir.into(),
        }
    }

    /// Deploys `name` with the given ABI-encoded constructor args and
    /// returns the created address once the receipt is in.
    pub async fn deploy_contract(&self, name: &str, constructor_args: Vec<u8>) -> Result<Address> {
        let code = {
            let mut code = load_creation_bytecode(&self.artifacts_dir, name)?;
            code.extend_from_slice(&constructor_args);
            code
        };
        let tx = TransactionRequest::default().with_deploy_code(code);
        let receipt = self
            .provider
            .send_transaction(tx)
            .await?
            .get_receipt()
            .await?;
        let address = receipt
            .contract_address
            .ok_or_else(|| anyhow!("deployment of {} produced no contract address", name))?;
        info!("Deployed {} at {:#}", name, address);
        Ok(address)
    }

    /// Reads the EIP-1967 implementation slot of `proxy` straight from
    /// storage. Works against any account; an empty slot reads as the
    /// zero address.
    pub async fn implementation_address(&self, proxy: Address) -> Result<Address> {
        let word = self
            .provider
            .get_storage_at(proxy, IMPLEMENTATION_SLOT.into())
            .await?;
        Ok(Address::from_word(word.into()))
    }
}

fn load_creation_bytecode(artifacts_dir: &Path, name: &str) -> Result<Vec<u8>> {
    let file_name = format!("{}.json", name);
    let path = find_artifact(artifacts_dir, &file_name)?.ok_or_else(|| {
        anyhow!(
            "no artifact {} under {} (compile the contracts first)",
            file_name,
            artifacts_dir.display()
        )
    })?;
    let artifact: Artifact = {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading artifact {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing artifact {}", path.display()))?
    };
    let bytecode = alloy::hex::decode(artifact.bytecode.hex())
        .with_context(|| format!("decoding bytecode of {}", name))?;
    if bytecode.is_empty() {
        bail!("artifact for {} carries no creation bytecode", name);
    }
    Ok(bytecode)
}

// Hardhat nests artifacts as contracts/<File>.sol/<Contract>.json with a
// .dbg.json companion next to each; matching on the exact file name
// skips the companions.
fn find_artifact(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("reading artifacts dir {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("reading artifacts dir {}", dir.display()))?
            .path();
        if path.is_dir() {
            if let Some(found) = find_artifact(&path, file_name)? {
                return Ok(Some(found));
            }
        } else if path.file_name().is_some_and(|f| f == file_name) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_artifact(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn finds_artifacts_nested_hardhat_style() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(
            dir.path(),
            "contracts/NFTAuctionPlatform.sol/NFTAuctionPlatform.json",
            r#"{"bytecode": "0x6080"}"#,
        );
        write_artifact(
            dir.path(),
            "contracts/NFTAuctionPlatform.sol/NFTAuctionPlatform.dbg.json",
            r#"{"buildInfo": "../build-info/x.json"}"#,
        );

        let bytecode = load_creation_bytecode(dir.path(), "NFTAuctionPlatform").unwrap();
        assert_eq!(bytecode, vec![0x60, 0x80]);
    }

    #[test]
    fn accepts_the_object_bytecode_shape() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(
            dir.path(),
            "out/MyToken.sol/MyToken.json",
            r#"{"bytecode": {"object": "0xdeadbeef", "sourceMap": ""}}"#,
        );

        let bytecode = load_creation_bytecode(dir.path(), "MyToken").unwrap();
        assert_eq!(bytecode, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn missing_artifacts_name_the_search_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_creation_bytecode(dir.path(), "Nothing").unwrap_err();
        assert!(err.to_string().contains("Nothing.json"));
    }

    #[test]
    fn empty_bytecode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(
            dir.path(),
            "contracts/IThing.sol/IThing.json",
            r#"{"bytecode": "0x"}"#,
        );
        assert!(load_creation_bytecode(dir.path(), "IThing").is_err());
    }

    #[test]
    fn debug_companions_are_never_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        // only the companion exists, so the lookup must come up empty
        write_artifact(
            dir.path(),
            "contracts/Gone.sol/Gone.dbg.json",
            r#"{"buildInfo": "x"}"#,
        );
        assert!(find_artifact(dir.path(), "Gone.json").unwrap().is_none());
    }
}
