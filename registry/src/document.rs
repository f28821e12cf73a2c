use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use alloy::primitives::Address;
use chrono::{SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

pub const REGISTRY_VERSION: &str = "1.0.0";
pub const REGISTRY_DESCRIPTION: &str = "NFT auction platform deployment registry";

/// Networks the registry knows out of the box. Anything else gets an
/// ad hoc `chain-<id>` section when it is first deployed to.
pub struct KnownNetwork {
    pub name: &'static str,
    pub chain_id: u64,
    pub rpc: &'static str,
}

pub const KNOWN_NETWORKS: [KnownNetwork; 4] = [
    KnownNetwork {
        name: "localhost",
        chain_id: 31337,
        rpc: "http://127.0.0.1:8545",
    },
    KnownNetwork {
        name: "goerli",
        chain_id: 5,
        rpc: "https://goerli.infura.io/v3/YOUR_PROJECT_ID",
    },
    KnownNetwork {
        name: "sepolia",
        chain_id: 11155111,
        rpc: "https://sepolia.infura.io/v3/YOUR_PROJECT_ID",
    },
    KnownNetwork {
        name: "mainnet",
        chain_id: 1,
        rpc: "https://mainnet.infura.io/v3/YOUR_PROJECT_ID",
    },
];

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A network identity as resolved from the chain id the node reports.
/// The chain id is the single source of truth for which registry section
/// a run reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkId {
    name: String,
    chain_id: u64,
}

impl NetworkId {
    pub fn from_chain_id(chain_id: u64) -> Self {
        let name = KNOWN_NETWORKS
            .iter()
            .find(|n| n.chain_id == chain_id)
            .map(|n| n.name.to_string())
            .unwrap_or_else(|| format!("chain-{}", chain_id));
        Self { name, chain_id }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn is_mainnet(&self) -> bool {
        self.chain_id == 1
    }
}

impl Display for NetworkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The slot a deployed contract occupies within a network section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractRole {
    Proxy,
    Implementation,
    ImplementationV2,
    TestNft,
    Factory,
}

impl ContractRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractRole::Proxy => "proxy",
            ContractRole::Implementation => "implementation",
            ContractRole::ImplementationV2 => "implementationV2",
            ContractRole::TestNft => "testNFT",
            ContractRole::Factory => "factory",
        }
    }
}

impl Display for ContractRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One network's section of the registry file. Address and timestamp
/// fields hold the empty string until something is recorded; `extra`
/// carries keys this version of the tool doesn't know about so they
/// survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    #[serde(default)]
    pub chain_id: u64,
    #[serde(default)]
    pub rpc: String,
    #[serde(default)]
    pub proxy: String,
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub deployer: String,
    #[serde(default)]
    pub deployed_at: String,
    #[serde(default)]
    pub implementation_v2: String,
    #[serde(default)]
    pub upgrade_transaction: String,
    #[serde(default)]
    pub upgraded_at: String,
    #[serde(default, rename = "testNFT")]
    pub test_nft: String,
    #[serde(default)]
    pub factory: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl NetworkRecord {
    pub fn role_address(&self, role: ContractRole) -> &str {
        match role {
            ContractRole::Proxy => &self.proxy,
            ContractRole::Implementation => &self.implementation,
            ContractRole::ImplementationV2 => &self.implementation_v2,
            ContractRole::TestNft => &self.test_nft,
            ContractRole::Factory => &self.factory,
        }
    }

    pub fn set_role_address(&mut self, role: ContractRole, address: String) {
        match role {
            ContractRole::Proxy => self.proxy = address,
            ContractRole::Implementation => self.implementation = address,
            ContractRole::ImplementationV2 => self.implementation_v2 = address,
            ContractRole::TestNft => self.test_nft = address,
            ContractRole::Factory => self.factory = address,
        }
    }

    pub fn has_deployment(&self) -> bool {
        !self.proxy.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastDeployment {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub deployer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deployment: Option<LastDeployment>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An append-only failure record. Building the entry is separate from
/// persisting it so a failed save can never lose the message itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub deployer: String,
}

impl ErrorEntry {
    pub fn new(network: &NetworkId, deployer: Address, error: impl Into<String>) -> Self {
        Self {
            network: network.name().to_string(),
            timestamp: now_iso(),
            error: error.into(),
            deployer: deployer.to_string(),
        }
    }
}

/// In-memory form of the registry file. On disk the network sections sit
/// at the top level of the JSON object next to `metadata` and `errors`,
/// so (de)serialization is hand-written rather than derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentRegistry {
    pub networks: BTreeMap<String, NetworkRecord>,
    pub metadata: Metadata,
    pub errors: Vec<ErrorEntry>,
    pub extra: BTreeMap<String, Value>,
}

impl DeploymentRegistry {
    /// Returns the section for `network`, creating a defaulted one if it
    /// doesn't exist yet. Only ever fills fields that are empty; calling
    /// this twice is the same as calling it once.
    pub fn ensure_network(&mut self, network: &NetworkId) -> &mut NetworkRecord {
        let record = self.networks.entry(network.name().to_string()).or_default();
        if record.chain_id == 0 {
            record.chain_id = network.chain_id();
        }
        if record.rpc.is_empty() {
            if let Some(known) = KNOWN_NETWORKS
                .iter()
                .find(|n| n.chain_id == network.chain_id())
            {
                record.rpc = known.rpc.to_string();
            }
        }
        record
    }

    /// Reconciles the document against the default skeleton: every known
    /// network gets a section, empty fields get their defaults, populated
    /// and unknown fields are left alone.
    pub fn merge_defaults(&mut self) {
        for known in KNOWN_NETWORKS.iter() {
            let record = self.networks.entry(known.name.to_string()).or_default();
            if record.chain_id == 0 {
                record.chain_id = known.chain_id;
            }
            if record.rpc.is_empty() {
                record.rpc = known.rpc.to_string();
            }
        }
        if self.metadata.version.is_empty() {
            self.metadata.version = REGISTRY_VERSION.to_string();
        }
        if self.metadata.created_at.is_empty() {
            self.metadata.created_at = now_iso();
        }
        if self.metadata.description.is_empty() {
            self.metadata.description = REGISTRY_DESCRIPTION.to_string();
        }
    }

    /// Stamps the bookkeeping metadata ahead of a save.
    pub fn touch(&mut self) {
        if self.metadata.version.is_empty() {
            self.metadata.version = REGISTRY_VERSION.to_string();
        }
        if self.metadata.created_at.is_empty() {
            self.metadata.created_at = now_iso();
        }
        self.metadata.last_updated = now_iso();
    }

    fn from_raw(raw: BTreeMap<String, Value>) -> Self {
        let mut doc = DeploymentRegistry::default();
        for (key, value) in raw {
            match key.as_str() {
                "metadata" => match serde_json::from_value(value) {
                    Ok(metadata) => doc.metadata = metadata,
                    Err(err) => warn!("discarding malformed metadata section: {}", err),
                },
                "errors" => match serde_json::from_value(value) {
                    Ok(errors) => doc.errors = errors,
                    Err(err) => warn!("discarding malformed errors section: {}", err),
                },
                _ => {
                    if value.is_object() {
                        match NetworkRecord::deserialize(&value) {
                            Ok(record) => {
                                doc.networks.insert(key, record);
                            }
                            Err(err) => {
                                warn!("section {} is not a network record, keeping it as-is: {}", key, err);
                                doc.extra.insert(key, value);
                            }
                        }
                    } else {
                        doc.extra.insert(key, value);
                    }
                }
            }
        }
        doc
    }
}

impl Serialize for DeploymentRegistry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut len = self.networks.len() + self.extra.len() + 1;
        if !self.errors.is_empty() {
            len += 1;
        }
        let mut map = serializer.serialize_map(Some(len))?;
        for (name, record) in &self.networks {
            map.serialize_entry(name, record)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("metadata", &self.metadata)?;
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DeploymentRegistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn chain_id_resolution_uses_the_fixed_table() {
        assert_eq!(NetworkId::from_chain_id(31337).name(), "localhost");
        assert_eq!(NetworkId::from_chain_id(5).name(), "goerli");
        assert_eq!(NetworkId::from_chain_id(11155111).name(), "sepolia");
        assert_eq!(NetworkId::from_chain_id(1).name(), "mainnet");
        assert_eq!(NetworkId::from_chain_id(424242).name(), "chain-424242");
        assert!(NetworkId::from_chain_id(1).is_mainnet());
        assert!(!NetworkId::from_chain_id(31337).is_mainnet());
    }

    #[test]
    fn ensure_network_twice_is_the_same_as_once() {
        let net = NetworkId::from_chain_id(31337);
        let mut doc = DeploymentRegistry::default();
        doc.ensure_network(&net);
        let once = doc.clone();
        doc.ensure_network(&net);
        assert_eq!(once, doc);

        let record = &doc.networks["localhost"];
        assert_eq!(record.chain_id, 31337);
        assert_eq!(record.rpc, "http://127.0.0.1:8545");
        assert!(record.proxy.is_empty());
    }

    #[test]
    fn ensure_network_never_resets_populated_fields() {
        let net = NetworkId::from_chain_id(11155111);
        let mut doc = DeploymentRegistry::default();
        {
            let record = doc.ensure_network(&net);
            record.proxy = "0x1111111111111111111111111111111111111111".to_string();
            record.rpc = "https://rpc.example".to_string();
        }
        let record = doc.ensure_network(&net);
        assert_eq!(record.proxy, "0x1111111111111111111111111111111111111111");
        assert_eq!(record.rpc, "https://rpc.example");
        assert_eq!(record.chain_id, 11155111);
    }

    #[test]
    fn ensure_network_gives_ad_hoc_chains_no_rpc() {
        let net = NetworkId::from_chain_id(777);
        let mut doc = DeploymentRegistry::default();
        let record = doc.ensure_network(&net);
        assert_eq!(record.chain_id, 777);
        assert!(record.rpc.is_empty());
        assert!(doc.networks.contains_key("chain-777"));
    }

    #[test]
    fn merge_defaults_creates_every_known_network() {
        let mut doc = DeploymentRegistry::default();
        doc.merge_defaults();
        for known in KNOWN_NETWORKS.iter() {
            let record = &doc.networks[known.name];
            assert_eq!(record.chain_id, known.chain_id);
            assert_eq!(record.rpc, known.rpc);
        }
        assert_eq!(doc.metadata.version, REGISTRY_VERSION);
        assert_eq!(doc.metadata.description, REGISTRY_DESCRIPTION);
        assert!(!doc.metadata.created_at.is_empty());
    }

    #[test]
    fn merge_defaults_preserves_existing_data() {
        let mut doc = DeploymentRegistry::default();
        {
            let record = doc.ensure_network(&NetworkId::from_chain_id(31337));
            record.proxy = "0x2222222222222222222222222222222222222222".to_string();
            record
                .extra
                .insert("explorer".to_string(), Value::from("http://localhost:4000"));
        }
        doc.ensure_network(&NetworkId::from_chain_id(999));
        doc.metadata.version = "0.9.0".to_string();

        doc.merge_defaults();

        let localhost = &doc.networks["localhost"];
        assert_eq!(localhost.proxy, "0x2222222222222222222222222222222222222222");
        assert_eq!(localhost.extra["explorer"], Value::from("http://localhost:4000"));
        assert!(doc.networks.contains_key("chain-999"));
        assert_eq!(doc.metadata.version, "0.9.0");
    }

    #[test]
    fn merge_defaults_is_idempotent() {
        let mut doc = DeploymentRegistry::default();
        doc.merge_defaults();
        let once = doc.clone();
        doc.merge_defaults();
        assert_eq!(once, doc);
    }

    #[test]
    fn file_layout_keeps_network_sections_at_the_top_level() {
        let mut doc = DeploymentRegistry::default();
        doc.ensure_network(&NetworkId::from_chain_id(31337));
        doc.touch();

        let json = serde_json::to_string_pretty(&doc).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["localhost"]["chainId"], Value::from(31337));
        assert_eq!(value["localhost"]["proxy"], Value::from(""));
        assert_eq!(value["metadata"]["version"], Value::from(REGISTRY_VERSION));
        assert!(value.get("networks").is_none());
        // no failures recorded, so no errors key either
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn errors_only_serialize_once_present() {
        let mut doc = DeploymentRegistry::default();
        doc.errors.push(ErrorEntry {
            network: "localhost".to_string(),
            timestamp: now_iso(),
            error: "out of gas".to_string(),
            deployer: Address::repeat_byte(0x11).to_string(),
        });
        let value: Value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["errors"][0]["error"], Value::from("out of gas"));
    }

    #[test]
    fn non_object_sections_are_preserved_but_not_networks() {
        let json = r#"{
            "localhost": { "chainId": 31337, "proxy": "0x1234" },
            "notes": "hand written",
            "metadata": { "version": "1.0.0" }
        }"#;
        let doc: DeploymentRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(doc.networks["localhost"].proxy, "0x1234");
        assert_eq!(doc.extra["notes"], Value::from("hand written"));
        assert_eq!(doc.metadata.version, "1.0.0");

        let round: DeploymentRegistry =
            serde_json::from_str(&serde_json::to_string(&doc).unwrap()).unwrap();
        assert_eq!(doc, round);
    }

    #[test]
    fn malformed_known_sections_fall_back_to_defaults() {
        let json = r#"{
            "localhost": { "chainId": "thirty one thousand" },
            "metadata": [1, 2, 3],
            "errors": "none"
        }"#;
        let doc: DeploymentRegistry = serde_json::from_str(json).unwrap();
        // chainId of the wrong type means the section is kept verbatim, not parsed
        assert!(doc.networks.is_empty());
        assert!(doc.extra.contains_key("localhost"));
        assert_eq!(doc.metadata, Metadata::default());
        assert!(doc.errors.is_empty());
    }

    #[test]
    fn unknown_record_fields_survive_a_round_trip() {
        let json = r#"{
            "sepolia": {
                "chainId": 11155111,
                "proxy": "0x3333333333333333333333333333333333333333",
                "verifiedOnEtherscan": true
            },
            "metadata": { "version": "1.0.0", "maintainer": "ops" }
        }"#;
        let doc: DeploymentRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(
            doc.networks["sepolia"].extra["verifiedOnEtherscan"],
            Value::Bool(true)
        );
        assert_eq!(doc.metadata.extra["maintainer"], Value::from("ops"));

        let value: Value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["sepolia"]["verifiedOnEtherscan"], Value::Bool(true));
        assert_eq!(value["metadata"]["maintainer"], Value::from("ops"));
    }

    fn arb_address() -> impl Strategy<Value = String> {
        prop::array::uniform20(any::<u8>()).prop_map(|bytes| Address::from(bytes).to_string())
    }

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z ]{0,12}".prop_map(Value::from),
        ]
    }

    fn arb_record() -> impl Strategy<Value = NetworkRecord> {
        (
            any::<u64>(),
            arb_address(),
            arb_address(),
            "[0-9TZ:.\\-]{0,24}",
            prop::collection::btree_map(
                prop::sample::select(vec!["explorer", "gasPrice", "tag"])
                    .prop_map(String::from),
                arb_scalar(),
                0..3,
            ),
        )
            .prop_map(|(chain_id, proxy, test_nft, deployed_at, extra)| NetworkRecord {
                chain_id,
                proxy,
                test_nft,
                deployed_at,
                extra,
                ..NetworkRecord::default()
            })
    }

    fn arb_registry() -> impl Strategy<Value = DeploymentRegistry> {
        let networks = prop::collection::btree_map(
            prop::sample::select(vec!["localhost", "sepolia", "devnet", "chain-777"])
                .prop_map(String::from),
            arb_record(),
            0..4,
        );
        let extra = prop::collection::btree_map(
            prop::sample::select(vec!["comment", "schemaVersion"]).prop_map(String::from),
            arb_scalar(),
            0..2,
        );
        let errors = prop::collection::vec(
            ("[a-z]{1,8}", "[a-z ]{1,16}", arb_address()).prop_map(|(network, error, deployer)| {
                ErrorEntry {
                    network,
                    timestamp: now_iso(),
                    error,
                    deployer,
                }
            }),
            0..3,
        );
        (networks, extra, errors, arb_address()).prop_map(|(networks, extra, errors, deployer)| {
            DeploymentRegistry {
                networks,
                metadata: Metadata {
                    version: REGISTRY_VERSION.to_string(),
                    created_at: now_iso(),
                    last_updated: now_iso(),
                    description: REGISTRY_DESCRIPTION.to_string(),
                    last_deployment: Some(LastDeployment {
                        network: "localhost".to_string(),
                        timestamp: now_iso(),
                        deployer,
                    }),
                    extra: BTreeMap::new(),
                },
                errors,
                extra,
            }
        })
    }

    proptest! {
        #[test]
        fn registry_round_trips_through_json(doc in arb_registry()) {
            let json = serde_json::to_string_pretty(&doc).unwrap();
            let parsed: DeploymentRegistry = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(doc, parsed);
        }
    }
}
