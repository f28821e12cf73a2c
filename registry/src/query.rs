use alloy::primitives::Address;
use tracing::warn;

use crate::document::{ContractRole, NetworkId, NetworkRecord};
use crate::store::RegistryStore;

/// Looks up the recorded address for a role on a network. Loads the file
/// fresh on every call so a write from another process is visible to the
/// next lookup. Empty and unparseable entries both come back as `None`;
/// the latter with a warning, since it means the file was edited by hand.
pub fn deployed_address(
    store: &RegistryStore,
    network: &NetworkId,
    role: ContractRole,
) -> Option<Address> {
    let doc = store.load();
    let record = doc.networks.get(network.name())?;
    let text = record.role_address(role);
    if text.is_empty() {
        return None;
    }
    match text.parse::<Address>() {
        Ok(address) => Some(address),
        Err(err) => {
            warn!(
                "registry holds a malformed {} address for {}: {}",
                role, network, err
            );
            None
        }
    }
}

/// The full section for a network, if one has been recorded.
pub fn network_record(store: &RegistryStore, network: &NetworkId) -> Option<NetworkRecord> {
    store.load().networks.get(network.name()).cloned()
}
