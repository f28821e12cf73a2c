use alloy::primitives::{Address, TxHash};
use tracing::warn;

use crate::document::{
    now_iso, ContractRole, DeploymentRegistry, ErrorEntry, LastDeployment, NetworkId,
};
use crate::store::{RegistryError, RegistryStore};

/// Applies run outcomes to a registry document and flushes it after every
/// change, so a failure later in a run cannot lose addresses that were
/// already recorded.
pub struct DeploymentRecorder<'a> {
    store: &'a RegistryStore,
    doc: &'a mut DeploymentRegistry,
}

impl<'a> DeploymentRecorder<'a> {
    pub fn new(store: &'a RegistryStore, doc: &'a mut DeploymentRegistry) -> Self {
        Self { store, doc }
    }

    /// Records a freshly deployed contract under its role in the network
    /// section. A proxy deployment also stamps the section's deployer and
    /// timestamp and becomes the registry-wide last deployment.
    pub fn record_deployment(
        &mut self,
        network: &NetworkId,
        role: ContractRole,
        address: Address,
        deployer: Address,
    ) -> Result<(), RegistryError> {
        let stamp = now_iso();
        let record = self.doc.ensure_network(network);
        record.set_role_address(role, address.to_string());
        if role == ContractRole::Proxy {
            record.deployer = deployer.to_string();
            record.deployed_at = stamp.clone();
            self.doc.metadata.last_deployment = Some(LastDeployment {
                network: network.name().to_string(),
                timestamp: stamp,
                deployer: deployer.to_string(),
            });
        }
        self.flush()
    }

    pub fn record_upgrade(
        &mut self,
        network: &NetworkId,
        implementation_v2: Address,
        transaction: TxHash,
    ) -> Result<(), RegistryError> {
        let record = self.doc.ensure_network(network);
        record.implementation_v2 = implementation_v2.to_string();
        record.upgrade_transaction = transaction.to_string();
        record.upgraded_at = now_iso();
        self.flush()
    }

    /// Appends a failure entry. Best effort: if the registry itself cannot
    /// be written the entry stays in memory and the original failure is
    /// still the one the caller reports.
    pub fn record_error(&mut self, entry: ErrorEntry) {
        self.doc.errors.push(entry);
        if let Err(err) = self.flush() {
            warn!("could not persist error entry: {}", err);
        }
    }

    fn flush(&mut self) -> Result<(), RegistryError> {
        self.doc.touch();
        self.store.save(self.doc)
    }
}
