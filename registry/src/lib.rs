pub mod document;
pub mod query;
pub mod recorder;
pub mod store;

pub use document::{
    ContractRole, DeploymentRegistry, ErrorEntry, LastDeployment, Metadata, NetworkId,
    NetworkRecord,
};
pub use recorder::DeploymentRecorder;
pub use store::{RegistryError, RegistryStore};
