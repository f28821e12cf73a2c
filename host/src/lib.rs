pub mod actor;
pub mod cli;
pub mod contract;
pub mod deployer;
pub mod env;
pub mod transport;
pub mod upgrader;
