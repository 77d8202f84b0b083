//! Deployment bookkeeping for the lottery contracts.
//!
//! A logical contract name is resolved to an on-chain address per network.
//! The first resolution deploys and records the address in the network's
//! [`AddressBook`]; later resolutions return the recorded address without
//! deploying again.

pub mod address_book;
pub mod error;
pub mod network;
pub mod plan;
pub mod resolver;
pub mod stellar;

pub use address_book::AddressBook;
pub use error::{DeployError, Error, Result};
pub use network::{Network, NetworkProbe, PassphraseSource, RpcProbe};
pub use plan::{deploy_all, seed_test_network, Deployment};
pub use resolver::{ContractHandle, Deployer, InitArg, Resolver};
pub use stellar::StellarCli;
