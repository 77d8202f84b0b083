use std::fmt;

use tracing::{info, warn};

use crate::address_book::AddressBook;
use crate::error::{DeployError, Error, Result};

/// One named constructor argument, passed to the contract's `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitArg {
    pub name: String,
    pub value: String,
}

impl InitArg {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for InitArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// A resolved contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractHandle {
    pub name: String,
    pub source: String,
    pub address: String,
}

/// Backend that puts contracts on chain.
pub trait Deployer {
    /// Deploy an instance of `source`, initialise it with `args` and return
    /// its address.
    fn deploy(
        &mut self,
        source: &str,
        args: &[InitArg],
    ) -> std::result::Result<String, DeployError>;

    /// Call `function` on a deployed contract and return its raw output.
    fn invoke(
        &mut self,
        address: &str,
        function: &str,
        args: &[InitArg],
    ) -> std::result::Result<String, DeployError>;
}

/// Resolves logical names to addresses, deploying at most once per name.
pub struct Resolver<D> {
    book: AddressBook,
    deployer: D,
}

impl<D: Deployer> Resolver<D> {
    pub fn new(book: AddressBook, deployer: D) -> Self {
        Self { book, deployer }
    }

    pub fn book(&self) -> &AddressBook {
        &self.book
    }

    pub fn deployer(&self) -> &D {
        &self.deployer
    }

    /// [`Resolver::resolve_as`] with the source named after the contract.
    pub fn resolve(&mut self, name: &str, args: &[InitArg]) -> Result<ContractHandle> {
        self.resolve_as(name, name, args)
    }

    /// Return the recorded instance of `name`, or deploy `source` with `args`
    /// and record it.
    ///
    /// `args` are only used on first deployment; a recorded entry wins even
    /// if the arguments have since changed. On failure the book is left as
    /// it was.
    pub fn resolve_as(
        &mut self,
        name: &str,
        source: &str,
        args: &[InitArg],
    ) -> Result<ContractHandle> {
        if let Some(address) = self.book.get(name) {
            info!("{} already deployed at {}", name, address);
            return Ok(ContractHandle {
                name: name.to_owned(),
                source: source.to_owned(),
                address: address.to_owned(),
            });
        }

        info!("deploying {} from {}", name, source);
        let address = self.deployer.deploy(source, args).map_err(|e| {
            warn!("deploying {} failed: {}", name, e);
            Error::DeploymentFailed {
                name: name.to_owned(),
                args: args.iter().map(ToString::to_string).collect(),
                reason: e.to_string(),
            }
        })?;

        self.book.insert(name, &address)?;
        info!("{} deployed at {}", name, address);

        Ok(ContractHandle {
            name: name.to_owned(),
            source: source.to_owned(),
            address,
        })
    }

    /// The recorded instance of `name`, without deploying.
    pub fn lookup(&self, name: &str) -> Result<ContractHandle> {
        let address = self
            .book
            .get(name)
            .ok_or_else(|| Error::NotDeployed(name.to_owned()))?;
        Ok(ContractHandle {
            name: name.to_owned(),
            source: name.to_owned(),
            address: address.to_owned(),
        })
    }

    /// Call `function` on the contract at `address`.
    pub fn invoke(&mut self, address: &str, function: &str, args: &[InitArg]) -> Result<String> {
        info!("invoking {} on {}", function, address);
        self.deployer
            .invoke(address, function, args)
            .map_err(|e| Error::InvocationFailed {
                address: address.to_owned(),
                function: function.to_owned(),
                reason: e.to_string(),
            })
    }
}
