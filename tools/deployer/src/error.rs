use thiserror::Error;

/// Failure reported by a [`crate::Deployer`] backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DeployError(pub String);

#[derive(Debug, Error)]
pub enum Error {
    #[error("deploying {name} failed (args: {args:?}): {reason}")]
    DeploymentFailed {
        name: String,
        args: Vec<String>,
        reason: String,
    },

    #[error("invoking {function} on {address} failed: {reason}")]
    InvocationFailed {
        address: String,
        function: String,
        reason: String,
    },

    #[error("{0} has no recorded address on this network")]
    NotDeployed(String),

    #[error("address book has no entry for {0}")]
    MissingEntry(String),

    #[error("address book io error: {0}")]
    Persist(#[from] std::io::Error),

    #[error("address book is not valid json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("endpoint reports network {reported:?}, expected {expected:?}")]
    NetworkMismatch { expected: String, reported: String },

    #[error("{path} belongs to network {found}, not {expected}")]
    ForeignBook {
        path: String,
        expected: String,
        found: String,
    },

    #[error("network did not become ready")]
    NetworkUnavailable,
}

pub type Result<T> = std::result::Result<T, Error>;
