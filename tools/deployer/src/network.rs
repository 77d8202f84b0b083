use std::fmt;

use tracing::{debug, warn};

use crate::error::{DeployError, Error, Result};

pub const STANDALONE_PASSPHRASE: &str = "Standalone Network ; February 2017";
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const MAINNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Network identity, derived from the passphrase the RPC endpoint reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    Local,
    Testnet,
    Mainnet,
    Custom(String),
}

impl Network {
    pub fn from_passphrase(passphrase: &str) -> Self {
        match passphrase {
            STANDALONE_PASSPHRASE => Network::Local,
            TESTNET_PASSPHRASE => Network::Testnet,
            MAINNET_PASSPHRASE => Network::Mainnet,
            other => Network::Custom(slug(other)),
        }
    }

    /// Key used to name the network's address book file.
    pub fn key(&self) -> String {
        match self {
            Network::Local => "local".to_owned(),
            Network::Testnet => "testnet".to_owned(),
            Network::Mainnet => "mainnet".to_owned(),
            Network::Custom(slug) => format!("custom-{slug}"),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Network::Local)
    }

    /// Networks where test assets may be minted during deployment.
    pub fn is_test_net(&self) -> bool {
        matches!(self, Network::Local | Network::Testnet)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Lowercase alphanumerics, every other run of characters collapsed to `-`.
fn slug(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Anything that can ask the deployment endpoint which network it serves.
pub trait PassphraseSource {
    fn reported_passphrase(&self) -> std::result::Result<String, DeployError>;
}

/// One-shot readiness check. Never blocks beyond its own bounded attempt;
/// retrying is up to the caller.
pub trait NetworkProbe {
    fn ready(&self) -> Option<Network>;
}

/// Identifies the network from the passphrase the endpoint reports, checked
/// against an optional expected passphrase.
#[derive(Debug, Clone)]
pub struct RpcProbe<S> {
    source: S,
    expected: Option<String>,
}

impl<S: PassphraseSource> RpcProbe<S> {
    pub fn new(source: S, expected: Option<String>) -> Self {
        Self { source, expected }
    }

    /// `Ok(None)` while the endpoint does not answer. An answer naming a
    /// network other than the expected one is an error.
    pub fn identify(&self) -> Result<Option<Network>> {
        let reported = match self.source.reported_passphrase() {
            Ok(p) => p,
            Err(e) => {
                debug!("endpoint not answering: {}", e);
                return Ok(None);
            }
        };
        if let Some(expected) = &self.expected {
            if expected != &reported {
                return Err(Error::NetworkMismatch {
                    expected: expected.clone(),
                    reported,
                });
            }
        }
        Ok(Some(Network::from_passphrase(&reported)))
    }
}

impl<S: PassphraseSource> NetworkProbe for RpcProbe<S> {
    fn ready(&self) -> Option<Network> {
        match self.identify() {
            Ok(network) => network,
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}
