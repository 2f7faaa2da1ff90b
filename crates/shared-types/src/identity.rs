//! Identity value objects.
//!
//! Validator addresses and chain identifiers are compared constantly across
//! consensus and dispatch; both normalize to lowercase on construction so the
//! rest of the codebase never has to remember to fold case.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Empty address")]
    EmptyAddress,

    #[error("Empty chain id")]
    EmptyChainId,
}

/// A validator (or account) address.
///
/// Stored lowercase; equality and hashing operate on the normalized form, so
/// `0xABCD...` and `0xabcd...` are the same address. Non-EVM chains use
/// whatever string encoding their family defines, normalized the same way.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create an address, normalizing to lowercase.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentityError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentityError::EmptyAddress);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// The normalized (lowercase) string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// Deserialization goes through the normalizing constructor so addresses
// arriving over the wire or from config compare equal to locally built ones.
impl TryFrom<String> for Address {
    type Error = IdentityError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A destination chain identifier ("ethereum", "polygon", "arbitrum", ...).
///
/// Chains are configured at runtime, so this is a normalized string rather
/// than a closed enum.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    /// The local simulation network shipped with the node binary.
    pub fn devnet() -> Self {
        Self("devnet".to_string())
    }

    /// Create a chain id, normalizing to lowercase.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentityError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentityError::EmptyChainId);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// The normalized (lowercase) string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChainId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ChainId {
    type Error = IdentityError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ChainId> for String {
    fn from(chain_id: ChainId) -> Self {
        chain_id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
