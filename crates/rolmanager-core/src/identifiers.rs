//! Core identifier types
//!
//! All identifiers are fixed-width byte strings compared by exact equality.
//! They display and parse as `0x`-prefixed lowercase hex and serialize as
//! that same string, so configuration files and logs read the same way.

use crate::hash::{self, Hasher};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when an identifier string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {reason}")]
pub struct ParseIdError {
    kind: &'static str,
    reason: String,
}

fn parse_hex<const N: usize>(kind: &'static str, s: &str) -> Result<[u8; N], ParseIdError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| ParseIdError {
        kind,
        reason: e.to_string(),
    })?;
    bytes.try_into().map_err(|bytes: Vec<u8>| ParseIdError {
        kind,
        reason: format!("expected {N} bytes, got {}", bytes.len()),
    })
}

macro_rules! hex_identifier {
    ($(#[$meta:meta])* $name:ident, $len:literal, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Create from raw bytes
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex with `0x` prefix
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex::<$len>($kind, s).map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseIdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_hex()
            }
        }
    };
}

hex_identifier!(
    /// Address-like identity of a principal or a manager instance
    ///
    /// Principals (accounts) and instances share one address space, so an
    /// instance can itself hold roles on another instance.
    Address,
    20,
    "address"
);

hex_identifier!(
    /// Opaque role identifier, conventionally the digest of a role name
    RoleId,
    32,
    "role id"
);

hex_identifier!(
    /// Deterministic identity of a schedulable operation
    OperationId,
    32,
    "operation id"
);

hex_identifier!(
    /// Caller-chosen salt that separates otherwise identical operations
    Salt,
    32,
    "salt"
);

impl Address {
    /// The all-zero address
    pub const ZERO: Self = Self([0u8; 20]);

    /// Derive a stable address from a human-readable label
    ///
    /// Used by tests, scenarios and the CLI to name principals.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Hasher::with_domain("rolmanager/address");
        hasher.field(label.as_bytes());
        Self::truncate(hasher.finalize())
    }

    /// Derive the address of something created by `creator` at `nonce`
    pub fn derive(creator: &Address, nonce: u64) -> Self {
        let mut hasher = Hasher::with_domain("rolmanager/create");
        hasher.field(&creator.0);
        hasher.field(&nonce.to_be_bytes());
        Self::truncate(hasher.finalize())
    }

    fn truncate(digest: [u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }
}

impl RoleId {
    /// Role identifier for a human-readable role name: Keccak-256 of its bytes
    pub fn from_name(name: &str) -> Self {
        Self(hash::keccak256(name.as_bytes()))
    }
}

impl Salt {
    /// The all-zero salt
    pub const ZERO: Self = Self([0u8; 32]);

    /// Salt whose last eight bytes carry `value`
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl Default for Salt {
    fn default() -> Self {
        Self::ZERO
    }
}
