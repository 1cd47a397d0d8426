//! Pure synchronous hashing for content identity
//!
//! Role identifiers, operation identities and derived addresses are all
//! digests. This module is the one place the algorithms are chosen; changing
//! them here changes every identity in the system.
//!
//! - Operation identities and derived addresses: **SHA-256**
//! - Role identifiers: **Keccak-256** of the role name, so well-known role ids
//!   equal the values published for existing access-control deployments
//!
//! Multi-field inputs go through [`Hasher::field`], which length-prefixes each
//! field so that `("ab", "c")` and `("a", "bc")` never collide.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Hash arbitrary bytes to a 32-byte digest
pub fn hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Keccak-256 digest of arbitrary bytes
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Incremental hasher over the workspace digest algorithm
#[derive(Debug, Clone, Default)]
pub struct Hasher(Sha256);

impl Hasher {
    /// Create an empty hasher
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    /// Create a hasher seeded with a domain separation tag
    pub fn with_domain(domain: &str) -> Self {
        let mut hasher = Self::new();
        hasher.field(domain.as_bytes());
        hasher
    }

    /// Feed raw bytes
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Feed one length-prefixed field
    pub fn field(&mut self, data: &[u8]) {
        self.0.update((data.len() as u64).to_be_bytes());
        self.0.update(data);
    }

    /// Finalize into a 32-byte digest
    pub fn finalize(self) -> [u8; 32] {
        self.0.finalize().into()
    }
}
