//! Content-derived operation identity
//!
//! An operation's identity is the digest of its target, payload, predecessor
//! and salt. Identical requests therefore land on the same ledger entry,
//! which is what rejects duplicate submissions. Single calls and batches use
//! different domain tags so a one-element batch never aliases a single call.

use rolmanager_core::hash::{self, Hasher};
use rolmanager_core::{Address, OperationId, Salt};
use serde::{Deserialize, Serialize};

const SINGLE_DOMAIN: &str = "rolmanager/operation/v1";
const BATCH_DOMAIN: &str = "rolmanager/batch/v1";

/// One call against a target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    /// Address the call is made against
    pub target: Address,
    /// Opaque call data
    #[serde(default)]
    pub payload: Vec<u8>,
}

impl Call {
    /// Create a call
    pub fn new(target: Address, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            target,
            payload: payload.into(),
        }
    }
}

fn absorb_tail(hasher: &mut Hasher, predecessor: Option<&OperationId>, salt: &Salt) {
    match predecessor {
        Some(id) => {
            hasher.update(&[1]);
            hasher.update(id.as_bytes());
        }
        None => hasher.update(&[0]),
    }
    hasher.update(salt.as_bytes());
}

/// Identity of a single call
pub fn identity_of(call: &Call, predecessor: Option<&OperationId>, salt: &Salt) -> OperationId {
    let mut hasher = Hasher::with_domain(SINGLE_DOMAIN);
    hasher.update(call.target.as_bytes());
    hasher.field(&call.payload);
    absorb_tail(&mut hasher, predecessor, salt);
    OperationId::from_bytes(hasher.finalize())
}

/// Identity of an ordered batch of calls
pub fn batch_identity_of(
    calls: &[Call],
    predecessor: Option<&OperationId>,
    salt: &Salt,
) -> OperationId {
    let mut hasher = Hasher::with_domain(BATCH_DOMAIN);
    hasher.update(&(calls.len() as u64).to_be_bytes());
    for call in calls {
        hasher.update(call.target.as_bytes());
        hasher.field(&call.payload);
    }
    absorb_tail(&mut hasher, predecessor, salt);
    OperationId::from_bytes(hasher.finalize())
}

/// Digest of the payloads covered by an operation
pub fn payload_digest(calls: &[Call]) -> [u8; 32] {
    match calls {
        [single] => hash::hash(&single.payload),
        many => {
            let mut hasher = Hasher::new();
            for call in many {
                hasher.field(&call.payload);
            }
            hasher.finalize()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(label: &str, payload: &[u8]) -> Call {
        Call::new(Address::from_label(label), payload.to_vec())
    }

    #[test]
    fn test_identity_is_deterministic() {
        let c = call("vault", b"withdraw(100)");
        assert_eq!(
            identity_of(&c, None, &Salt::ZERO),
            identity_of(&c.clone(), None, &Salt::ZERO)
        );
    }

    #[test]
    fn test_every_input_separates() {
        let base = call("vault", b"withdraw(100)");
        let id = identity_of(&base, None, &Salt::ZERO);
        let pred = OperationId::from_bytes([9u8; 32]);

        assert_ne!(id, identity_of(&call("other", b"withdraw(100)"), None, &Salt::ZERO));
        assert_ne!(id, identity_of(&call("vault", b"withdraw(101)"), None, &Salt::ZERO));
        assert_ne!(id, identity_of(&base, Some(&pred), &Salt::ZERO));
        assert_ne!(id, identity_of(&base, None, &Salt::from_u64(1)));
    }

    #[test]
    fn test_single_and_batch_do_not_alias() {
        let c = call("vault", b"x");
        assert_ne!(
            identity_of(&c, None, &Salt::ZERO),
            batch_identity_of(std::slice::from_ref(&c), None, &Salt::ZERO)
        );
    }

    #[test]
    fn test_batch_order_matters() {
        let a = call("a", b"1");
        let b = call("b", b"2");
        assert_ne!(
            batch_identity_of(&[a.clone(), b.clone()], None, &Salt::ZERO),
            batch_identity_of(&[b, a], None, &Salt::ZERO)
        );
    }

    #[test]
    fn test_payload_digest_single_is_plain_hash() {
        let c = call("vault", b"payload");
        assert_eq!(payload_digest(std::slice::from_ref(&c)), hash::hash(b"payload"));
    }
}
