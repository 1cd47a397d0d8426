//! Schedulable operations

use rolmanager_core::{OperationId, Salt};
use rolmanager_journal::{batch_identity_of, identity_of, payload_digest, Call};
use serde::{Deserialize, Serialize};

/// One schedulable unit of work: a single call or an ordered batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    calls: Vec<Call>,
    batch: bool,
    /// Operation that must be done before this one executes
    pub predecessor: Option<OperationId>,
    /// Separates otherwise identical operations
    pub salt: Salt,
}

impl Operation {
    /// A single call
    pub fn single(call: Call, predecessor: Option<OperationId>, salt: Salt) -> Self {
        Self {
            calls: vec![call],
            batch: false,
            predecessor,
            salt,
        }
    }

    /// An ordered batch of calls executed together
    pub fn batch(calls: Vec<Call>, predecessor: Option<OperationId>, salt: Salt) -> Self {
        Self {
            calls,
            batch: true,
            predecessor,
            salt,
        }
    }

    /// Calls in execution order
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Whether this is a batch
    pub fn is_batch(&self) -> bool {
        self.batch
    }

    /// Content-derived identity
    pub fn id(&self) -> OperationId {
        match (self.batch, self.calls.as_slice()) {
            (false, [call]) => identity_of(call, self.predecessor.as_ref(), &self.salt),
            _ => batch_identity_of(&self.calls, self.predecessor.as_ref(), &self.salt),
        }
    }

    /// Digest of the covered payloads
    pub fn payload_digest(&self) -> [u8; 32] {
        payload_digest(&self.calls)
    }
}
