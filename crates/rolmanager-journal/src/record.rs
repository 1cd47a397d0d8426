//! Operation lifecycle records

use rolmanager_core::{OperationId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable lifecycle state of an operation identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationState {
    /// No record: never proposed, or cancelled
    Unset,
    /// Proposed, ready time not yet reached
    Pending,
    /// Proposed and ready time reached
    Ready,
    /// Executed
    Done,
}

impl OperationState {
    /// Pending or Ready
    pub fn is_live(&self) -> bool {
        matches!(self, OperationState::Pending | OperationState::Ready)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationState::Unset => "unset",
            OperationState::Pending => "pending",
            OperationState::Ready => "ready",
            OperationState::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Ledger entry for one operation identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// When the operation was proposed
    pub proposed_at: Timestamp,
    /// Earliest time the operation may execute
    pub ready_at: Timestamp,
    /// Operation that must be done before this one executes
    pub predecessor: Option<OperationId>,
    /// Digest of the covered payloads
    pub payload_digest: [u8; 32],
    /// Set once executed
    pub done_at: Option<Timestamp>,
}

impl OperationRecord {
    /// Create a pending record
    pub fn pending(
        proposed_at: Timestamp,
        ready_at: Timestamp,
        predecessor: Option<OperationId>,
        payload_digest: [u8; 32],
    ) -> Self {
        Self {
            proposed_at,
            ready_at,
            predecessor,
            payload_digest,
            done_at: None,
        }
    }

    /// Whether the operation has executed
    pub fn is_done(&self) -> bool {
        self.done_at.is_some()
    }

    /// State observed at `now`
    pub fn state_at(&self, now: Timestamp) -> OperationState {
        if self.is_done() {
            OperationState::Done
        } else if now >= self.ready_at {
            OperationState::Ready
        } else {
            OperationState::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_follows_time() {
        let mut record = OperationRecord::pending(Timestamp(0), Timestamp(40), None, [0u8; 32]);
        assert_eq!(record.state_at(Timestamp(10)), OperationState::Pending);
        assert_eq!(record.state_at(Timestamp(39)), OperationState::Pending);
        assert_eq!(record.state_at(Timestamp(40)), OperationState::Ready);
        record.done_at = Some(Timestamp(41));
        assert_eq!(record.state_at(Timestamp(41)), OperationState::Done);
        assert!(!record.state_at(Timestamp(41)).is_live());
    }
}
