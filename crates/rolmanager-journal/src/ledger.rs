//! Operation ledger
//!
//! Single-writer map from operation identity to lifecycle record. Every
//! method validates before it mutates, so a returned error means the ledger
//! is exactly as it was.

use crate::record::{OperationRecord, OperationState};
use rolmanager_core::{ManagerError, OperationId, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Lifecycle records keyed by operation identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLedger {
    records: BTreeMap<OperationId, OperationRecord>,
}

impl OperationLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pending operation
    ///
    /// Fails with `AlreadyScheduled` while a Pending/Ready record exists and
    /// with `AlreadyDone` once the identity has executed, so a completed
    /// operation can never be replayed.
    pub fn record_pending(&mut self, id: OperationId, record: OperationRecord) -> Result<()> {
        match self.records.get(&id) {
            Some(existing) if existing.is_done() => Err(ManagerError::AlreadyDone { id }),
            Some(_) => Err(ManagerError::AlreadyScheduled { id }),
            None => {
                trace!(%id, ready_at = %record.ready_at, "record_pending");
                self.records.insert(id, record);
                Ok(())
            }
        }
    }

    /// Require the operation to be Ready at `now`
    pub fn check_ready(&self, id: &OperationId, now: Timestamp) -> Result<&OperationRecord> {
        let record = self
            .records
            .get(id)
            .ok_or(ManagerError::UnknownOperation { id: *id })?;
        match record.state_at(now) {
            OperationState::Ready => Ok(record),
            OperationState::Done => Err(ManagerError::AlreadyDone { id: *id }),
            OperationState::Pending | OperationState::Unset => {
                Err(ManagerError::NotReady { id: *id })
            }
        }
    }

    /// Mark a Ready operation as executed at `now`
    pub fn mark_done(&mut self, id: &OperationId, now: Timestamp) -> Result<&OperationRecord> {
        self.check_ready(id, now)?;
        let record = self
            .records
            .get_mut(id)
            .ok_or(ManagerError::UnknownOperation { id: *id })?;
        record.done_at = Some(now);
        trace!(%id, %now, "mark_done");
        Ok(record)
    }

    /// Remove a Pending/Ready record
    ///
    /// Fails with `UnknownOperation` if there is no record or it is Done.
    pub fn cancel(&mut self, id: &OperationId) -> Result<OperationRecord> {
        match self.records.get(id) {
            Some(record) if !record.is_done() => {}
            _ => return Err(ManagerError::UnknownOperation { id: *id }),
        }
        let record = self
            .records
            .remove(id)
            .ok_or(ManagerError::UnknownOperation { id: *id })?;
        trace!(%id, "cancel");
        Ok(record)
    }

    /// Record for `id`, if any
    pub fn get(&self, id: &OperationId) -> Option<&OperationRecord> {
        self.records.get(id)
    }

    /// State of `id` observed at `now`
    pub fn state_of(&self, id: &OperationId, now: Timestamp) -> OperationState {
        self.records
            .get(id)
            .map_or(OperationState::Unset, |record| record.state_at(now))
    }

    /// Ready time of `id`, if recorded
    pub fn timestamp_of(&self, id: &OperationId) -> Option<Timestamp> {
        self.records.get(id).map(|record| record.ready_at)
    }

    /// Whether `id` has executed
    pub fn is_done(&self, id: &OperationId) -> bool {
        self.records.get(id).is_some_and(OperationRecord::is_done)
    }

    /// Number of records, live or done
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in identity order
    pub fn iter(&self) -> impl Iterator<Item = (&OperationId, &OperationRecord)> {
        self.records.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn op(n: u8) -> OperationId {
        OperationId::from_bytes([n; 32])
    }

    fn pending(ready_at: u64) -> OperationRecord {
        OperationRecord::pending(Timestamp(0), Timestamp(ready_at), None, [0u8; 32])
    }

    #[test]
    fn test_record_pending_rejects_live_collision() {
        let mut ledger = OperationLedger::new();
        ledger.record_pending(op(1), pending(40)).unwrap();
        assert_matches!(
            ledger.record_pending(op(1), pending(90)),
            Err(ManagerError::AlreadyScheduled { id }) if id == op(1)
        );
        assert_eq!(ledger.timestamp_of(&op(1)), Some(Timestamp(40)));
    }

    #[test]
    fn test_record_pending_rejects_replay_of_done() {
        let mut ledger = OperationLedger::new();
        ledger.record_pending(op(1), pending(40)).unwrap();
        ledger.mark_done(&op(1), Timestamp(40)).unwrap();
        assert_matches!(
            ledger.record_pending(op(1), pending(80)),
            Err(ManagerError::AlreadyDone { .. })
        );
    }

    #[test]
    fn test_mark_done_errors() {
        let mut ledger = OperationLedger::new();
        assert_matches!(
            ledger.mark_done(&op(1), Timestamp(0)),
            Err(ManagerError::UnknownOperation { .. })
        );

        ledger.record_pending(op(1), pending(40)).unwrap();
        assert_matches!(
            ledger.mark_done(&op(1), Timestamp(39)),
            Err(ManagerError::NotReady { .. })
        );
        assert_eq!(ledger.state_of(&op(1), Timestamp(39)), OperationState::Pending);

        let record = ledger.mark_done(&op(1), Timestamp(40)).unwrap();
        assert_eq!(record.done_at, Some(Timestamp(40)));
        assert_matches!(
            ledger.mark_done(&op(1), Timestamp(41)),
            Err(ManagerError::AlreadyDone { .. })
        );
    }

    #[test]
    fn test_cancel_frees_identity() {
        let mut ledger = OperationLedger::new();
        ledger.record_pending(op(1), pending(40)).unwrap();
        let removed = ledger.cancel(&op(1)).unwrap();
        assert_eq!(removed.ready_at, Timestamp(40));
        assert_eq!(ledger.state_of(&op(1), Timestamp(100)), OperationState::Unset);
        assert!(ledger.record_pending(op(1), pending(50)).is_ok());
    }

    #[test]
    fn test_cancel_rejects_absent_and_done() {
        let mut ledger = OperationLedger::new();
        assert_matches!(ledger.cancel(&op(1)), Err(ManagerError::UnknownOperation { .. }));

        ledger.record_pending(op(1), pending(0)).unwrap();
        ledger.mark_done(&op(1), Timestamp(0)).unwrap();
        let before = ledger.clone();
        assert_matches!(ledger.cancel(&op(1)), Err(ManagerError::UnknownOperation { .. }));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_ledger_serializes() {
        let mut ledger = OperationLedger::new();
        ledger.record_pending(op(3), pending(7)).unwrap();
        let json = serde_json::to_string(&ledger).unwrap();
        let back: OperationLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
