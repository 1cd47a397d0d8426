//! Schedule engine
//!
//! Orchestrates the operation lifecycle against a role store and a ledger it
//! does not own. Every transition reads the clock once, performs all checks,
//! and only then writes, so a rejected call never leaves partial state.
//!
//! # Transitions
//!
//! | Call | Role | Requires | Result |
//! |------|------|----------|--------|
//! | `propose` | PROPOSER | whole-second `delay ≥ min_delay`, identity Unset | Pending, `ready_at = now + delay` |
//! | `execute` | EXECUTOR | Ready, predecessor Done | effects applied, Done |
//! | `cancel` | CANCELER or ADMIN | Pending or Ready | Unset |

use crate::executor::CallExecutor;
use crate::operation::Operation;
use rolmanager_authorization::{
    RoleStore, ADMIN_ROLE, CANCELER_ROLE, EXECUTOR_ROLE, PROPOSER_ROLE,
};
use rolmanager_core::{
    whole_seconds, Address, Clock, ManagerError, OperationId, Result, Timestamp,
};
use rolmanager_journal::{OperationLedger, OperationRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Result of a successful proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledOperation {
    /// Identity of the scheduled operation
    pub id: OperationId,
    /// Principal that proposed it
    pub proposer: Address,
    /// When it was proposed
    pub proposed_at: Timestamp,
    /// Earliest execution time
    pub ready_at: Timestamp,
}

/// Result of a successful execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    /// Identity of the executed operation
    pub id: OperationId,
    /// Principal that executed it
    pub executor: Address,
    /// When it executed
    pub executed_at: Timestamp,
    /// Output of each call, in call order
    pub outputs: Vec<Vec<u8>>,
}

/// Timelock state machine over a role store and a ledger
pub struct ScheduleEngine {
    min_delay: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ScheduleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleEngine")
            .field("min_delay", &self.min_delay)
            .field("now", &self.clock.now())
            .finish()
    }
}

impl ScheduleEngine {
    /// Create an engine with a fixed minimum delay
    pub fn new(min_delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { min_delay, clock }
    }

    /// Minimum delay, fixed for the engine's lifetime
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Current clock reading
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Schedule `operation` to become ready after `delay`
    ///
    /// The predecessor is not inspected here; it is checked at execution.
    pub fn propose(
        &self,
        roles: &RoleStore,
        ledger: &mut OperationLedger,
        caller: &Address,
        operation: &Operation,
        delay: Duration,
    ) -> Result<ScheduledOperation> {
        roles.check_role(&PROPOSER_ROLE, caller)?;
        let delay = whole_seconds(delay)?;
        if delay < self.min_delay {
            return Err(ManagerError::InsufficientDelay {
                requested: delay,
                minimum: self.min_delay,
            });
        }

        let now = self.clock.now();
        let ready_at = now
            .checked_add(delay)
            .ok_or(ManagerError::DelayOverflow { delay })?;
        let id = operation.id();
        let record = OperationRecord::pending(
            now,
            ready_at,
            operation.predecessor,
            operation.payload_digest(),
        );
        ledger.record_pending(id, record)?;

        debug!(%id, %caller, %ready_at, calls = operation.calls().len(), "operation scheduled");
        Ok(ScheduledOperation {
            id,
            proposer: *caller,
            proposed_at: now,
            ready_at,
        })
    }

    /// Execute a Ready operation through `executor`
    ///
    /// Calls run in order. If any call fails the operation stays Ready and
    /// the error is returned; nothing is retried.
    pub fn execute(
        &self,
        roles: &RoleStore,
        ledger: &mut OperationLedger,
        executor: &mut dyn CallExecutor,
        caller: &Address,
        operation: &Operation,
    ) -> Result<ExecutionReceipt> {
        roles.check_role(&EXECUTOR_ROLE, caller)?;

        let now = self.clock.now();
        let id = operation.id();
        ledger.check_ready(&id, now)?;
        if let Some(predecessor) = operation.predecessor {
            if !ledger.is_done(&predecessor) {
                return Err(ManagerError::PredecessorNotDone { predecessor });
            }
        }

        let outputs = operation
            .calls()
            .iter()
            .map(|call| executor.call(call))
            .collect::<Result<Vec<_>>>()?;
        ledger.mark_done(&id, now)?;

        debug!(%id, %caller, %now, "operation executed");
        Ok(ExecutionReceipt {
            id,
            executor: *caller,
            executed_at: now,
            outputs,
        })
    }

    /// Cancel a Pending or Ready operation
    ///
    /// Accepted from CANCELER holders and from ADMIN holders.
    pub fn cancel(
        &self,
        roles: &RoleStore,
        ledger: &mut OperationLedger,
        caller: &Address,
        id: &OperationId,
    ) -> Result<OperationRecord> {
        roles.check_any_role(&[CANCELER_ROLE, ADMIN_ROLE], caller)?;
        let record = ledger.cancel(id)?;
        debug!(%id, %caller, "operation cancelled");
        Ok(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::executor::{NoopExecutor, RecordingExecutor};
    use assert_matches::assert_matches;
    use rolmanager_core::{Salt, SimulatedClock};
    use rolmanager_journal::{Call, OperationState};

    struct Fixture {
        clock: SimulatedClock,
        engine: ScheduleEngine,
        roles: RoleStore,
        ledger: OperationLedger,
    }

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn fixture() -> Fixture {
        let clock = SimulatedClock::new(Timestamp(1_000));
        let engine = ScheduleEngine::new(Duration::from_secs(40), Arc::new(clock.clone()));
        let roles = RoleStore::bootstrap(
            addr("admin"),
            [
                (PROPOSER_ROLE, addr("proposer")),
                (EXECUTOR_ROLE, addr("executor")),
                (CANCELER_ROLE, addr("canceler")),
            ],
        );
        Fixture {
            clock,
            engine,
            roles,
            ledger: OperationLedger::new(),
        }
    }

    fn op(payload: &[u8]) -> Operation {
        Operation::single(
            Call::new(addr("target"), payload.to_vec()),
            None,
            Salt::ZERO,
        )
    }

    #[test]
    fn test_propose_sets_ready_at() {
        let mut f = fixture();
        let scheduled = f
            .engine
            .propose(&f.roles, &mut f.ledger, &addr("proposer"), &op(b"a"), Duration::from_secs(55))
            .unwrap();
        assert_eq!(scheduled.proposed_at, Timestamp(1_000));
        assert_eq!(scheduled.ready_at, Timestamp(1_055));
        assert_eq!(f.ledger.timestamp_of(&scheduled.id), Some(Timestamp(1_055)));
    }

    #[test]
    fn test_propose_requires_proposer_and_min_delay() {
        let mut f = fixture();
        assert_matches!(
            f.engine.propose(&f.roles, &mut f.ledger, &addr("executor"), &op(b"a"), Duration::from_secs(40)),
            Err(ManagerError::Unauthorized { role, .. }) if role == PROPOSER_ROLE
        );
        assert_matches!(
            f.engine.propose(&f.roles, &mut f.ledger, &addr("proposer"), &op(b"a"), Duration::from_secs(39)),
            Err(ManagerError::InsufficientDelay { .. })
        );
        assert!(f.ledger.is_empty());
    }

    #[test]
    fn test_propose_overflowing_delay() {
        let mut f = fixture();
        assert_matches!(
            f.engine.propose(&f.roles, &mut f.ledger, &addr("proposer"), &op(b"a"), Duration::from_secs(u64::MAX)),
            Err(ManagerError::DelayOverflow { .. })
        );
    }

    #[test]
    fn test_execute_failure_keeps_operation_ready() {
        let mut f = fixture();
        let recorder = RecordingExecutor::new();
        let mut executor = recorder.clone();
        let operation = op(b"a");
        let id = f
            .engine
            .propose(&f.roles, &mut f.ledger, &addr("proposer"), &operation, Duration::from_secs(40))
            .unwrap()
            .id;
        f.clock.advance(Duration::from_secs(40));

        recorder.fail_target(addr("target"));
        assert_matches!(
            f.engine.execute(&f.roles, &mut f.ledger, &mut executor, &addr("executor"), &operation),
            Err(ManagerError::EffectFailed { .. })
        );
        assert_eq!(f.ledger.state_of(&id, f.engine.now()), OperationState::Ready);

        recorder.clear_failure(&addr("target"));
        let receipt = f
            .engine
            .execute(&f.roles, &mut f.ledger, &mut executor, &addr("executor"), &operation)
            .unwrap();
        assert_eq!(receipt.outputs, vec![b"a".to_vec()]);
        assert_eq!(f.ledger.state_of(&id, f.engine.now()), OperationState::Done);
    }

    #[test]
    fn test_execute_requires_executor_role() {
        let mut f = fixture();
        let operation = op(b"a");
        f.engine
            .propose(&f.roles, &mut f.ledger, &addr("proposer"), &operation, Duration::from_secs(40))
            .unwrap();
        f.clock.advance(Duration::from_secs(40));
        assert_matches!(
            f.engine.execute(&f.roles, &mut f.ledger, &mut NoopExecutor, &addr("proposer"), &operation),
            Err(ManagerError::Unauthorized { role, .. }) if role == EXECUTOR_ROLE
        );
    }

    #[test]
    fn test_cancel_accepts_canceler_and_admin() {
        let mut f = fixture();
        let first = f
            .engine
            .propose(&f.roles, &mut f.ledger, &addr("proposer"), &op(b"a"), Duration::from_secs(40))
            .unwrap();
        let second = f
            .engine
            .propose(&f.roles, &mut f.ledger, &addr("proposer"), &op(b"b"), Duration::from_secs(40))
            .unwrap();

        assert_matches!(
            f.engine.cancel(&f.roles, &mut f.ledger, &addr("executor"), &first.id),
            Err(ManagerError::Unauthorized { role, .. }) if role == CANCELER_ROLE
        );
        f.engine.cancel(&f.roles, &mut f.ledger, &addr("canceler"), &first.id).unwrap();
        f.engine.cancel(&f.roles, &mut f.ledger, &addr("admin"), &second.id).unwrap();
        assert!(f.ledger.is_empty());
    }
}
