//! Manager instances
//!
//! A `ManagerInstance` owns one role store, one ledger and one engine, and is
//! the unit a factory deploys. Role stores and ledgers are never shared
//! between instances.

use crate::engine::{ExecutionReceipt, ScheduleEngine, ScheduledOperation};
use crate::executor::{CallExecutor, NoopExecutor};
use crate::operation::Operation;
use rolmanager_authorization::{RoleChange, RoleStore};
use rolmanager_core::{
    Address, Clock, ManagerConfig, OperationId, Result, RoleId, Salt, Timestamp,
};
use rolmanager_journal::{Call, OperationLedger, OperationRecord, OperationState};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// One addressable role-gated operation manager
pub struct ManagerInstance {
    address: Address,
    config: ManagerConfig,
    roles: RoleStore,
    ledger: OperationLedger,
    engine: ScheduleEngine,
    executor: Box<dyn CallExecutor>,
}

impl fmt::Debug for ManagerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerInstance")
            .field("address", &self.address)
            .field("name", &self.config.name)
            .field("engine", &self.engine)
            .field("operations", &self.ledger.len())
            .finish_non_exhaustive()
    }
}

fn logged<T>(name: &str, call: &'static str, result: Result<T>) -> Result<T> {
    result.map_err(|error| {
        warn!(manager = name, call, kind = error.kind(), %error, "call rejected");
        error
    })
}

impl ManagerInstance {
    /// Admin role constant
    pub const ADMIN_ROLE: RoleId = rolmanager_authorization::ADMIN_ROLE;
    /// Proposer role constant
    pub const PROPOSER_ROLE: RoleId = rolmanager_authorization::PROPOSER_ROLE;
    /// Executor role constant
    pub const EXECUTOR_ROLE: RoleId = rolmanager_authorization::EXECUTOR_ROLE;
    /// Canceler role constant
    pub const CANCELER_ROLE: RoleId = rolmanager_authorization::CANCELER_ROLE;

    /// Create an instance at `address`
    ///
    /// Fails with `LengthMismatch` before anything is built if the bootstrap
    /// sequences differ in length. ADMIN is granted to `config.admin` first,
    /// then each bootstrap pair in order. Calls run through a
    /// [`NoopExecutor`] until [`with_executor`](Self::with_executor) is used.
    pub fn create(address: Address, config: ManagerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let roles = RoleStore::bootstrap(config.admin, config.bootstrap_pairs());
        let engine = ScheduleEngine::new(config.min_delay(), clock);
        info!(
            %address,
            name = %config.name,
            admin = %config.admin,
            min_delay_secs = config.min_delay_secs,
            bootstrap = config.roles.len(),
            "manager created"
        );
        Ok(Self {
            address,
            config,
            roles,
            ledger: OperationLedger::new(),
            engine,
            executor: Box::new(NoopExecutor),
        })
    }

    /// Replace the call executor
    pub fn with_executor(mut self, executor: impl CallExecutor + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    // === Configuration ===

    /// Instance address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Minimum delay, fixed at creation
    pub fn min_delay(&self) -> Duration {
        self.engine.min_delay()
    }

    /// Creation-time configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Current clock reading
    pub fn now(&self) -> Timestamp {
        self.engine.now()
    }

    // === Roles ===

    /// Membership lookup
    pub fn has_role(&self, role: &RoleId, principal: &Address) -> bool {
        self.roles.has_role(role, principal)
    }

    /// Holders of `role`
    pub fn role_members(&self, role: &RoleId) -> Vec<Address> {
        self.roles.role_members(role)
    }

    /// Number of holders of `role`
    pub fn role_member_count(&self, role: &RoleId) -> usize {
        self.roles.role_member_count(role)
    }

    /// Grant `role` to `principal`; `caller` must hold ADMIN
    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: RoleId,
        principal: Address,
    ) -> Result<RoleChange> {
        let result = self.roles.grant_role(caller, role, principal);
        logged(&self.config.name, "grant_role", result)
    }

    /// Revoke `role` from `principal`; `caller` must hold ADMIN
    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: RoleId,
        principal: Address,
    ) -> Result<RoleChange> {
        let result = self.roles.revoke_role(caller, role, principal);
        logged(&self.config.name, "revoke_role", result)
    }

    /// Drop one of the caller's own roles
    pub fn renounce_role(&mut self, caller: &Address, role: RoleId) -> RoleChange {
        self.roles.renounce_role(caller, role)
    }

    // === Lifecycle ===

    /// Propose a single call; `caller` must hold PROPOSER
    pub fn propose(
        &mut self,
        caller: &Address,
        call: Call,
        predecessor: Option<OperationId>,
        salt: Salt,
        delay: Duration,
    ) -> Result<ScheduledOperation> {
        self.propose_operation(caller, &Operation::single(call, predecessor, salt), delay)
    }

    /// Propose an ordered batch; `caller` must hold PROPOSER
    pub fn propose_batch(
        &mut self,
        caller: &Address,
        calls: Vec<Call>,
        predecessor: Option<OperationId>,
        salt: Salt,
        delay: Duration,
    ) -> Result<ScheduledOperation> {
        self.propose_operation(caller, &Operation::batch(calls, predecessor, salt), delay)
    }

    /// Propose a prepared operation
    pub fn propose_operation(
        &mut self,
        caller: &Address,
        operation: &Operation,
        delay: Duration,
    ) -> Result<ScheduledOperation> {
        let result = self
            .engine
            .propose(&self.roles, &mut self.ledger, caller, operation, delay);
        if let Ok(scheduled) = &result {
            info!(
                manager = %self.config.name,
                id = %scheduled.id,
                ready_at = %scheduled.ready_at,
                "operation proposed"
            );
        }
        logged(&self.config.name, "propose", result)
    }

    /// Execute a single call; `caller` must hold EXECUTOR
    pub fn execute(
        &mut self,
        caller: &Address,
        call: Call,
        predecessor: Option<OperationId>,
        salt: Salt,
    ) -> Result<ExecutionReceipt> {
        self.execute_operation(caller, &Operation::single(call, predecessor, salt))
    }

    /// Execute an ordered batch; `caller` must hold EXECUTOR
    pub fn execute_batch(
        &mut self,
        caller: &Address,
        calls: Vec<Call>,
        predecessor: Option<OperationId>,
        salt: Salt,
    ) -> Result<ExecutionReceipt> {
        self.execute_operation(caller, &Operation::batch(calls, predecessor, salt))
    }

    /// Execute a prepared operation
    pub fn execute_operation(
        &mut self,
        caller: &Address,
        operation: &Operation,
    ) -> Result<ExecutionReceipt> {
        let result = self.engine.execute(
            &self.roles,
            &mut self.ledger,
            self.executor.as_mut(),
            caller,
            operation,
        );
        if let Ok(receipt) = &result {
            info!(
                manager = %self.config.name,
                id = %receipt.id,
                executed_at = %receipt.executed_at,
                "operation executed"
            );
        }
        logged(&self.config.name, "execute", result)
    }

    /// Cancel a Pending or Ready operation
    ///
    /// Dual authorization: CANCELER holders and ADMIN holders may both cancel.
    pub fn cancel(&mut self, caller: &Address, id: &OperationId) -> Result<OperationRecord> {
        let result = self.engine.cancel(&self.roles, &mut self.ledger, caller, id);
        if result.is_ok() {
            info!(manager = %self.config.name, %id, "operation cancelled");
        }
        logged(&self.config.name, "cancel", result)
    }

    // === Queries ===

    /// Identity a single call would be scheduled under
    pub fn hash_operation(
        &self,
        call: &Call,
        predecessor: Option<OperationId>,
        salt: Salt,
    ) -> OperationId {
        rolmanager_journal::identity_of(call, predecessor.as_ref(), &salt)
    }

    /// Identity a batch would be scheduled under
    pub fn hash_operation_batch(
        &self,
        calls: &[Call],
        predecessor: Option<OperationId>,
        salt: Salt,
    ) -> OperationId {
        rolmanager_journal::batch_identity_of(calls, predecessor.as_ref(), &salt)
    }

    /// State of `id` now
    pub fn state_of(&self, id: &OperationId) -> OperationState {
        self.ledger.state_of(id, self.engine.now())
    }

    /// Ready time of `id`, if recorded
    pub fn timestamp_of(&self, id: &OperationId) -> Option<Timestamp> {
        self.ledger.timestamp_of(id)
    }

    /// Record for `id`, if any
    pub fn record(&self, id: &OperationId) -> Option<&OperationRecord> {
        self.ledger.get(id)
    }

    /// Whether `id` has any record
    pub fn is_operation(&self, id: &OperationId) -> bool {
        self.state_of(id) != OperationState::Unset
    }

    /// Pending or Ready
    pub fn is_pending(&self, id: &OperationId) -> bool {
        self.state_of(id).is_live()
    }

    /// Ready now
    pub fn is_ready(&self, id: &OperationId) -> bool {
        self.state_of(id) == OperationState::Ready
    }

    /// Executed
    pub fn is_done(&self, id: &OperationId) -> bool {
        self.state_of(id) == OperationState::Done
    }
}
