//! Serialized access to a manager instance
//!
//! Callers on different threads reach one instance through a
//! `SharedManager`. Each method holds the instance lock for the whole call,
//! which gives the single total order of calls the lifecycle relies on: of
//! two racing executes, one wins and the other sees `AlreadyDone`.

use crate::engine::{ExecutionReceipt, ScheduledOperation};
use crate::instance::ManagerInstance;
use crate::operation::Operation;
use parking_lot::{Mutex, MutexGuard};
use rolmanager_authorization::RoleChange;
use rolmanager_core::{Address, OperationId, Result, RoleId};
use rolmanager_journal::{OperationRecord, OperationState};
use std::sync::Arc;
use std::time::Duration;

/// Cloneable handle to a lock-serialized manager instance
#[derive(Debug, Clone)]
pub struct SharedManager {
    address: Address,
    inner: Arc<Mutex<ManagerInstance>>,
}

impl SharedManager {
    /// Wrap an instance
    pub fn new(instance: ManagerInstance) -> Self {
        Self {
            address: instance.address(),
            inner: Arc::new(Mutex::new(instance)),
        }
    }

    /// Instance address, readable without locking
    pub fn address(&self) -> Address {
        self.address
    }

    /// Lock the instance for a sequence of calls that must not interleave
    pub fn lock(&self) -> MutexGuard<'_, ManagerInstance> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut ManagerInstance) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// See [`ManagerInstance::has_role`]
    pub fn has_role(&self, role: &RoleId, principal: &Address) -> bool {
        self.inner.lock().has_role(role, principal)
    }

    /// See [`ManagerInstance::grant_role`]
    pub fn grant_role(
        &self,
        caller: &Address,
        role: RoleId,
        principal: Address,
    ) -> Result<RoleChange> {
        self.inner.lock().grant_role(caller, role, principal)
    }

    /// See [`ManagerInstance::revoke_role`]
    pub fn revoke_role(
        &self,
        caller: &Address,
        role: RoleId,
        principal: Address,
    ) -> Result<RoleChange> {
        self.inner.lock().revoke_role(caller, role, principal)
    }

    /// See [`ManagerInstance::propose_operation`]
    pub fn propose(
        &self,
        caller: &Address,
        operation: &Operation,
        delay: Duration,
    ) -> Result<ScheduledOperation> {
        self.inner.lock().propose_operation(caller, operation, delay)
    }

    /// See [`ManagerInstance::execute_operation`]
    pub fn execute(&self, caller: &Address, operation: &Operation) -> Result<ExecutionReceipt> {
        self.inner.lock().execute_operation(caller, operation)
    }

    /// See [`ManagerInstance::cancel`]
    pub fn cancel(&self, caller: &Address, id: &OperationId) -> Result<OperationRecord> {
        self.inner.lock().cancel(caller, id)
    }

    /// See [`ManagerInstance::state_of`]
    pub fn state_of(&self, id: &OperationId) -> OperationState {
        self.inner.lock().state_of(id)
    }
}
