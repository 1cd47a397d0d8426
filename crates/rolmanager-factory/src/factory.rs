//! Manager factory
//!
//! A successful creation follows this order:
//!
//! ```text
//! validate config → build instance (ADMIN + bootstrap pairs)
//!                 → registry entry → InstanceCreated
//! ```
//!
//! The sink runs after the factory lock is released, so it may query the
//! factory for the new instance.
//!
//! A rejected config stops at the first step, so it leaves no instance, no
//! registry entry, no notification and no consumed address.

use crate::notification::{InstanceCreated, NotificationSink, TracingSink};
use crate::registry::{global_registry, Registry, RegistryEntry};
use parking_lot::Mutex;
use rolmanager_core::{Address, Clock, ManagerConfig, ManagerError, Result, RoleId};
use rolmanager_engine::{CallExecutor, ManagerInstance, NoopExecutor, SharedManager};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Result of a successful creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationReceipt {
    /// New instance address
    pub instance: Address,
    /// Principal granted ADMIN
    pub admin: Address,
    /// Instance display name
    pub name: String,
    /// Notification published for this creation
    pub notification: InstanceCreated,
}

#[derive(Debug, Default)]
struct FactoryState {
    nonce: u64,
    instances: BTreeMap<Address, SharedManager>,
}

/// Creates manager instances and records them in a registry
pub struct Factory {
    address: Address,
    registry: Arc<Registry>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    state: Mutex<FactoryState>,
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("address", &self.address)
            .field("registry", &self.registry.address())
            .field("instances", &self.state.lock().instances.len())
            .finish_non_exhaustive()
    }
}

impl Factory {
    /// Create a factory bound to `registry`
    pub fn new(address: Address, registry: Arc<Registry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            address,
            registry,
            clock,
            sink: Arc::new(TracingSink),
            state: Mutex::new(FactoryState::default()),
        }
    }

    /// Create a factory bound to the process-wide registry
    pub fn with_global_registry(address: Address, clock: Arc<dyn Clock>) -> Self {
        Self::new(address, global_registry(), clock)
    }

    /// Replace the notification sink
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Factory address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Address of the registry this factory writes to
    pub fn registry(&self) -> Address {
        self.registry.address()
    }

    /// Registry handle for enumeration
    pub fn registry_handle(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Create an instance with a no-op call executor
    pub fn create_instance(&self, config: ManagerConfig) -> Result<CreationReceipt> {
        self.create_instance_with_executor(config, NoopExecutor)
    }

    /// Create an instance whose executed calls go to `executor`
    pub fn create_instance_with_executor(
        &self,
        config: ManagerConfig,
        executor: impl CallExecutor + 'static,
    ) -> Result<CreationReceipt> {
        if let Err(err) = config.validate() {
            tracing::warn!(factory = %self.address, name = %config.name, error = %err, "creation rejected");
            return Err(err);
        }

        let mut state = self.state.lock();
        let address = Address::derive(&self.address, state.nonce);
        let admin = config.admin;
        let name = config.name.clone();

        let instance = ManagerInstance::create(address, config, Arc::clone(&self.clock))?
            .with_executor(executor);
        state.nonce += 1;
        state
            .instances
            .insert(address, SharedManager::new(instance));

        self.registry.record(RegistryEntry {
            instance: address,
            factory: self.address,
            name: name.clone(),
        });
        drop(state);

        let notification = InstanceCreated {
            instance: address,
            factory: self.address,
            admin,
            name: name.clone(),
        };
        self.sink.publish(&notification);

        Ok(CreationReceipt {
            instance: address,
            admin,
            name,
            notification,
        })
    }

    /// Positional form of [`create_instance`](Self::create_instance)
    pub fn create_fail_safe(
        &self,
        min_delay: Duration,
        name: impl Into<String>,
        admin: Address,
        roles: Vec<RoleId>,
        principals: Vec<Address>,
    ) -> Result<CreationReceipt> {
        self.create_instance(ManagerConfig::new(
            min_delay, name, admin, roles, principals,
        )?)
    }

    /// Handle to an instance this factory created
    pub fn instance(&self, address: &Address) -> Result<SharedManager> {
        self.state
            .lock()
            .instances
            .get(address)
            .cloned()
            .ok_or(ManagerError::UnknownInstance { address: *address })
    }

    /// Number of instances this factory created
    pub fn instance_count(&self) -> usize {
        self.state.lock().instances.len()
    }
}
