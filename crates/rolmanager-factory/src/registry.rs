//! Instance registry
//!
//! Append-only record of every instance a factory created. Only
//! [`Factory`](crate::Factory) writes to a registry, and only after an
//! instance was built successfully; everyone else reads.
//!
//! [`global_registry`] is the process-wide registry. It starts empty when the
//! process starts and is never reset.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rolmanager_core::Address;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One registered instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Instance address
    pub instance: Address,
    /// Factory that created it
    pub factory: Address,
    /// Instance display name
    pub name: String,
}

/// Append-only list of created instances
#[derive(Debug)]
pub struct Registry {
    address: Address,
    entries: RwLock<Vec<RegistryEntry>>,
}

static GLOBAL_REGISTRY: Lazy<Arc<Registry>> =
    Lazy::new(|| Arc::new(Registry::new(Address::from_label("rolmanager/global-registry"))));

/// Process-wide registry shared by factories built with
/// [`Factory::with_global_registry`](crate::Factory::with_global_registry)
pub fn global_registry() -> Arc<Registry> {
    Arc::clone(&GLOBAL_REGISTRY)
}

impl Registry {
    /// Create an empty registry at `address`
    pub fn new(address: Address) -> Self {
        Self {
            address,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Registry address
    pub fn address(&self) -> Address {
        self.address
    }

    pub(crate) fn record(&self, entry: RegistryEntry) {
        tracing::debug!(
            registry = %self.address,
            instance = %entry.instance,
            factory = %entry.factory,
            "instance registered"
        );
        self.entries.write().push(entry);
    }

    /// Number of registered instances
    pub fn instance_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Address of the `index`-th registered instance
    pub fn instance_at(&self, index: usize) -> Option<Address> {
        self.entries.read().get(index).map(|entry| entry.instance)
    }

    /// The `index`-th entry
    pub fn entry_at(&self, index: usize) -> Option<RegistryEntry> {
        self.entries.read().get(index).cloned()
    }

    /// Whether `instance` is registered
    pub fn contains(&self, instance: &Address) -> bool {
        self.entries
            .read()
            .iter()
            .any(|entry| entry.instance == *instance)
    }

    /// Factory that created `instance`
    pub fn factory_of(&self, instance: &Address) -> Option<Address> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.instance == *instance)
            .map(|entry| entry.factory)
    }

    /// All entries in registration order
    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.entries.read().clone()
    }

    /// Instances created by `factory`, in registration order
    pub fn instances_by(&self, factory: &Address) -> Vec<Address> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.factory == *factory)
            .map(|entry| entry.instance)
            .collect()
    }
}
