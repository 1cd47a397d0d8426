//! Creation notifications

use parking_lot::Mutex;
use rolmanager_core::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Published once per successfully created instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceCreated {
    /// New instance address
    pub instance: Address,
    /// Factory that created it
    pub factory: Address,
    /// Principal holding ADMIN on the new instance
    pub admin: Address,
    /// Instance display name
    pub name: String,
}

/// Receiver of creation notifications
pub trait NotificationSink: Send + Sync + fmt::Debug {
    /// Deliver one notification
    fn publish(&self, event: &InstanceCreated);
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&self, event: &InstanceCreated) {
        tracing::info!(
            instance = %event.instance,
            factory = %event.factory,
            admin = %event.admin,
            name = %event.name,
            "InstanceCreated"
        );
    }
}

/// In-memory sink that keeps every notification
#[derive(Debug, Default)]
pub struct NotificationLog {
    events: Mutex<Vec<InstanceCreated>>,
}

impl NotificationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications in publish order
    pub fn events(&self) -> Vec<InstanceCreated> {
        self.events.lock().clone()
    }

    /// Most recent notification
    pub fn last(&self) -> Option<InstanceCreated> {
        self.events.lock().last().cloned()
    }

    /// Notification for `instance`, if published
    pub fn find(&self, instance: &Address) -> Option<InstanceCreated> {
        self.events
            .lock()
            .iter()
            .find(|event| event.instance == *instance)
            .cloned()
    }
}

impl NotificationSink for NotificationLog {
    fn publish(&self, event: &InstanceCreated) {
        TracingSink.publish(event);
        self.events.lock().push(event.clone());
    }
}
