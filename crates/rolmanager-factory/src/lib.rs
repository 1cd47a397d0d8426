//! # RolManager Factory - Layer 4: Deployment and Discovery
//!
//! The [`Factory`] builds manager instances from a
//! [`ManagerConfig`](rolmanager_core::ManagerConfig), records each one in the
//! [`Registry`] it was constructed with, and then publishes an
//! [`InstanceCreated`] notification. Consumers treat that notification as
//! confirmation that the instance exists and is queryable.

pub mod factory;
pub mod notification;
pub mod registry;

pub use factory::{CreationReceipt, Factory};
pub use notification::{InstanceCreated, NotificationLog, NotificationSink, TracingSink};
pub use registry::{global_registry, Registry, RegistryEntry};
