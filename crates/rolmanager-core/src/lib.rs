//! RolManager Core - Layer 1: Foundation Types
//!
//! Pure building blocks shared by every manager crate. Nothing in this crate
//! knows about roles, ledgers or schedules; it only provides the vocabulary
//! those layers are written in.
//!
//! # Contents
//!
//! - [`identifiers`]: `Address`, `RoleId`, `OperationId`, `Salt`
//! - [`hash`]: the single place the digest algorithm is chosen
//! - [`time`]: synchronous clocks (`SystemClock`, `SimulatedClock`)
//! - [`errors`]: the unified `ManagerError` taxonomy
//! - [`config`]: `ManagerConfig` and the TOML-backed `RuntimeConfig`

#![forbid(unsafe_code)]

/// Manager and runtime configuration
pub mod config;

/// Unified error handling
pub mod errors;

/// Pure synchronous hashing for content identity
pub mod hash;

/// Address, role, operation and salt identifiers
pub mod identifiers;

/// Timestamps and clocks
pub mod time;

pub use config::{ClockConfig, ManagerConfig, RuntimeConfig};
pub use errors::{ManagerError, Result};
pub use identifiers::{Address, OperationId, RoleId, Salt};
pub use time::{whole_seconds, Clock, SimulatedClock, SystemClock, Timestamp};
