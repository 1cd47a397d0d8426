//! # RolManager Engine - Layer 3: Schedule Engine and Manager Instances
//!
//! The propose → delay → execute/cancel state machine, and the
//! [`ManagerInstance`] that binds it to one role store and one ledger.
//!
//! All calls against an instance are totally ordered: `ManagerInstance`
//! takes `&mut self` for every mutation, and [`SharedManager`] serializes
//! callers behind one lock, so each call's role checks, ledger reads and
//! ledger writes are atomic with respect to every other call.

pub mod engine;
pub mod executor;
pub mod instance;
pub mod operation;
pub mod shared;

pub use engine::{ExecutionReceipt, ScheduleEngine, ScheduledOperation};
pub use executor::{CallExecutor, NoopExecutor, RecordingExecutor};
pub use instance::ManagerInstance;
pub use operation::Operation;
pub use shared::SharedManager;

pub use rolmanager_journal::{Call, OperationState};
