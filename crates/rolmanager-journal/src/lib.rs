//! # RolManager Journal - Layer 2: Operation Ledger
//!
//! Lifecycle records for scheduled operations, keyed by a content-derived
//! identity.
//!
//! # Operation Lifecycle
//!
//! ```text
//! Unset ──record_pending──▶ Pending ──(now ≥ ready_at)──▶ Ready ──mark_done──▶ Done
//!   ▲                          │                            │
//!   └────────────cancel────────┴────────────cancel──────────┘
//! ```
//!
//! `Ready` is never stored: it is `Pending` observed at or after `ready_at`.
//! Cancelling removes the record, which returns the identity to `Unset`.

pub mod identity;
pub mod ledger;
pub mod record;

pub use identity::{batch_identity_of, identity_of, payload_digest, Call};
pub use ledger::OperationLedger;
pub use record::{OperationRecord, OperationState};
