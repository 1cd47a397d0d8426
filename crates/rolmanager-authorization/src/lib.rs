//! # RolManager Authorization - Layer 2: Role Store
//!
//! Role-gated authorization for manager instances. Membership is an explicit
//! many-to-many relation between [`RoleId`](rolmanager_core::RoleId) and
//! [`Address`](rolmanager_core::Address); there is no role hierarchy except
//! that ADMIN alone may grant and revoke.

pub mod errors;
pub mod roles;
pub mod store;

pub use roles::{WellKnownRole, ADMIN_ROLE, CANCELER_ROLE, EXECUTOR_ROLE, PROPOSER_ROLE};
pub use store::{RoleChange, RoleStore};
