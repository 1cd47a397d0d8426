//! RolManager CLI Library
//!
//! Command handlers behind the `rolmanager` binary, kept in a library so the
//! scenario runner can be driven from tests.

/// Command handlers
pub mod commands;
