// Command modules for CLI

/// Role and operation identity helpers
pub mod ids;

/// Scripted lifecycle scenarios
pub mod scenario;
