//! Unified error system for manager operations
//!
//! Every failure the core can report lives in one enum. Callers match on the
//! variant to decide whether to retry, escalate, or abandon; the core itself
//! never retries.

use crate::identifiers::{Address, OperationId, RoleId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unified error type for all manager operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ManagerError {
    /// Caller does not hold the role the call requires
    #[error("Unauthorized: {principal} is missing role {role}")]
    Unauthorized {
        /// Role the call required
        role: RoleId,
        /// Principal that attempted the call
        principal: Address,
    },

    /// Bootstrap role and principal sequences differ in length
    #[error("Length mismatch: {roles} roles but {principals} principals")]
    LengthMismatch {
        /// Number of roles supplied
        roles: usize,
        /// Number of principals supplied
        principals: usize,
    },

    /// Proposed delay is below the instance minimum
    #[error("Insufficient delay: requested {requested:?}, minimum {minimum:?}")]
    InsufficientDelay {
        /// Delay supplied with the proposal
        requested: Duration,
        /// Minimum delay configured for the instance
        minimum: Duration,
    },

    /// Operation identity already has a live or completed record
    #[error("Operation already scheduled: {id}")]
    AlreadyScheduled {
        /// Colliding operation identity
        id: OperationId,
    },

    /// Operation is pending and its ready time has not been reached
    #[error("Operation not ready: {id}")]
    NotReady {
        /// Operation that is still pending
        id: OperationId,
    },

    /// Predecessor operation has not been executed yet
    #[error("Predecessor not done: {predecessor}")]
    PredecessorNotDone {
        /// Predecessor the operation depends on
        predecessor: OperationId,
    },

    /// No live record exists for the operation identity
    #[error("Unknown operation: {id}")]
    UnknownOperation {
        /// Identity that was looked up
        id: OperationId,
    },

    /// Operation has already been executed
    #[error("Operation already done: {id}")]
    AlreadyDone {
        /// Identity of the completed operation
        id: OperationId,
    },

    /// The executed call's effect reported a failure
    #[error("Effect failed: {reason}")]
    EffectFailed {
        /// Failure reported by the call executor
        reason: String,
    },

    /// Delay is not a whole number of seconds
    #[error("Fractional delay: {delay:?} is not a whole number of seconds")]
    FractionalDelay {
        /// Delay that was supplied
        delay: Duration,
    },

    /// Ready time would not fit in a timestamp
    #[error("Delay overflow: {delay:?} past the current time is unrepresentable")]
    DelayOverflow {
        /// Delay that overflowed
        delay: Duration,
    },

    /// Factory has no instance at the address
    #[error("Unknown instance: {address}")]
    UnknownInstance {
        /// Address that was looked up
        address: Address,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },
}

impl ManagerError {
    /// Create an unauthorized error
    pub fn unauthorized(role: RoleId, principal: Address) -> Self {
        Self::Unauthorized { role, principal }
    }

    /// Create an effect failure error
    pub fn effect_failed(reason: impl Into<String>) -> Self {
        Self::EffectFailed {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Short stable name of the variant, used in logs and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "Unauthorized",
            Self::LengthMismatch { .. } => "LengthMismatch",
            Self::InsufficientDelay { .. } => "InsufficientDelay",
            Self::AlreadyScheduled { .. } => "AlreadyScheduled",
            Self::NotReady { .. } => "NotReady",
            Self::PredecessorNotDone { .. } => "PredecessorNotDone",
            Self::UnknownOperation { .. } => "UnknownOperation",
            Self::AlreadyDone { .. } => "AlreadyDone",
            Self::EffectFailed { .. } => "EffectFailed",
            Self::FractionalDelay { .. } => "FractionalDelay",
            Self::DelayOverflow { .. } => "DelayOverflow",
            Self::UnknownInstance { .. } => "UnknownInstance",
            Self::Config { .. } => "Config",
        }
    }
}

/// Standard Result type for manager operations
pub type Result<T> = std::result::Result<T, ManagerError>;

impl From<std::io::Error> for ManagerError {
    fn from(err: std::io::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::de::Error> for ManagerError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Invalid TOML: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ManagerError::LengthMismatch {
            roles: 3,
            principals: 2,
        };
        assert_eq!(err.to_string(), "Length mismatch: 3 roles but 2 principals");
        assert_eq!(err.kind(), "LengthMismatch");
    }

    #[test]
    fn test_unauthorized_names_role_and_principal() {
        let role = RoleId::from_name("PROPOSER_ROLE");
        let principal = Address::from_label("mallory");
        let message = ManagerError::unauthorized(role, principal).to_string();
        assert!(message.contains(&principal.to_string()));
        assert!(message.contains(&role.to_string()));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
        let err = ManagerError::from(io_err);
        assert!(matches!(err, ManagerError::Config { .. }));
    }
}
