//! Well-known roles
//!
//! Every manager reserves four roles. Their identifiers are the Keccak-256
//! digests of their names and are stable across instances, so clients can
//! hard-code them.

use rolmanager_core::RoleId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// keccak256("ROLMANAGER_ADMIN_ROLE")
pub const ADMIN_ROLE: RoleId = RoleId::from_bytes([
    0x95, 0xc6, 0x35, 0x04, 0x5b, 0xa2, 0xff, 0x79, 0xd7, 0x17, 0xac, 0x18, 0x15, 0x07, 0x47, 0x71,
    0xbd, 0xf7, 0xfd, 0xdb, 0x40, 0x21, 0x74, 0x15, 0xc4, 0x77, 0xa5, 0xdc, 0x34, 0x18, 0x9c, 0xb5,
]);

/// keccak256("PROPOSER_ROLE")
pub const PROPOSER_ROLE: RoleId = RoleId::from_bytes([
    0xb0, 0x9a, 0xa5, 0xae, 0xb3, 0x70, 0x2c, 0xfd, 0x50, 0xb6, 0xb6, 0x2b, 0xc4, 0x53, 0x26, 0x04,
    0x93, 0x8f, 0x21, 0x24, 0x8a, 0x27, 0xa1, 0xd5, 0xca, 0x73, 0x60, 0x82, 0xb6, 0x81, 0x9c, 0xc1,
]);

/// keccak256("EXECUTOR_ROLE")
pub const EXECUTOR_ROLE: RoleId = RoleId::from_bytes([
    0xd8, 0xaa, 0x0f, 0x31, 0x94, 0x97, 0x1a, 0x2a, 0x11, 0x66, 0x79, 0xf7, 0xc2, 0x09, 0x0f, 0x69,
    0x39, 0xc8, 0xd4, 0xe0, 0x1a, 0x2a, 0x8d, 0x7e, 0x41, 0xd5, 0x5e, 0x53, 0x51, 0x46, 0x9e, 0x63,
]);

/// keccak256("CANCELER_ROLE")
pub const CANCELER_ROLE: RoleId = RoleId::from_bytes([
    0xeb, 0xfd, 0xca, 0x8e, 0x46, 0xc0, 0xb8, 0xda, 0xcf, 0x99, 0x89, 0xee, 0x61, 0x3e, 0x35, 0x72,
    0x7e, 0xad, 0xd2, 0x0a, 0x1d, 0x5e, 0x5a, 0xd0, 0x1a, 0x53, 0x96, 0x8c, 0x7e, 0x5f, 0xe0, 0x7a,
]);

/// The four roles reserved by every manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellKnownRole {
    /// May grant and revoke any role, and cancel
    Admin,
    /// May propose operations
    Proposer,
    /// May execute ready operations
    Executor,
    /// May cancel pending operations
    Canceler,
}

impl WellKnownRole {
    /// All well-known roles
    pub const ALL: [WellKnownRole; 4] = [
        WellKnownRole::Admin,
        WellKnownRole::Proposer,
        WellKnownRole::Executor,
        WellKnownRole::Canceler,
    ];

    /// Name whose digest is the role identifier
    pub fn name(&self) -> &'static str {
        match self {
            WellKnownRole::Admin => "ROLMANAGER_ADMIN_ROLE",
            WellKnownRole::Proposer => "PROPOSER_ROLE",
            WellKnownRole::Executor => "EXECUTOR_ROLE",
            WellKnownRole::Canceler => "CANCELER_ROLE",
        }
    }

    /// Role identifier
    pub fn id(&self) -> RoleId {
        match self {
            WellKnownRole::Admin => ADMIN_ROLE,
            WellKnownRole::Proposer => PROPOSER_ROLE,
            WellKnownRole::Executor => EXECUTOR_ROLE,
            WellKnownRole::Canceler => CANCELER_ROLE,
        }
    }

    /// Reverse lookup from an identifier
    pub fn from_id(id: &RoleId) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == *id)
    }
}

impl fmt::Display for WellKnownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for WellKnownRole {
    type Err = String;

    /// Accepts short names (`proposer`) and full names (`PROPOSER_ROLE`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" | "rolmanager_admin_role" => Ok(WellKnownRole::Admin),
            "proposer" | "proposer_role" => Ok(WellKnownRole::Proposer),
            "executor" | "executor_role" => Ok(WellKnownRole::Executor),
            "canceler" | "canceler_role" => Ok(WellKnownRole::Canceler),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

impl From<WellKnownRole> for RoleId {
    fn from(role: WellKnownRole) -> Self {
        role.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_match_name_digests() {
        for role in WellKnownRole::ALL {
            assert_eq!(role.id(), RoleId::from_name(role.name()), "{role}");
        }
    }

    #[test]
    fn test_constants_match_published_hex() {
        let published = [
            (
                PROPOSER_ROLE,
                "0xb09aa5aeb3702cfd50b6b62bc4532604938f21248a27a1d5ca736082b6819cc1",
            ),
            (
                EXECUTOR_ROLE,
                "0xd8aa0f3194971a2a116679f7c2090f6939c8d4e01a2a8d7e41d55e5351469e63",
            ),
            (
                CANCELER_ROLE,
                "0xebfdca8e46c0b8dacf9989ee613e35727eadd20a1d5e5ad01a53968c7e5fe07a",
            ),
        ];
        for (role, hex) in published {
            assert_eq!(hex.parse::<RoleId>(), Ok(role));
        }
    }

    #[test]
    fn test_constants_are_distinct() {
        let ids: std::collections::HashSet<_> =
            WellKnownRole::ALL.iter().map(WellKnownRole::id).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_parse_short_and_full_names() {
        assert_eq!("proposer".parse(), Ok(WellKnownRole::Proposer));
        assert_eq!("CANCELER_ROLE".parse(), Ok(WellKnownRole::Canceler));
        assert!("auditor".parse::<WellKnownRole>().is_err());
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(
            WellKnownRole::from_id(&EXECUTOR_ROLE),
            Some(WellKnownRole::Executor)
        );
        assert_eq!(WellKnownRole::from_id(&RoleId::from_name("AUDITOR")), None);
    }
}
