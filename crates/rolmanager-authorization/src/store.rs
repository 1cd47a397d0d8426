//! Role membership store
//!
//! The store is a set-valued map from role to principals. Grants and revokes
//! are idempotent; the returned [`RoleChange`] tells the caller whether
//! anything actually changed. Authorization is always checked before any
//! mutation, so a rejected call leaves the store untouched.

use crate::errors::{ManagerError, Result};
use crate::roles::ADMIN_ROLE;
use rolmanager_core::{Address, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Outcome of a grant, revoke or renounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleChange {
    /// Principal newly holds the role
    Granted,
    /// Principal already held the role
    AlreadyHeld,
    /// Principal no longer holds the role
    Revoked,
    /// Principal did not hold the role
    NotHeld,
}

impl RoleChange {
    /// Returns `true` if membership changed
    pub fn is_change(&self) -> bool {
        matches!(self, RoleChange::Granted | RoleChange::Revoked)
    }
}

/// Many-to-many relation between roles and principals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleStore {
    members: BTreeMap<RoleId, BTreeSet<Address>>,
}

impl RoleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `admin` holding ADMIN, then every bootstrap pair
    ///
    /// Duplicate pairs are harmless.
    pub fn bootstrap(admin: Address, pairs: impl IntoIterator<Item = (RoleId, Address)>) -> Self {
        let mut store = Self::new();
        store.insert(ADMIN_ROLE, admin);
        for (role, principal) in pairs {
            store.insert(role, principal);
        }
        store
    }

    /// Membership lookup
    pub fn has_role(&self, role: &RoleId, principal: &Address) -> bool {
        self.members
            .get(role)
            .is_some_and(|holders| holders.contains(principal))
    }

    /// Require `principal` to hold `role`
    pub fn check_role(&self, role: &RoleId, principal: &Address) -> Result<()> {
        if self.has_role(role, principal) {
            Ok(())
        } else {
            Err(ManagerError::unauthorized(*role, *principal))
        }
    }

    /// Require `principal` to hold at least one of `roles`
    ///
    /// The error names the first role in the list.
    pub fn check_any_role(&self, roles: &[RoleId], principal: &Address) -> Result<()> {
        if roles.iter().any(|role| self.has_role(role, principal)) {
            return Ok(());
        }
        let role = roles.first().copied().unwrap_or(ADMIN_ROLE);
        Err(ManagerError::unauthorized(role, *principal))
    }

    /// Grant `role` to `principal`; `caller` must hold ADMIN
    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: RoleId,
        principal: Address,
    ) -> Result<RoleChange> {
        self.check_role(&ADMIN_ROLE, caller)?;
        let change = self.insert(role, principal);
        debug!(%caller, %role, %principal, ?change, "grant_role");
        Ok(change)
    }

    /// Revoke `role` from `principal`; `caller` must hold ADMIN
    ///
    /// Revoking the caller's own ADMIN is allowed.
    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: RoleId,
        principal: Address,
    ) -> Result<RoleChange> {
        self.check_role(&ADMIN_ROLE, caller)?;
        let change = self.remove(&role, &principal);
        debug!(%caller, %role, %principal, ?change, "revoke_role");
        Ok(change)
    }

    /// Drop one of the caller's own roles; needs no ADMIN
    pub fn renounce_role(&mut self, caller: &Address, role: RoleId) -> RoleChange {
        let change = self.remove(&role, caller);
        debug!(%caller, %role, ?change, "renounce_role");
        change
    }

    /// Holders of `role` in address order
    pub fn role_members(&self, role: &RoleId) -> Vec<Address> {
        self.members
            .get(role)
            .map(|holders| holders.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of holders of `role`
    pub fn role_member_count(&self, role: &RoleId) -> usize {
        self.members.get(role).map_or(0, BTreeSet::len)
    }

    /// Roles held by `principal`
    pub fn roles_of(&self, principal: &Address) -> Vec<RoleId> {
        self.members
            .iter()
            .filter(|(_, holders)| holders.contains(principal))
            .map(|(role, _)| *role)
            .collect()
    }

    fn insert(&mut self, role: RoleId, principal: Address) -> RoleChange {
        if self.members.entry(role).or_default().insert(principal) {
            RoleChange::Granted
        } else {
            RoleChange::AlreadyHeld
        }
    }

    fn remove(&mut self, role: &RoleId, principal: &Address) -> RoleChange {
        let Some(holders) = self.members.get_mut(role) else {
            return RoleChange::NotHeld;
        };
        let removed = holders.remove(principal);
        // empty sets are dropped so equality ignores history
        if holders.is_empty() {
            self.members.remove(role);
        }
        if removed {
            RoleChange::Revoked
        } else {
            RoleChange::NotHeld
        }
    }
}
