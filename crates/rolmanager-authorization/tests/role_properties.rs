//! Property tests for role grant/revoke semantics.

#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]

use proptest::prelude::*;
use rolmanager_authorization::{RoleChange, RoleStore, ADMIN_ROLE};
use rolmanager_core::{Address, RoleId};

fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

fn arb_role() -> impl Strategy<Value = RoleId> {
    prop_oneof![
        Just(rolmanager_authorization::PROPOSER_ROLE),
        Just(rolmanager_authorization::EXECUTOR_ROLE),
        Just(rolmanager_authorization::CANCELER_ROLE),
        any::<[u8; 32]>().prop_map(RoleId::from_bytes),
    ]
}

proptest! {
    #[test]
    fn grant_then_revoke_round_trips_membership(role in arb_role(), principal in arb_address()) {
        let admin = Address::from_label("admin");
        prop_assume!(principal != admin);
        let mut store = RoleStore::bootstrap(admin, []);

        store.grant_role(&admin, role, principal).unwrap();
        prop_assert!(store.has_role(&role, &principal));

        store.revoke_role(&admin, role, principal).unwrap();
        prop_assert!(!store.has_role(&role, &principal));
    }

    #[test]
    fn repeated_grant_changes_nothing(
        pairs in proptest::collection::vec((arb_role(), arb_address()), 0..12),
        role in arb_role(),
        principal in arb_address(),
    ) {
        let admin = Address::from_label("admin");
        let mut store = RoleStore::bootstrap(admin, pairs);
        store.grant_role(&admin, role, principal).unwrap();
        let snapshot = store.clone();

        let change = store.grant_role(&admin, role, principal).unwrap();
        prop_assert_eq!(change, RoleChange::AlreadyHeld);
        prop_assert_eq!(store, snapshot);
    }

    #[test]
    fn revoking_absent_role_changes_nothing(
        pairs in proptest::collection::vec((arb_role(), arb_address()), 0..12),
        role in arb_role(),
        principal in arb_address(),
    ) {
        let admin = Address::from_label("admin");
        let mut store = RoleStore::bootstrap(admin, pairs);
        prop_assume!(!store.has_role(&role, &principal));
        let snapshot = store.clone();

        let change = store.revoke_role(&admin, role, principal).unwrap();
        prop_assert_eq!(change, RoleChange::NotHeld);
        prop_assert_eq!(store, snapshot);
    }

    #[test]
    fn non_admin_never_mutates(
        caller in arb_address(),
        role in arb_role(),
        principal in arb_address(),
    ) {
        let admin = Address::from_label("admin");
        prop_assume!(caller != admin);
        let mut store = RoleStore::bootstrap(admin, []);
        let snapshot = store.clone();

        prop_assert!(store.grant_role(&caller, role, principal).is_err());
        prop_assert!(store.revoke_role(&caller, ADMIN_ROLE, admin).is_err());
        prop_assert_eq!(store, snapshot);
    }
}
