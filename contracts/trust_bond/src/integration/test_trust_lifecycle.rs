//! Integration tests covering the full trust lifecycle across two users:
//! profile creation, bond creation, join, withdraw and break, with the
//! counter invariant and token conservation checked after every step.

#![cfg(test)]

use crate::test_helpers::{self, assert_counters_consistent, Setup, STARTING_FUNDS};
use crate::{BondStatus, BondType, TrustBondContractClient};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{Address, Env};

fn assert_conserved(s: &Setup<'_>, client: &TrustBondContractClient<'_>) {
    let mut locked = 0_i128;
    for id in 1..=client.get_bond_count() {
        let bond = client.get_bond(&id);
        locked += bond.money_by_user_1 + bond.money_by_user_2;
    }
    assert_eq!(s.token.balance(&s.contract_id), locked);
}

fn assert_profiles_consistent(client: &TrustBondContractClient<'_>) {
    for id in 1..=client.get_profile_count() {
        assert_counters_consistent(&client.get_profile(&id));
    }
}

/// Profile at 100, join as user_2 with 2 units -> 110, break as user_2 -> 60.
#[test]
fn test_join_then_break_trust_score_path() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (user_1, profile_1) = test_helpers::user_with_profile(&e, &s, "user1");
    let (user_2, profile_2) = test_helpers::user_with_profile(&e, &s, "user2");
    assert_eq!(s.client.get_trust_score(&profile_2), 100);

    let bond_id = s
        .client
        .create_bond(&user_1, &profile_1, &user_2, &100_000_i128);
    s.client
        .join_bond(&user_2, &bond_id, &profile_2, &20_000_000_i128);
    assert_eq!(s.client.get_trust_score(&profile_2), 110);
    assert_conserved(&s, &s.client);

    s.client.break_bond(&user_2, &bond_id, &profile_2);
    assert_eq!(s.client.get_trust_score(&profile_2), 60);
    assert_eq!(s.client.get_bond(&bond_id).bond_status, BondStatus::Broken);
    assert_conserved(&s, &s.client);
    assert_profiles_consistent(&s.client);
}

#[test]
fn test_lifecycle_many_bonds() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let (bob, bob_id) = test_helpers::user_with_profile(&e, &s, "bob");
    let carol = Address::generate(&e);

    e.ledger().with_mut(|li| li.timestamp = 10);
    let b1 = s.client.create_bond(&alice, &alice_id, &bob, &1_000_i128);
    let b2 = s.client.create_bond(&alice, &alice_id, &carol, &2_000_i128);
    let b3 = s.client.create_bond(&bob, &bob_id, &alice, &3_000_i128);
    assert_conserved(&s, &s.client);
    assert_profiles_consistent(&s.client);

    e.ledger().with_mut(|li| li.timestamp = 20);
    s.client.join_bond(&bob, &b1, &bob_id, &500_i128);
    s.client.join_bond(&alice, &b3, &alice_id, &700_i128);
    assert_eq!(s.client.get_bond(&b1).bond_type, BondType::TwoWay);
    assert_eq!(s.client.get_bond(&b3).bond_type, BondType::TwoWay);
    assert_conserved(&s, &s.client);
    assert_profiles_consistent(&s.client);

    e.ledger().with_mut(|li| li.timestamp = 30);
    s.client.withdraw_bond(&alice, &b2, &alice_id);
    s.client.break_bond(&bob, &b1, &bob_id);
    s.client.withdraw_bond(&alice, &b3, &alice_id);
    assert_conserved(&s, &s.client);
    assert_profiles_consistent(&s.client);

    let alice_profile = s.client.get_profile(&alice_id);
    assert_eq!(alice_profile.total_bonds, 3);
    assert_eq!(alice_profile.active_bonds, 0);
    assert_eq!(alice_profile.withdrawn_bonds, 3);
    assert_eq!(alice_profile.trust_score, 110);
    assert_eq!(alice_profile.updated_at, 30);

    let bob_profile = s.client.get_profile(&bob_id);
    assert_eq!(bob_profile.total_bonds, 2);
    assert_eq!(bob_profile.active_bonds, 1);
    assert_eq!(bob_profile.broken_bonds, 1);
    assert_eq!(bob_profile.trust_score, 60);

    assert_eq!(s.token.balance(&carol), 0);
    assert_eq!(
        s.token.balance(&alice) + s.token.balance(&bob) + s.token.balance(&s.contract_id),
        2 * STARTING_FUNDS
    );
}

#[test]
fn test_timestamps_never_decrease() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    e.ledger().with_mut(|li| li.timestamp = 100);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let bond_id = s
        .client
        .create_bond(&alice, &alice_id, &Address::generate(&e), &1_000_i128);

    e.ledger().with_mut(|li| li.timestamp = 200);
    s.client.withdraw_bond(&alice, &bond_id, &alice_id);

    let profile = s.client.get_profile(&alice_id);
    let bond = s.client.get_bond(&bond_id);
    assert_eq!(profile.created_at, 100);
    assert_eq!(profile.updated_at, 200);
    assert_eq!(bond.created_at, 100);
    assert_eq!(bond.updated_at, 200);
    assert!(profile.updated_at >= profile.created_at);
}
