//! Bond withdrawal flows.
//! Scenarios covered:
//! - creator withdraws a one-way bond (status stays active, type one-way)
//! - each side of a two-way bond withdraws independently
//! - rejection paths: outsider, nothing left, broken bond, foreign profile

#![cfg(test)]

use crate::test_helpers::{self, assert_counters_consistent, STARTING_FUNDS};
use crate::trust_score::BASE_TRUST_SCORE;
use crate::{BondStatus, BondType, Error};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{Address, Env};

#[test]
fn test_withdraw_one_way_by_creator() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let bond_id = s
        .client
        .create_bond(&alice, &alice_id, &Address::generate(&e), &1_000_i128);

    e.ledger().with_mut(|li| li.timestamp = 900);
    let returned = s.client.withdraw_bond(&alice, &bond_id, &alice_id);
    assert_eq!(returned, 1_000);

    let bond = s.client.get_bond(&bond_id);
    assert_eq!(bond.money_by_user_1, 0);
    assert_eq!(bond.bond_status, BondStatus::Active);
    assert_eq!(bond.bond_type, BondType::OneWay);
    assert_eq!(bond.updated_at, 900);

    let profile = s.client.get_profile(&alice_id);
    assert_eq!(profile.active_bonds, 0);
    assert_eq!(profile.withdrawn_bonds, 1);
    assert_eq!(profile.money_in_active_bonds, 0);
    assert_eq!(profile.money_in_withdrawn_bonds, 1_000);
    assert_eq!(profile.trust_score, BASE_TRUST_SCORE);
    assert_eq!(profile.updated_at, 900);
    assert_counters_consistent(&profile);

    assert_eq!(s.token.balance(&alice), STARTING_FUNDS);
    assert_eq!(s.token.balance(&s.contract_id), 0);
}

#[test]
fn test_withdraw_two_way_creator_side_only() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let (bob, bob_id) = test_helpers::user_with_profile(&e, &s, "bob");
    let bond_id = s.client.create_bond(&alice, &alice_id, &bob, &1_000_i128);
    s.client.join_bond(&bob, &bond_id, &bob_id, &400_i128);

    s.client.withdraw_bond(&alice, &bond_id, &alice_id);

    let bond = s.client.get_bond(&bond_id);
    assert_eq!(bond.money_by_user_1, 0);
    assert_eq!(bond.money_by_user_2, 400);
    assert_eq!(bond.bond_type, BondType::OneWay);
    assert_eq!(bond.bond_status, BondStatus::Active);

    let bob_profile = s.client.get_profile(&bob_id);
    assert_eq!(bob_profile.active_bonds, 1);
    assert_eq!(bob_profile.money_in_active_bonds, 400);
    assert_eq!(s.token.balance(&s.contract_id), 400);
}

#[test]
fn test_withdraw_both_sides_independently() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let (bob, bob_id) = test_helpers::user_with_profile(&e, &s, "bob");
    let bond_id = s.client.create_bond(&alice, &alice_id, &bob, &1_000_i128);
    s.client.join_bond(&bob, &bond_id, &bob_id, &400_i128);

    assert_eq!(s.client.withdraw_bond(&bob, &bond_id, &bob_id), 400);
    assert_eq!(s.client.get_bond(&bond_id).money_by_user_1, 1_000);
    assert_eq!(s.client.withdraw_bond(&alice, &bond_id, &alice_id), 1_000);

    let bond = s.client.get_bond(&bond_id);
    assert_eq!(bond.money_by_user_1, 0);
    assert_eq!(bond.money_by_user_2, 0);
    assert_eq!(bond.bond_status, BondStatus::Active);

    for id in [alice_id, bob_id] {
        let profile = s.client.get_profile(&id);
        assert_eq!(profile.active_bonds, 0);
        assert_eq!(profile.withdrawn_bonds, 1);
        assert_counters_consistent(&profile);
    }
    assert_eq!(s.token.balance(&alice), STARTING_FUNDS);
    assert_eq!(s.token.balance(&bob), STARTING_FUNDS);
}

#[test]
fn test_withdraw_twice_rejected() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let bond_id = s
        .client
        .create_bond(&alice, &alice_id, &Address::generate(&e), &1_000_i128);
    s.client.withdraw_bond(&alice, &bond_id, &alice_id);

    assert!(matches!(
        s.client.try_withdraw_bond(&alice, &bond_id, &alice_id),
        Err(Ok(Error::NoContribution))
    ));
}

#[test]
fn test_withdraw_by_unjoined_counterparty_rejected() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let (bob, bob_id) = test_helpers::user_with_profile(&e, &s, "bob");
    let bond_id = s.client.create_bond(&alice, &alice_id, &bob, &1_000_i128);

    assert!(matches!(
        s.client.try_withdraw_bond(&bob, &bond_id, &bob_id),
        Err(Ok(Error::NoContribution))
    ));
}

#[test]
fn test_withdraw_by_outsider_rejected() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let (carol, carol_id) = test_helpers::user_with_profile(&e, &s, "carol");
    let bond_id = s
        .client
        .create_bond(&alice, &alice_id, &Address::generate(&e), &1_000_i128);

    assert!(matches!(
        s.client.try_withdraw_bond(&carol, &bond_id, &carol_id),
        Err(Ok(Error::NotParticipant))
    ));
    assert!(matches!(
        s.client.try_withdraw_bond(&carol, &bond_id, &alice_id),
        Err(Ok(Error::NotProfileOwner))
    ));
}

#[test]
#[should_panic(expected = "Error(Contract, #11)")]
fn test_withdraw_broken_bond_rejected() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let (bob, bob_id) = test_helpers::user_with_profile(&e, &s, "bob");
    let bond_id = s.client.create_bond(&alice, &alice_id, &bob, &1_000_i128);
    s.client.join_bond(&bob, &bond_id, &bob_id, &400_i128);
    s.client.break_bond(&alice, &bond_id, &alice_id);

    s.client.withdraw_bond(&bob, &bond_id, &bob_id);
}
