//! Breaking bonds: forfeiture, counterparty refund, trust score penalty.

#![cfg(test)]

use crate::test_helpers::{self, assert_counters_consistent, STARTING_FUNDS};
use crate::trust_score::{BASE_TRUST_SCORE, BREAK_PENALTY, JOIN_REWARD};
use crate::{BondStatus, Error};
use soroban_sdk::testutils::{Address as _, Events};
use soroban_sdk::{vec, Address, Env, IntoVal, Symbol, TryFromVal, Val, Vec};

#[test]
fn test_break_by_counterparty() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let (bob, bob_id) = test_helpers::user_with_profile(&e, &s, "bob");
    let bond_id = s.client.create_bond(&alice, &alice_id, &bob, &1_000_i128);
    s.client.join_bond(&bob, &bond_id, &bob_id, &2_000_i128);

    s.client.break_bond(&bob, &bond_id, &bob_id);

    let bond = s.client.get_bond(&bond_id);
    assert_eq!(bond.bond_status, BondStatus::Broken);
    assert_eq!(bond.money_by_user_1, 0);
    assert_eq!(bond.money_by_user_2, 0);

    let bob_profile = s.client.get_profile(&bob_id);
    assert_eq!(
        bob_profile.trust_score,
        BASE_TRUST_SCORE + JOIN_REWARD - BREAK_PENALTY
    );
    assert_eq!(bob_profile.active_bonds, 0);
    assert_eq!(bob_profile.broken_bonds, 1);
    assert_eq!(bob_profile.money_in_active_bonds, 0);
    assert_eq!(bob_profile.money_in_broken_bonds, 2_000);
    assert_counters_consistent(&bob_profile);

    // Alice gets her own stake back plus Bob's forfeited stake.
    let alice_profile = s.client.get_profile(&alice_id);
    assert_eq!(alice_profile.trust_score, BASE_TRUST_SCORE);
    assert_eq!(alice_profile.active_bonds, 0);
    assert_eq!(alice_profile.withdrawn_bonds, 1);
    assert_eq!(alice_profile.money_in_withdrawn_bonds, 1_000);
    assert_counters_consistent(&alice_profile);

    assert_eq!(s.token.balance(&alice), STARTING_FUNDS + 2_000);
    assert_eq!(s.token.balance(&bob), STARTING_FUNDS - 2_000);
    assert_eq!(s.token.balance(&s.contract_id), 0);
}

#[test]
fn test_break_one_way_by_creator_forfeits_to_counterparty() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let bob = Address::generate(&e);
    let bond_id = s.client.create_bond(&alice, &alice_id, &bob, &1_000_i128);

    s.client.break_bond(&alice, &bond_id, &alice_id);

    let profile = s.client.get_profile(&alice_id);
    assert_eq!(profile.trust_score, BASE_TRUST_SCORE - BREAK_PENALTY);
    assert_eq!(profile.broken_bonds, 1);
    assert_eq!(profile.money_in_broken_bonds, 1_000);
    assert_counters_consistent(&profile);
    assert_eq!(s.token.balance(&bob), 1_000);
    assert!(!s.client.has_trust_profile(&bob));
}

#[test]
fn test_break_twice_rejected() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let bond_id = s
        .client
        .create_bond(&alice, &alice_id, &Address::generate(&e), &1_000_i128);
    s.client.break_bond(&alice, &bond_id, &alice_id);

    assert!(matches!(
        s.client.try_break_bond(&alice, &bond_id, &alice_id),
        Err(Ok(Error::BondNotActive))
    ));
    assert_eq!(
        s.client.get_trust_score(&alice_id),
        BASE_TRUST_SCORE - BREAK_PENALTY
    );
}

#[test]
fn test_break_without_contribution_rejected() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let (bob, bob_id) = test_helpers::user_with_profile(&e, &s, "bob");
    let bond_id = s.client.create_bond(&alice, &alice_id, &bob, &1_000_i128);

    assert!(matches!(
        s.client.try_break_bond(&bob, &bond_id, &bob_id),
        Err(Ok(Error::NoContribution))
    ));
    assert_eq!(s.client.get_trust_score(&bob_id), BASE_TRUST_SCORE);
    assert_eq!(s.client.get_bond(&bond_id).bond_status, BondStatus::Active);
}

#[test]
fn test_break_by_outsider_rejected() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let (carol, carol_id) = test_helpers::user_with_profile(&e, &s, "carol");
    let bond_id = s
        .client
        .create_bond(&alice, &alice_id, &Address::generate(&e), &1_000_i128);

    assert!(matches!(
        s.client.try_break_bond(&carol, &bond_id, &carol_id),
        Err(Ok(Error::NotParticipant))
    ));
}

#[test]
fn test_score_can_go_negative() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");

    for _ in 0..3 {
        let bond_id = s
            .client
            .create_bond(&alice, &alice_id, &Address::generate(&e), &10_i128);
        s.client.break_bond(&alice, &bond_id, &alice_id);
    }

    let profile = s.client.get_profile(&alice_id);
    assert_eq!(profile.trust_score, BASE_TRUST_SCORE - 3 * BREAK_PENALTY);
    assert!(profile.trust_score < 0);
    assert_eq!(profile.broken_bonds, 3);
    assert_counters_consistent(&profile);
}

#[test]
fn test_break_emits_events() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    let (alice, alice_id) = test_helpers::user_with_profile(&e, &s, "alice");
    let other = Address::generate(&e);
    let bond_id = s.client.create_bond(&alice, &alice_id, &other, &1_000_i128);

    s.client.break_bond(&alice, &bond_id, &alice_id);
    let events = e.events().all();

    let broken_topics: Vec<Val> =
        vec![&e, Symbol::new(&e, "bond_broken").into_val(&e), bond_id.into_val(&e)];
    let broken = events
        .iter()
        .find(|(contract, topics, _)| *contract == s.contract_id && *topics == broken_topics)
        .expect("bond_broken event");
    let (by, counterparty, forfeited, returned) =
        <(Address, Address, i128, i128)>::try_from_val(&e, &broken.2).unwrap();
    assert_eq!(by, alice);
    assert_eq!(counterparty, other);
    assert_eq!(forfeited, 1_000);
    assert_eq!(returned, 0);

    let changed_topics: Vec<Val> = vec![
        &e,
        Symbol::new(&e, "trust_score_changed").into_val(&e),
        alice_id.into_val(&e),
    ];
    let changed = events
        .iter()
        .find(|(contract, topics, _)| *contract == s.contract_id && *topics == changed_topics)
        .expect("trust_score_changed event");
    let (owner, old_score, new_score) =
        <(Address, i64, i64)>::try_from_val(&e, &changed.2).unwrap();
    assert_eq!(owner, alice);
    assert_eq!(old_score, BASE_TRUST_SCORE);
    assert_eq!(new_score, BASE_TRUST_SCORE - BREAK_PENALTY);
}
