//! Domain verification against the name registry contract.

#![cfg(test)]

use crate::test_helpers::{self, Setup};
use crate::Error;
use name_service::{NameRegistry, NameRegistryClient};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{Address, Env, String};

fn with_registry(e: &Env) -> (Setup<'_>, NameRegistryClient<'_>) {
    let s = test_helpers::setup(e);
    let registry_id = e.register(NameRegistry, ());
    let registry = NameRegistryClient::new(e, &registry_id);
    registry.initialize(&s.admin);
    s.client.set_name_service(&s.admin, &Some(registry_id));
    (s, registry)
}

#[test]
fn test_verify_domain_owner() {
    let e = Env::default();
    let (s, registry) = with_registry(&e);
    let alice = Address::generate(&e);
    let bob = Address::generate(&e);
    let domain = String::from_str(&e, "alice.xlm");
    registry.register(&alice, &domain, &10_000);

    assert!(s.client.verify_domain(&alice, &domain));
    assert!(!s.client.verify_domain(&bob, &domain));
    assert!(!s.client.verify_domain(&alice, &String::from_str(&e, "other.xlm")));
}

#[test]
fn test_verify_domain_without_registry_is_false() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    assert!(!s
        .client
        .verify_domain(&Address::generate(&e), &String::from_str(&e, "alice.xlm")));
}

#[test]
fn test_verify_domain_honours_expiry() {
    let e = Env::default();
    let (s, registry) = with_registry(&e);
    let alice = Address::generate(&e);
    let domain = String::from_str(&e, "alice.xlm");
    registry.register(&alice, &domain, &100);

    assert!(s.client.verify_domain(&alice, &domain));
    e.ledger().with_mut(|li| li.timestamp = 100);
    assert!(!s.client.verify_domain(&alice, &domain));
}

#[test]
fn test_verified_profile_creation() {
    let e = Env::default();
    let (s, registry) = with_registry(&e);
    let alice = Address::generate(&e);
    let domain = String::from_str(&e, "alice.xlm");
    registry.register(&alice, &domain, &10_000);

    let id = s.client.create_trust_profile(&alice, &domain, &true);
    assert_eq!(s.client.get_profile(&id).name, domain);
}

#[test]
fn test_verified_profile_creation_rejects_foreign_domain() {
    let e = Env::default();
    let (s, registry) = with_registry(&e);
    let alice = Address::generate(&e);
    let mallory = Address::generate(&e);
    let domain = String::from_str(&e, "alice.xlm");
    registry.register(&alice, &domain, &10_000);

    assert!(matches!(
        s.client.try_create_trust_profile(&mallory, &domain, &true),
        Err(Ok(Error::DomainNotOwned))
    ));
    assert!(!s.client.has_trust_profile(&mallory));

    // Without verification the same name is accepted.
    s.client.create_trust_profile(&mallory, &domain, &false);
    assert!(s.client.has_trust_profile(&mallory));
}

#[test]
fn test_unreachable_registry_reads_as_not_owned() {
    let e = Env::default();
    let s = test_helpers::setup(&e);
    // An address with no contract behind it.
    s.client
        .set_name_service(&s.admin, &Some(Address::generate(&e)));
    let alice = Address::generate(&e);

    assert!(!s
        .client
        .verify_domain(&alice, &String::from_str(&e, "alice.xlm")));
}
