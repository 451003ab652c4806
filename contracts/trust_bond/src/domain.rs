//! Domain verification against an external name registry.
//!
//! The registry is any contract exposing `owner_of(domain) -> Option<Address>`.
//! A registry that fails to answer is treated as "not owned".

use soroban_sdk::{contractclient, Address, Env, String, Symbol};

use crate::DataKey;

#[contractclient(name = "DomainRegistryClient")]
pub trait DomainRegistry {
    /// Current, unexpired owner of `domain`.
    fn owner_of(env: Env, domain: String) -> Option<Address>;
}

#[must_use]
pub fn registry_address(e: &Env) -> Option<Address> {
    e.storage().instance().get(&DataKey::NameService)
}

#[must_use]
pub fn owns_domain(e: &Env, registry: &Address, claimant: &Address, domain: &String) -> bool {
    let client = DomainRegistryClient::new(e, registry);
    match client.try_owner_of(domain) {
        Ok(Ok(Some(owner))) => owner == *claimant,
        _ => false,
    }
}

pub fn emit_verification_skipped(e: &Env, owner: &Address, domain: &String) {
    e.events().publish(
        (Symbol::new(e, "domain_check_skipped"),),
        (owner.clone(), domain.clone()),
    );
}
