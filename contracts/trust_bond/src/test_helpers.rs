//! Shared setup for the contract test modules.

#![cfg(test)]

use crate::{TrustBondContract, TrustBondContractClient, TrustProfile};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{token, Address, Env, String};

pub(crate) const STARTING_FUNDS: i128 = 100_000_000;

pub(crate) struct Setup<'a> {
    pub client: TrustBondContractClient<'a>,
    pub token: token::Client<'a>,
    pub token_admin: token::StellarAssetClient<'a>,
    pub admin: Address,
    pub contract_id: Address,
}

/// Registers a bond token and an initialized trust contract without a
/// domain registry.
pub(crate) fn setup(e: &Env) -> Setup<'_> {
    e.mock_all_auths();
    let admin = Address::generate(e);
    let token_id = e
        .register_stellar_asset_contract_v2(admin.clone())
        .address();
    let contract_id = e.register(TrustBondContract, ());
    let client = TrustBondContractClient::new(e, &contract_id);
    client.initialize(&admin, &token_id, &None);
    Setup {
        client,
        token: token::Client::new(e, &token_id),
        token_admin: token::StellarAssetClient::new(e, &token_id),
        admin,
        contract_id,
    }
}

pub(crate) fn funded_user(e: &Env, s: &Setup<'_>, amount: i128) -> Address {
    let user = Address::generate(e);
    if amount > 0 {
        s.token_admin.mint(&user, &amount);
    }
    user
}

/// A funded user with a fresh profile. Returns (address, profile id).
pub(crate) fn user_with_profile(e: &Env, s: &Setup<'_>, name: &str) -> (Address, u64) {
    let user = funded_user(e, s, STARTING_FUNDS);
    let id = s
        .client
        .create_trust_profile(&user, &String::from_str(e, name), &false);
    (user, id)
}

pub(crate) fn assert_counters_consistent(profile: &TrustProfile) {
    assert_eq!(
        profile.total_bonds,
        profile.active_bonds + profile.withdrawn_bonds + profile.broken_bonds,
        "bond counters out of balance for profile {}",
        profile.id
    );
    assert!(profile.counters_consistent());
}
