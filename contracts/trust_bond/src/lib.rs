#![no_std]

//! # Trust Bond Contract
//!
//! Trust profiles and pairwise trust bonds. Each address owns at most one
//! profile carrying a trust score and bond statistics. A bond escrows funds
//! contributed by its creator and, optionally, by the designated counterparty.
//! Bonds can be withdrawn (funds returned) or broken (funds forfeited to the
//! counterparty, trust score penalty for the breaker).

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, Address, Env, IntoVal, String, Symbol,
    Val,
};

pub mod domain;
pub mod escrow;
pub mod registry;
pub mod trust_score;
pub mod types;

pub use types::{BondStatus, BondType, TrustBond, TrustProfile};

/// Persistent entries are bumped to this many ledgers when they drop below the threshold.
pub(crate) const OBJECT_TTL_THRESHOLD: u32 = 518_400; // ~30 days
pub(crate) const OBJECT_TTL_EXTEND: u32 = 2_592_000; // ~150 days

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    /// Asset bonds are paid in.
    Token,
    /// Domain registry used by `verify_domain`. Absent when unsupported.
    NameService,
    ProfileCounter,
    BondCounter,
    Profile(u64),
    /// Registry index: owner -> profile id.
    ProfileOf(Address),
    Bond(u64),
}

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    ProfileAlreadyExists = 3,
    ProfileNotFound = 4,
    BondNotFound = 5,
    NotProfileOwner = 6,
    InvalidAmount = 7,
    InvalidName = 8,
    SelfBond = 9,
    InsufficientFunds = 10,
    BondNotActive = 11,
    NotCounterparty = 12,
    AlreadyJoined = 13,
    NothingToJoin = 14,
    NotParticipant = 15,
    NoContribution = 16,
    DomainNotOwned = 17,
    ArithmeticOverflow = 18,
    Unauthorized = 19,
}

/// Contract configuration as set by `initialize`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub admin: Address,
    pub token: Address,
    pub name_service: Option<Address>,
}

pub(crate) fn bump<K>(e: &Env, key: &K)
where
    K: IntoVal<Env, Val>,
{
    e.storage()
        .persistent()
        .extend_ttl(key, OBJECT_TTL_THRESHOLD, OBJECT_TTL_EXTEND);
}

fn require_initialized(e: &Env) -> Result<(), Error> {
    if e.storage().instance().has(&DataKey::Admin) {
        Ok(())
    } else {
        Err(Error::NotInitialized)
    }
}

#[contract]
pub struct TrustBondContract;

#[contractimpl]
impl TrustBondContract {
    /// Initialize the contract.
    /// @param admin Address allowed to reconfigure the name service
    /// @param token Asset that bond contributions are paid in
    /// @param name_service Optional domain registry for profile verification
    pub fn initialize(
        e: Env,
        admin: Address,
        token: Address,
        name_service: Option<Address>,
    ) -> Result<(), Error> {
        if e.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        e.storage().instance().set(&DataKey::Admin, &admin);
        e.storage().instance().set(&DataKey::Token, &token);
        if let Some(registry) = &name_service {
            e.storage().instance().set(&DataKey::NameService, registry);
        }
        e.storage().instance().set(&DataKey::ProfileCounter, &0_u64);
        e.storage().instance().set(&DataKey::BondCounter, &0_u64);
        e.events()
            .publish((Symbol::new(&e, "trust_initialized"),), (admin, token));
        Ok(())
    }

    /// Replace (or clear) the domain registry. Admin only.
    pub fn set_name_service(
        e: Env,
        caller: Address,
        name_service: Option<Address>,
    ) -> Result<(), Error> {
        caller.require_auth();
        let admin: Address = e
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        if caller != admin {
            return Err(Error::Unauthorized);
        }
        match &name_service {
            Some(registry) => e.storage().instance().set(&DataKey::NameService, registry),
            None => e.storage().instance().remove(&DataKey::NameService),
        }
        e.events()
            .publish((Symbol::new(&e, "name_service_updated"),), name_service);
        Ok(())
    }

    pub fn get_config(e: Env) -> Result<Config, Error> {
        let admin: Address = e
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        Ok(Config {
            admin,
            token: escrow::token_address(&e)?,
            name_service: domain::registry_address(&e),
        })
    }

    // ------------------------------------------------------------------
    // Profile registry
    // ------------------------------------------------------------------

    /// Create the caller's trust profile. When `verify_domain` is set and a
    /// domain registry is configured, `name` must be a domain the owner holds.
    pub fn create_trust_profile(
        e: Env,
        owner: Address,
        name: String,
        verify_domain: bool,
    ) -> Result<u64, Error> {
        owner.require_auth();
        require_initialized(&e)?;
        registry::validate_name(&name)?;
        if registry::profile_id_of(&e, &owner).is_some() {
            return Err(Error::ProfileAlreadyExists);
        }
        if verify_domain {
            match domain::registry_address(&e) {
                Some(ns) => {
                    if !domain::owns_domain(&e, &ns, &owner, &name) {
                        return Err(Error::DomainNotOwned);
                    }
                }
                None => domain::emit_verification_skipped(&e, &owner, &name),
            }
        }
        let profile = registry::create(&e, owner, name)?;
        Ok(profile.id)
    }

    pub fn has_trust_profile(e: Env, address: Address) -> bool {
        registry::profile_id_of(&e, &address).is_some()
    }

    pub fn get_profile_id(e: Env, owner: Address) -> Result<u64, Error> {
        registry::profile_id_of(&e, &owner).ok_or(Error::ProfileNotFound)
    }

    pub fn get_profile(e: Env, profile_id: u64) -> Result<TrustProfile, Error> {
        registry::load(&e, profile_id)
    }

    pub fn get_trust_score(e: Env, profile_id: u64) -> Result<i64, Error> {
        Ok(registry::load(&e, profile_id)?.trust_score)
    }

    pub fn get_profile_count(e: Env) -> u64 {
        registry::count(&e)
    }

    /// Read-only: true iff the configured domain registry lists `claimant` as
    /// the current owner of `name`.
    pub fn verify_domain(e: Env, claimant: Address, name: String) -> bool {
        match domain::registry_address(&e) {
            Some(ns) => domain::owns_domain(&e, &ns, &claimant, &name),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Bond lifecycle
    // ------------------------------------------------------------------

    /// Open a one-way bond from the caller to `to`, escrowing `amount`.
    pub fn create_bond(
        e: Env,
        caller: Address,
        profile_id: u64,
        to: Address,
        amount: i128,
    ) -> Result<u64, Error> {
        caller.require_auth();
        let token = escrow::token_address(&e)?;
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if to == caller {
            return Err(Error::SelfBond);
        }
        let mut profile = registry::load_owned(&e, profile_id, &caller)?;
        escrow::ensure_balance(&e, &token, &caller, amount)?;

        let now = e.ledger().timestamp();
        let bond_id = escrow::next_bond_id(&e)?;
        let bond = TrustBond::open(bond_id, caller.clone(), to, amount, now);
        profile.record_bond_opened(amount, now)?;

        escrow::deposit(&e, &token, &caller, amount);
        escrow::save(&e, &bond);
        registry::save(&e, &profile);
        escrow::emit_bond_created(&e, &bond);
        Ok(bond_id)
    }

    /// Join a bond as its designated counterparty, making it two-way.
    pub fn join_bond(
        e: Env,
        caller: Address,
        bond_id: u64,
        profile_id: u64,
        amount: i128,
    ) -> Result<(), Error> {
        caller.require_auth();
        let token = escrow::token_address(&e)?;
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let mut bond = escrow::load(&e, bond_id)?;
        let mut profile = registry::load_owned(&e, profile_id, &caller)?;

        let now = e.ledger().timestamp();
        bond.join(&caller, amount, now)?;
        let old_score = profile.trust_score;
        profile.record_bond_joined(amount, now)?;
        escrow::ensure_balance(&e, &token, &caller, amount)?;

        escrow::deposit(&e, &token, &caller, amount);
        escrow::save(&e, &bond);
        registry::save(&e, &profile);
        escrow::emit_bond_joined(&e, &bond, amount);
        trust_score::emit_score_changed(&e, &profile, old_score);
        Ok(())
    }

    /// Withdraw the caller's contribution. The bond stays active and reverts
    /// to one-way; the other side's contribution is untouched.
    /// @return the amount returned to the caller
    pub fn withdraw_bond(
        e: Env,
        caller: Address,
        bond_id: u64,
        profile_id: u64,
    ) -> Result<i128, Error> {
        caller.require_auth();
        let token = escrow::token_address(&e)?;
        let mut bond = escrow::load(&e, bond_id)?;
        let mut profile = registry::load_owned(&e, profile_id, &caller)?;

        let now = e.ledger().timestamp();
        let amount = bond.withdraw(&caller, now)?;
        profile.record_bond_withdrawn(amount, now)?;

        escrow::payout(&e, &token, &caller, amount);
        escrow::save(&e, &bond);
        registry::save(&e, &profile);
        escrow::emit_bond_withdrawn(&e, &bond, &caller, amount);
        Ok(amount)
    }

    /// Break the bond. The caller forfeits its contribution to the
    /// counterparty, whose own contribution is returned, and takes a trust
    /// score penalty.
    pub fn break_bond(e: Env, caller: Address, bond_id: u64, profile_id: u64) -> Result<(), Error> {
        caller.require_auth();
        let token = escrow::token_address(&e)?;
        let mut bond = escrow::load(&e, bond_id)?;
        let mut profile = registry::load_owned(&e, profile_id, &caller)?;

        let now = e.ledger().timestamp();
        let outcome = bond.break_by(&caller, now)?;
        let old_score = profile.trust_score;
        profile.record_bond_broken(outcome.forfeited, now)?;

        let counterparty_profile = if outcome.returned > 0 {
            let id = registry::profile_id_of(&e, &outcome.counterparty)
                .ok_or(Error::ProfileNotFound)?;
            let mut other = registry::load(&e, id)?;
            other.record_bond_withdrawn(outcome.returned, now)?;
            Some(other)
        } else {
            None
        };

        let paid = outcome
            .forfeited
            .checked_add(outcome.returned)
            .ok_or(Error::ArithmeticOverflow)?;
        escrow::payout(&e, &token, &outcome.counterparty, paid);
        escrow::save(&e, &bond);
        registry::save(&e, &profile);
        if let Some(other) = counterparty_profile {
            registry::save(&e, &other);
        }
        escrow::emit_bond_broken(&e, &bond, &caller, &outcome);
        trust_score::emit_score_changed(&e, &profile, old_score);
        Ok(())
    }

    pub fn get_bond(e: Env, bond_id: u64) -> Result<TrustBond, Error> {
        escrow::load(&e, bond_id)
    }

    pub fn get_bond_count(e: Env) -> u64 {
        escrow::count(&e)
    }
}

#[cfg(test)]
mod test_helpers;





#[cfg(test)]
mod test_withdraw_bond;

#[cfg(test)]
mod test_break_bond;

#[cfg(test)]
mod test_domain;

#[cfg(test)]
mod integration;
