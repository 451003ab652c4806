//! Profile Registry
//!
//! Maps each owner address to at most one trust profile. Profiles live in
//! persistent storage under `DataKey::Profile(id)`; the owner index lives
//! under `DataKey::ProfileOf(owner)`.

use soroban_sdk::{Address, Env, String, Symbol};

use crate::{bump, DataKey, Error, TrustProfile};

/// Maximum profile name length in bytes.
pub const MAX_NAME_LEN: u32 = 64;

pub fn validate_name(name: &String) -> Result<(), Error> {
    let len = name.len();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(Error::InvalidName);
    }
    Ok(())
}

#[must_use]
pub fn profile_id_of(e: &Env, owner: &Address) -> Option<u64> {
    e.storage()
        .persistent()
        .get(&DataKey::ProfileOf(owner.clone()))
}

pub fn load(e: &Env, profile_id: u64) -> Result<TrustProfile, Error> {
    e.storage()
        .persistent()
        .get(&DataKey::Profile(profile_id))
        .ok_or(Error::ProfileNotFound)
}

/// Load a profile and check that `caller` owns it.
pub fn load_owned(e: &Env, profile_id: u64, caller: &Address) -> Result<TrustProfile, Error> {
    let profile = load(e, profile_id)?;
    if profile.owner != *caller {
        return Err(Error::NotProfileOwner);
    }
    Ok(profile)
}

pub fn save(e: &Env, profile: &TrustProfile) {
    let key = DataKey::Profile(profile.id);
    e.storage().persistent().set(&key, profile);
    bump(e, &key);
}

#[must_use]
pub fn count(e: &Env) -> u64 {
    e.storage()
        .instance()
        .get(&DataKey::ProfileCounter)
        .unwrap_or(0)
}

/// Allocate an id, store the profile and index it by owner.
/// Caller has already checked that `owner` has no profile.
pub fn create(e: &Env, owner: Address, name: String) -> Result<TrustProfile, Error> {
    let id = count(e).checked_add(1).ok_or(Error::ArithmeticOverflow)?;
    e.storage().instance().set(&DataKey::ProfileCounter, &id);

    let profile = TrustProfile::new(id, owner.clone(), name, e.ledger().timestamp());
    save(e, &profile);
    let index = DataKey::ProfileOf(owner.clone());
    e.storage().persistent().set(&index, &id);
    bump(e, &index);

    e.events().publish(
        (Symbol::new(e, "profile_created"), id),
        (owner, profile.name.clone()),
    );
    Ok(profile)
}
