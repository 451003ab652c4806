#![no_std]

//! # Name Registry Contract
//!
//! Minimal domain registry: a domain has one owner until its expiry. Trust
//! profiles query `owner_of` to verify that a profile name is a domain the
//! creator actually holds. The admin may revoke a record.

use soroban_sdk::{contract, contracterror, contractimpl, contracttype, Address, Env, String, Symbol};

/// Domain records are bumped to this many ledgers when they drop below the threshold.
pub(crate) const DOMAIN_TTL_THRESHOLD: u32 = 518_400; // ~30 days
pub(crate) const DOMAIN_TTL_EXTEND: u32 = 2_592_000; // ~150 days

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Domain(String),
}

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    DomainTaken = 3,
    InvalidExpiry = 4,
    DomainNotFound = 5,
    Unauthorized = 6,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DomainRecord {
    pub domain: String,
    pub owner: Address,
    pub registered_at: u64,
    pub expires_at: u64,
}

impl DomainRecord {
    #[must_use]
    pub fn is_live(&self, now: u64) -> bool {
        now < self.expires_at
    }
}

#[contract]
pub struct NameRegistry;

#[contractimpl]
impl NameRegistry {
    pub fn initialize(e: Env, admin: Address) -> Result<(), Error> {
        if e.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        e.storage().instance().set(&DataKey::Admin, &admin);
        Ok(())
    }

    /// Register or renew `domain` for `owner` until `expires_at`.
    /// A live record held by someone else blocks registration.
    pub fn register(
        e: Env,
        owner: Address,
        domain: String,
        expires_at: u64,
    ) -> Result<DomainRecord, Error> {
        owner.require_auth();
        if !e.storage().instance().has(&DataKey::Admin) {
            return Err(Error::NotInitialized);
        }
        let now = e.ledger().timestamp();
        if expires_at <= now {
            return Err(Error::InvalidExpiry);
        }
        let key = DataKey::Domain(domain.clone());
        let existing: Option<DomainRecord> = e.storage().persistent().get(&key);
        let registered_at = match existing {
            Some(record) if record.is_live(now) && record.owner != owner => {
                return Err(Error::DomainTaken);
            }
            Some(record) if record.is_live(now) => record.registered_at,
            _ => now,
        };
        let record = DomainRecord {
            domain,
            owner: owner.clone(),
            registered_at,
            expires_at,
        };
        e.storage().persistent().set(&key, &record);
        e.storage()
            .persistent()
            .extend_ttl(&key, DOMAIN_TTL_THRESHOLD, DOMAIN_TTL_EXTEND);
        e.events().publish(
            (Symbol::new(&e, "domain_registered"), owner),
            (record.domain.clone(), expires_at),
        );
        Ok(record)
    }

    /// Current owner of `domain`, or `None` if unknown or expired.
    pub fn owner_of(e: Env, domain: String) -> Option<Address> {
        let record: DomainRecord = e.storage().persistent().get(&DataKey::Domain(domain))?;
        if record.is_live(e.ledger().timestamp()) {
            Some(record.owner)
        } else {
            None
        }
    }

    /// Remove the record for `domain`. Admin only.
    pub fn revoke(e: Env, caller: Address, domain: String) -> Result<(), Error> {
        caller.require_auth();
        let admin: Address = e
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        if caller != admin {
            return Err(Error::Unauthorized);
        }
        let key = DataKey::Domain(domain.clone());
        if !e.storage().persistent().has(&key) {
            return Err(Error::DomainNotFound);
        }
        e.storage().persistent().remove(&key);
        e.events()
            .publish((Symbol::new(&e, "domain_revoked"), caller), domain);
        Ok(())
    }

    pub fn get_record(e: Env, domain: String) -> Result<DomainRecord, Error> {
        e.storage()
            .persistent()
            .get(&DataKey::Domain(domain))
            .ok_or(Error::DomainNotFound)
    }
}
