//! Trust profile record.

use soroban_sdk::{contracttype, Address, String};

use crate::trust_score;
use crate::Error;

/// Per-address trust record.
///
/// # Fields
/// * `id` - Sequential profile id (starts at 1).
/// * `owner` - Address owning the profile; unique in the registry.
/// * `name` - Display name, fixed at creation.
/// * `trust_score` - Reputation score; starts at `BASE_TRUST_SCORE`.
/// * `total_bonds` .. `broken_bonds` - Bond counters. `total_bonds` always
///   equals `active_bonds + withdrawn_bonds + broken_bonds`.
/// * `money_in_*_bonds` - Contributed amounts per bucket, in token units.
/// * `created_at`, `updated_at` - Ledger timestamps.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrustProfile {
    pub id: u64,
    pub owner: Address,
    pub name: String,
    pub trust_score: i64,
    pub total_bonds: u64,
    pub active_bonds: u64,
    pub withdrawn_bonds: u64,
    pub broken_bonds: u64,
    pub money_in_active_bonds: i128,
    pub money_in_withdrawn_bonds: i128,
    pub money_in_broken_bonds: i128,
    pub created_at: u64,
    pub updated_at: u64,
}

fn inc(v: u64) -> Result<u64, Error> {
    v.checked_add(1).ok_or(Error::ArithmeticOverflow)
}

fn dec(v: u64) -> Result<u64, Error> {
    v.checked_sub(1).ok_or(Error::ArithmeticOverflow)
}

fn add(v: i128, amount: i128) -> Result<i128, Error> {
    v.checked_add(amount).ok_or(Error::ArithmeticOverflow)
}

fn sub(v: i128, amount: i128) -> Result<i128, Error> {
    v.checked_sub(amount).ok_or(Error::ArithmeticOverflow)
}

impl TrustProfile {
    pub fn new(id: u64, owner: Address, name: String, now: u64) -> Self {
        Self {
            id,
            owner,
            name,
            trust_score: trust_score::BASE_TRUST_SCORE,
            total_bonds: 0,
            active_bonds: 0,
            withdrawn_bonds: 0,
            broken_bonds: 0,
            money_in_active_bonds: 0,
            money_in_withdrawn_bonds: 0,
            money_in_broken_bonds: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// A new contribution entered a bond (as creator).
    pub fn record_bond_opened(&mut self, amount: i128, now: u64) -> Result<(), Error> {
        let total = inc(self.total_bonds)?;
        let active = inc(self.active_bonds)?;
        let money = add(self.money_in_active_bonds, amount)?;
        self.total_bonds = total;
        self.active_bonds = active;
        self.money_in_active_bonds = money;
        self.touch(now);
        Ok(())
    }

    /// Joined a bond as its counterparty: counts as an opened bond and earns
    /// the join reward.
    pub fn record_bond_joined(&mut self, amount: i128, now: u64) -> Result<(), Error> {
        let score = trust_score::after_join(self.trust_score)?;
        self.record_bond_opened(amount, now)?;
        self.trust_score = score;
        Ok(())
    }

    /// A live contribution was returned to this profile's owner.
    pub fn record_bond_withdrawn(&mut self, amount: i128, now: u64) -> Result<(), Error> {
        let active = dec(self.active_bonds)?;
        let withdrawn = inc(self.withdrawn_bonds)?;
        let money_active = sub(self.money_in_active_bonds, amount)?;
        let money_withdrawn = add(self.money_in_withdrawn_bonds, amount)?;
        self.active_bonds = active;
        self.withdrawn_bonds = withdrawn;
        self.money_in_active_bonds = money_active;
        self.money_in_withdrawn_bonds = money_withdrawn;
        self.touch(now);
        Ok(())
    }

    /// This profile's owner broke a bond and forfeited `amount`.
    pub fn record_bond_broken(&mut self, amount: i128, now: u64) -> Result<(), Error> {
        let active = dec(self.active_bonds)?;
        let broken = inc(self.broken_bonds)?;
        let money_active = sub(self.money_in_active_bonds, amount)?;
        let money_broken = add(self.money_in_broken_bonds, amount)?;
        let score = trust_score::after_break(self.trust_score)?;
        self.active_bonds = active;
        self.broken_bonds = broken;
        self.money_in_active_bonds = money_active;
        self.money_in_broken_bonds = money_broken;
        self.trust_score = score;
        self.touch(now);
        Ok(())
    }

    #[must_use]
    pub fn counters_consistent(&self) -> bool {
        self.active_bonds
            .checked_add(self.withdrawn_bonds)
            .and_then(|s| s.checked_add(self.broken_bonds))
            == Some(self.total_bonds)
    }

    fn touch(&mut self, now: u64) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
