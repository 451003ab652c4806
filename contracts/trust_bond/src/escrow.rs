//! Bond Escrow
//!
//! Bond storage plus the token movements behind it. Contributions are held by
//! the contract itself until withdrawn or paid out on break.

use soroban_sdk::{token, Address, Env, Symbol};

use crate::types::BreakOutcome;
use crate::{bump, DataKey, Error, TrustBond};

pub fn token_address(e: &Env) -> Result<Address, Error> {
    e.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(Error::NotInitialized)
}

/// Fails with `InsufficientFunds` if `from` cannot cover `amount`.
pub fn ensure_balance(e: &Env, token: &Address, from: &Address, amount: i128) -> Result<(), Error> {
    let balance = token::Client::new(e, token).balance(from);
    if balance < amount {
        return Err(Error::InsufficientFunds);
    }
    Ok(())
}

pub fn deposit(e: &Env, token: &Address, from: &Address, amount: i128) {
    token::Client::new(e, token).transfer(from, &e.current_contract_address(), &amount);
}

pub fn payout(e: &Env, token: &Address, to: &Address, amount: i128) {
    if amount <= 0 {
        return;
    }
    token::Client::new(e, token).transfer(&e.current_contract_address(), to, &amount);
}

#[must_use]
pub fn count(e: &Env) -> u64 {
    e.storage()
        .instance()
        .get(&DataKey::BondCounter)
        .unwrap_or(0)
}

pub fn next_bond_id(e: &Env) -> Result<u64, Error> {
    let id = count(e).checked_add(1).ok_or(Error::ArithmeticOverflow)?;
    e.storage().instance().set(&DataKey::BondCounter, &id);
    Ok(id)
}

pub fn load(e: &Env, bond_id: u64) -> Result<TrustBond, Error> {
    e.storage()
        .persistent()
        .get(&DataKey::Bond(bond_id))
        .ok_or(Error::BondNotFound)
}

pub fn save(e: &Env, bond: &TrustBond) {
    let key = DataKey::Bond(bond.id);
    e.storage().persistent().set(&key, bond);
    bump(e, &key);
}

pub fn emit_bond_created(e: &Env, bond: &TrustBond) {
    e.events().publish(
        (Symbol::new(e, "bond_created"), bond.id),
        (bond.user_1.clone(), bond.user_2.clone(), bond.money_by_user_1),
    );
}

pub fn emit_bond_joined(e: &Env, bond: &TrustBond, amount: i128) {
    e.events().publish(
        (Symbol::new(e, "bond_joined"), bond.id),
        (bond.user_2.clone(), amount),
    );
}

pub fn emit_bond_withdrawn(e: &Env, bond: &TrustBond, by: &Address, amount: i128) {
    e.events().publish(
        (Symbol::new(e, "bond_withdrawn"), bond.id),
        (by.clone(), amount),
    );
}

pub fn emit_bond_broken(e: &Env, bond: &TrustBond, by: &Address, outcome: &BreakOutcome) {
    e.events().publish(
        (Symbol::new(e, "bond_broken"), bond.id),
        (
            by.clone(),
            outcome.counterparty.clone(),
            outcome.forfeited,
            outcome.returned,
        ),
    );
}
