//! Trust bond record and its state machine.
//!
//! A bond is opened one-way by `user_1`. The designated `user_2` may join it
//! once, which makes it two-way. Either contributing side can withdraw its
//! own funds, which leaves the bond active but one-way. Breaking is terminal:
//! the breaker forfeits its contribution to the counterparty.

use soroban_sdk::{contracttype, Address};

use crate::Error;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BondType {
    /// Funded by the creator only.
    OneWay = 0,
    /// Funded by both parties.
    TwoWay = 1,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BondStatus {
    Active = 0,
    Withdrawn = 1,
    Broken = 2,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrustBond {
    pub id: u64,
    pub user_1: Address,
    pub user_2: Address,
    pub bond_type: BondType,
    pub bond_status: BondStatus,
    pub money_by_user_1: i128,
    pub money_by_user_2: i128,
    /// Set once `user_2` has joined; a bond can be joined at most once.
    pub joined: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BondSide {
    User1,
    User2,
}

/// Fund movements produced by breaking a bond.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BreakOutcome {
    /// The breaker's contribution, forfeited to the counterparty.
    pub forfeited: i128,
    /// The counterparty's own contribution, returned to it.
    pub returned: i128,
    pub counterparty: Address,
}

impl TrustBond {
    pub fn open(id: u64, user_1: Address, user_2: Address, amount: i128, now: u64) -> Self {
        Self {
            id,
            user_1,
            user_2,
            bond_type: BondType::OneWay,
            bond_status: BondStatus::Active,
            money_by_user_1: amount,
            money_by_user_2: 0,
            joined: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.bond_status == BondStatus::Active
    }

    #[must_use]
    pub fn side_of(&self, address: &Address) -> Option<BondSide> {
        if *address == self.user_1 {
            Some(BondSide::User1)
        } else if *address == self.user_2 {
            Some(BondSide::User2)
        } else {
            None
        }
    }

    #[must_use]
    pub fn balance_of(&self, side: BondSide) -> i128 {
        match side {
            BondSide::User1 => self.money_by_user_1,
            BondSide::User2 => self.money_by_user_2,
        }
    }

    /// Sum of both sides' live contributions.
    pub fn locked(&self) -> Result<i128, Error> {
        self.money_by_user_1
            .checked_add(self.money_by_user_2)
            .ok_or(Error::ArithmeticOverflow)
    }

    pub fn join(&mut self, caller: &Address, amount: i128, now: u64) -> Result<(), Error> {
        if !self.is_active() {
            return Err(Error::BondNotActive);
        }
        if *caller != self.user_2 {
            return Err(Error::NotCounterparty);
        }
        if self.joined {
            return Err(Error::AlreadyJoined);
        }
        if self.money_by_user_1 <= 0 {
            return Err(Error::NothingToJoin);
        }
        self.money_by_user_2 = amount;
        self.bond_type = BondType::TwoWay;
        self.joined = true;
        self.touch(now);
        Ok(())
    }

    /// Zero the caller's side and return what it held.
    pub fn withdraw(&mut self, caller: &Address, now: u64) -> Result<i128, Error> {
        if !self.is_active() {
            return Err(Error::BondNotActive);
        }
        let side = self.side_of(caller).ok_or(Error::NotParticipant)?;
        let amount = self.balance_of(side);
        if amount <= 0 {
            return Err(Error::NoContribution);
        }
        match side {
            BondSide::User1 => self.money_by_user_1 = 0,
            BondSide::User2 => self.money_by_user_2 = 0,
        }
        self.bond_type = BondType::OneWay;
        self.touch(now);
        Ok(amount)
    }

    pub fn break_by(&mut self, caller: &Address, now: u64) -> Result<BreakOutcome, Error> {
        if !self.is_active() {
            return Err(Error::BondNotActive);
        }
        let side = self.side_of(caller).ok_or(Error::NotParticipant)?;
        let forfeited = self.balance_of(side);
        if forfeited <= 0 {
            return Err(Error::NoContribution);
        }
        let (returned, counterparty) = match side {
            BondSide::User1 => (self.money_by_user_2, self.user_2.clone()),
            BondSide::User2 => (self.money_by_user_1, self.user_1.clone()),
        };
        self.money_by_user_1 = 0;
        self.money_by_user_2 = 0;
        self.bond_status = BondStatus::Broken;
        self.touch(now);
        Ok(BreakOutcome {
            forfeited,
            returned,
            counterparty,
        })
    }

    fn touch(&mut self, now: u64) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
