//! Client-side orchestration of the trust contract.
//!
//! Every mutating call follows the same sequence: check the caller's balance
//! locally, submit, then hand the touched objects to the indexer. The versions
//! a call produced are remembered so that later reads wait until the indexer
//! has caught up with this client's own writes.

use std::collections::HashMap;

use serde_json::Value;
use soroban_sdk::String as SorobanString;
use tracing::{info, warn};

use crate::config::{Amounts, HarnessConfig};
use crate::error::{settle, settle_host, HarnessError};
use crate::indexer::ObjectRef;
use crate::sandbox::{Account, Sandbox, TxEffects};
use crate::snapshot::{BondView, ProfileView};
use crate::visibility::{wait_for_visibility, Sleeper, ThreadSleeper};

pub struct TrustClient<S: Sleeper = ThreadSleeper> {
    sandbox: Sandbox,
    config: HarnessConfig,
    amounts: Amounts,
    sleeper: S,
    /// Minimum version to read per object, from this client's own writes.
    seen: HashMap<ObjectRef, u64>,
    /// Named accounts that persist across scenario runs.
    participants: HashMap<String, Account>,
}

impl TrustClient<ThreadSleeper> {
    pub fn new(config: HarnessConfig) -> Result<Self, HarnessError> {
        Self::with_sleeper(config, ThreadSleeper)
    }
}

impl<S: Sleeper> TrustClient<S> {
    pub fn with_sleeper(config: HarnessConfig, sleeper: S) -> Result<Self, HarnessError> {
        let amounts = config.validate()?;
        let sandbox = Sandbox::new(&config.ledger)?;
        Ok(Self {
            sandbox,
            config,
            amounts,
            sleeper,
            seen: HashMap::new(),
            participants: HashMap::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[must_use]
    pub fn amounts(&self) -> Amounts {
        self.amounts
    }

    #[must_use]
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    #[must_use]
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn create_account(&mut self, label: &str) -> Account {
        self.sandbox.create_account(label)
    }

    /// The account registered under `label`, created on first use. Later
    /// runs on the same client act as the same address.
    pub fn participant(&mut self, label: &str) -> Account {
        if let Some(account) = self.participants.get(label) {
            return account.clone();
        }
        let account = self.sandbox.create_account(label);
        self.participants.insert(label.to_string(), account.clone());
        account
    }

    /// Request one faucet payout for `account`. Returns the new balance.
    pub fn request_faucet(&mut self, account: &Account) -> Result<i128, HarnessError> {
        let balance = self.sandbox.fund(&account.address, self.amounts.faucet)?;
        info!(account = %account.label, amount = self.amounts.faucet, balance, "faucet payout");
        Ok(balance)
    }

    /// Top `account` up from the faucet when it is below the configured minimum.
    pub fn ensure_funded(&mut self, account: &Account) -> Result<i128, HarnessError> {
        let balance = self.sandbox.balance(&account.address)?;
        if balance >= self.amounts.minimum_balance {
            return Ok(balance);
        }
        self.request_faucet(account)
    }

    pub fn balance(&self, account: &Account) -> Result<i128, HarnessError> {
        self.sandbox.balance(&account.address)
    }

    /// Fail unless `account` can cover `amount` plus the fee reserve.
    pub fn check_and_verify_balance(
        &self,
        account: &Account,
        amount: i128,
    ) -> Result<i128, HarnessError> {
        let available = self.sandbox.balance(&account.address)?;
        let needed = amount.saturating_add(self.amounts.fee_reserve);
        if available < needed {
            warn!(account = %account.label, needed, available, "balance too low");
            return Err(HarnessError::InsufficientFunds {
                account: account.label.clone(),
                needed,
                available,
            });
        }
        Ok(available)
    }

    pub fn has_trust_profile(&self, account: &Account) -> Result<bool, HarnessError> {
        settle_host(
            "has_trust_profile",
            self.sandbox
                .trust_client()
                .try_has_trust_profile(&account.address),
        )
    }

    pub fn get_profile_id(&self, account: &Account) -> Result<u64, HarnessError> {
        settle(
            "get_profile_id",
            self.sandbox
                .trust_client()
                .try_get_profile_id(&account.address),
        )
    }

    pub fn create_trust_profile(
        &mut self,
        account: &Account,
        name: &str,
        verify_domain: bool,
    ) -> Result<u64, HarnessError> {
        self.sandbox.begin_tx();
        let profile_id = settle(
            "create_trust_profile",
            self.sandbox.trust_client().try_create_trust_profile(
                &account.address,
                &SorobanString::from_str(self.sandbox.env(), name),
                &verify_domain,
            ),
        )?;
        self.commit(&[ObjectRef::Profile(profile_id)], &[])?;
        info!(account = %account.label, profile_id, name, verify_domain, "trust profile created");
        Ok(profile_id)
    }

    /// Existing profile id for `account`, or a new profile named `name`.
    /// The flag is true when the profile was created by this call.
    pub fn find_or_create_profile(
        &mut self,
        account: &Account,
        name: &str,
    ) -> Result<(u64, bool), HarnessError> {
        if self.has_trust_profile(account)? {
            let profile_id = self.get_profile_id(account)?;
            info!(account = %account.label, profile_id, "reusing trust profile");
            return Ok((profile_id, false));
        }
        let verify = !self.config.skip_domain_verification;
        if verify {
            self.sandbox.register_domain(account, name)?;
        }
        let profile_id = self.create_trust_profile(account, name, verify)?;
        Ok((profile_id, true))
    }

    /// Read-only domain ownership check.
    pub fn verify_domain(&self, account: &Account, name: &str) -> Result<bool, HarnessError> {
        let verified = settle_host(
            "verify_domain",
            self.sandbox.trust_client().try_verify_domain(
                &account.address,
                &SorobanString::from_str(self.sandbox.env(), name),
            ),
        )?;
        info!(account = %account.label, name, verified, "domain verification");
        Ok(verified)
    }

    pub fn create_bond(
        &mut self,
        account: &Account,
        profile_id: u64,
        counterparty: &Account,
        amount: i128,
    ) -> Result<u64, HarnessError> {
        self.check_and_verify_balance(account, amount)?;
        self.sandbox.begin_tx();
        let bond_id = settle(
            "create_bond",
            self.sandbox.trust_client().try_create_bond(
                &account.address,
                &profile_id,
                &counterparty.address,
                &amount,
            ),
        )?;
        self.commit(&[ObjectRef::Bond(bond_id)], &[ObjectRef::Profile(profile_id)])?;
        info!(
            from = %account.label,
            to = %counterparty.label,
            bond_id,
            amount,
            "bond created"
        );
        Ok(bond_id)
    }

    pub fn join_bond(
        &mut self,
        account: &Account,
        bond_id: u64,
        profile_id: u64,
        amount: i128,
    ) -> Result<(), HarnessError> {
        self.check_and_verify_balance(account, amount)?;
        self.sandbox.begin_tx();
        settle(
            "join_bond",
            self.sandbox.trust_client().try_join_bond(
                &account.address,
                &bond_id,
                &profile_id,
                &amount,
            ),
        )?;
        self.commit(&[], &[ObjectRef::Bond(bond_id), ObjectRef::Profile(profile_id)])?;
        info!(account = %account.label, bond_id, amount, "bond joined");
        Ok(())
    }

    /// Withdraw the caller's side of the bond. Returns the amount paid out.
    pub fn withdraw_bond(
        &mut self,
        account: &Account,
        bond_id: u64,
        profile_id: u64,
    ) -> Result<i128, HarnessError> {
        self.sandbox.begin_tx();
        let amount = settle(
            "withdraw_bond",
            self.sandbox.trust_client().try_withdraw_bond(
                &account.address,
                &bond_id,
                &profile_id,
            ),
        )?;
        self.commit(&[], &[ObjectRef::Bond(bond_id), ObjectRef::Profile(profile_id)])?;
        info!(account = %account.label, bond_id, amount, "bond withdrawn");
        Ok(amount)
    }

    pub fn break_bond(
        &mut self,
        account: &Account,
        bond_id: u64,
        profile_id: u64,
    ) -> Result<(), HarnessError> {
        let trust = self.sandbox.trust_client();
        let before = settle("get_bond", trust.try_get_bond(&bond_id))?;
        let returned_to = if before.user_1 == account.address {
            (before.money_by_user_2 > 0).then_some(before.user_2)
        } else {
            (before.money_by_user_1 > 0).then_some(before.user_1)
        };

        self.sandbox.begin_tx();
        settle(
            "break_bond",
            trust.try_break_bond(&account.address, &bond_id, &profile_id),
        )?;

        let mut mutated = vec![ObjectRef::Bond(bond_id), ObjectRef::Profile(profile_id)];
        if let Some(counterparty) = returned_to {
            let other = settle("get_profile_id", trust.try_get_profile_id(&counterparty))?;
            mutated.push(ObjectRef::Profile(other));
        }
        self.commit(&[], &mutated)?;
        info!(account = %account.label, bond_id, "bond broken");
        Ok(())
    }

    /// Newest active bond from `from` to `to` that still holds `from`'s funds.
    pub fn find_active_bond(
        &self,
        from: &Account,
        to: &Account,
    ) -> Result<Option<u64>, HarnessError> {
        let trust = self.sandbox.trust_client();
        let count = settle_host("get_bond_count", trust.try_get_bond_count())?;
        for bond_id in (1..=count).rev() {
            let bond = settle("get_bond", trust.try_get_bond(&bond_id))?;
            if bond.user_1 == from.address
                && bond.user_2 == to.address
                && bond.is_active()
                && bond.money_by_user_1 > 0
            {
                return Ok(Some(bond_id));
            }
        }
        Ok(None)
    }

    /// Indexed profile snapshot, at least as new as this client's last write.
    pub fn get_profile_data(&mut self, profile_id: u64) -> Result<ProfileView, HarnessError> {
        let raw = self.fetch(ObjectRef::Profile(profile_id))?;
        Ok(ProfileView::decode(&raw)?)
    }

    /// Indexed bond snapshot, at least as new as this client's last write.
    pub fn get_bond_info(&mut self, bond_id: u64) -> Result<BondView, HarnessError> {
        let raw = self.fetch(ObjectRef::Bond(bond_id))?;
        Ok(BondView::decode(&raw)?)
    }

    pub fn get_trust_score(&mut self, profile_id: u64) -> Result<i64, HarnessError> {
        Ok(self.get_profile_data(profile_id)?.trust_score)
    }

    fn fetch(&mut self, object: ObjectRef) -> Result<Value, HarnessError> {
        let min_version = self.seen.get(&object).copied().unwrap_or(1);
        let what = object.to_string();
        let sandbox = &mut self.sandbox;
        wait_for_visibility(&self.config.visibility, &mut self.sleeper, &what, || {
            sandbox.fetch_object(object, min_version)
        })
    }

    fn commit(
        &mut self,
        created: &[ObjectRef],
        mutated: &[ObjectRef],
    ) -> Result<TxEffects, HarnessError> {
        let effects = self.sandbox.commit(created, mutated)?;
        for &(object, version) in effects.objects() {
            self.seen.insert(object, version);
        }
        Ok(effects)
    }
}
