//! In-process ledger the harness submits transactions to.
//!
//! Wraps a Soroban test environment with the bond token, the name registry
//! and the trust contract deployed. Signing is replaced by mocked auths. Each
//! submitted transaction advances the ledger clock, and the objects it
//! touches are handed to the [`Indexer`] that readers go through.

use serde::Serialize;
use serde_json::{json, Value};
use soroban_sdk::testutils::{Address as _, EnvTestConfig, Ledger};
use soroban_sdk::{token, Address, Env, String as SorobanString};
use tracing::{debug, info};

use name_service::{NameRegistry, NameRegistryClient};
use trust_bond::{TrustBond, TrustBondContract, TrustBondContractClient, TrustProfile};

use crate::config::LedgerConfig;
use crate::error::{settle, settle_host, settle_with, HarnessError};
use crate::indexer::{Indexer, ObjectRef};

/// A sandbox account. `handle` is how the account appears in snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub label: String,
    pub handle: String,
    pub address: Address,
}

/// Objects created or mutated by one transaction, with their new versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TxEffects {
    pub created: Vec<(ObjectRef, u64)>,
    pub mutated: Vec<(ObjectRef, u64)>,
}

impl TxEffects {
    #[must_use]
    pub fn version_of(&self, object: ObjectRef) -> Option<u64> {
        self.created
            .iter()
            .chain(&self.mutated)
            .find(|(o, _)| *o == object)
            .map(|(_, v)| *v)
    }

    pub fn objects(&self) -> impl Iterator<Item = &(ObjectRef, u64)> {
        self.created.iter().chain(&self.mutated)
    }
}

pub struct Sandbox {
    env: Env,
    admin: Address,
    token: Address,
    trust: Address,
    registry: Option<Address>,
    indexer: Indexer,
    clock_step: u64,
    domain_ttl: u64,
    accounts: Vec<Account>,
}

impl Sandbox {
    /// Deploy the token, the optional name registry and the trust contract.
    pub fn new(config: &LedgerConfig) -> Result<Self, HarnessError> {
        let mut test_config = EnvTestConfig::default();
        test_config.capture_snapshot_at_drop = false;
        let env = Env::new_with_config(test_config);
        env.mock_all_auths();
        env.ledger()
            .with_mut(|li| li.timestamp = config.start_timestamp);

        let admin = Address::generate(&env);
        let token = env
            .register_stellar_asset_contract_v2(admin.clone())
            .address();

        let registry = if config.name_registry {
            let id = env.register(NameRegistry, ());
            settle_with(
                "initialize_registry",
                NameRegistryClient::new(&env, &id).try_initialize(&admin),
                |error| HarnessError::RegistryRejected {
                    op: "initialize_registry",
                    error,
                },
            )?;
            Some(id)
        } else {
            None
        };

        let trust = env.register(TrustBondContract, ());
        settle(
            "initialize",
            TrustBondContractClient::new(&env, &trust).try_initialize(&admin, &token, &registry),
        )?;
        info!(
            indexing_lag = config.indexing_lag,
            name_registry = registry.is_some(),
            "sandbox ledger ready"
        );

        Ok(Self {
            env,
            admin,
            token,
            trust,
            registry,
            indexer: Indexer::new(config.indexing_lag),
            clock_step: config.clock_step_secs,
            domain_ttl: config.domain_ttl_secs,
            accounts: Vec::new(),
        })
    }

    #[must_use]
    pub fn env(&self) -> &Env {
        &self.env
    }

    #[must_use]
    pub fn admin(&self) -> &Address {
        &self.admin
    }

    #[must_use]
    pub fn trust_client(&self) -> TrustBondContractClient<'_> {
        TrustBondContractClient::new(&self.env, &self.trust)
    }

    #[must_use]
    pub fn token_client(&self) -> token::Client<'_> {
        token::Client::new(&self.env, &self.token)
    }

    #[must_use]
    pub fn has_name_registry(&self) -> bool {
        self.registry.is_some()
    }

    /// Current ledger timestamp.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.env.ledger().timestamp()
    }

    pub fn create_account(&mut self, label: &str) -> Account {
        let account = Account {
            label: label.to_string(),
            handle: format!("{label}@{}", self.accounts.len() + 1),
            address: Address::generate(&self.env),
        };
        debug!(label, handle = %account.handle, "account created");
        self.accounts.push(account.clone());
        account
    }

    /// How `address` is rendered in snapshots.
    #[must_use]
    pub fn handle_of(&self, address: &Address) -> String {
        self.accounts
            .iter()
            .find(|a| &a.address == address)
            .map_or_else(|| format!("{address:?}"), |a| a.handle.clone())
    }

    /// Faucet: mint `amount` stroops of the bond token to `address`.
    pub fn fund(&self, address: &Address, amount: i128) -> Result<i128, HarnessError> {
        let minter = token::StellarAssetClient::new(&self.env, &self.token);
        settle_host("faucet", minter.try_mint(address, &amount))?;
        self.balance(address)
    }

    pub fn balance(&self, address: &Address) -> Result<i128, HarnessError> {
        settle_host("balance", self.token_client().try_balance(address))
    }

    /// Funds held in escrow by the trust contract.
    pub fn escrow_balance(&self) -> Result<i128, HarnessError> {
        self.balance(&self.trust)
    }

    /// Register `domain` for `owner` in the name registry.
    pub fn register_domain(&self, owner: &Account, domain: &str) -> Result<(), HarnessError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| HarnessError::Config("no name registry deployed".into()))?;
        self.begin_tx();
        let expires_at = self.now().saturating_add(self.domain_ttl);
        let client = NameRegistryClient::new(&self.env, registry);
        settle_with(
            "register_domain",
            client.try_register(
                &owner.address,
                &SorobanString::from_str(&self.env, domain),
                &expires_at,
            ),
            |error| HarnessError::RegistryRejected {
                op: "register_domain",
                error,
            },
        )?;
        info!(domain, owner = %owner.handle, expires_at, "domain registered");
        Ok(())
    }

    /// Start a transaction: the ledger clock moves forward one step.
    pub fn begin_tx(&self) {
        let step = self.clock_step;
        self.env
            .ledger()
            .with_mut(|li| li.timestamp = li.timestamp.saturating_add(step));
    }

    /// Hand the objects a transaction touched to the indexer.
    pub fn commit(
        &mut self,
        created: &[ObjectRef],
        mutated: &[ObjectRef],
    ) -> Result<TxEffects, HarnessError> {
        let mut effects = TxEffects::default();
        for &object in created {
            effects.created.push((object, self.index(object)?));
        }
        for &object in mutated {
            effects.mutated.push((object, self.index(object)?));
        }
        debug!(?effects, "transaction committed");
        Ok(effects)
    }

    fn index(&mut self, object: ObjectRef) -> Result<u64, HarnessError> {
        let version = self.indexer.next_version(object);
        let snapshot = self.render(object, version)?;
        Ok(self.indexer.commit(object, snapshot))
    }

    /// Read the indexed snapshot of `object`, which must be at least `min_version`.
    pub fn fetch_object(&mut self, object: ObjectRef, min_version: u64) -> Result<Value, HarnessError> {
        let wanted = min_version.max(1);
        let indexed = self
            .indexer
            .poll(object)
            .ok_or(HarnessError::NotFound(object))?;
        match indexed.snapshot {
            Some(snapshot) if indexed.version >= wanted => Ok(snapshot),
            _ => Err(HarnessError::NotYetVisible {
                object,
                wanted,
                indexed: indexed.version,
            }),
        }
    }

    fn render(&self, object: ObjectRef, version: u64) -> Result<Value, HarnessError> {
        let trust = self.trust_client();
        match object {
            ObjectRef::Profile(id) => {
                let profile = settle("get_profile", trust.try_get_profile(&id))?;
                Ok(self.profile_json(&profile, version))
            }
            ObjectRef::Bond(id) => {
                let bond = settle("get_bond", trust.try_get_bond(&id))?;
                Ok(self.bond_json(&bond, version))
            }
        }
    }

    fn profile_json(&self, p: &TrustProfile, version: u64) -> Value {
        json!({
            "id": p.id.to_string(),
            "owner": self.handle_of(&p.owner),
            "name": to_std_string(&p.name),
            "trust_score": p.trust_score.to_string(),
            "total_bonds": p.total_bonds.to_string(),
            "active_bonds": p.active_bonds.to_string(),
            "withdrawn_bonds": p.withdrawn_bonds.to_string(),
            "broken_bonds": p.broken_bonds.to_string(),
            "money_in_active_bonds": p.money_in_active_bonds.to_string(),
            "money_in_withdrawn_bonds": p.money_in_withdrawn_bonds.to_string(),
            "money_in_broken_bonds": p.money_in_broken_bonds.to_string(),
            "created_at": p.created_at.to_string(),
            "updated_at": p.updated_at.to_string(),
            "version": version.to_string(),
        })
    }

    fn bond_json(&self, b: &TrustBond, version: u64) -> Value {
        json!({
            "id": b.id.to_string(),
            "user_1": self.handle_of(&b.user_1),
            "user_2": self.handle_of(&b.user_2),
            "bond_type": b.bond_type as u32,
            "bond_status": b.bond_status as u32,
            "money_by_user_1": b.money_by_user_1.to_string(),
            "money_by_user_2": b.money_by_user_2.to_string(),
            "joined": b.joined,
            "created_at": b.created_at.to_string(),
            "updated_at": b.updated_at.to_string(),
            "version": version.to_string(),
        })
    }
}

pub(crate) fn to_std_string(s: &SorobanString) -> String {
    let mut buf = vec![0_u8; s.len() as usize];
    s.copy_into_slice(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
