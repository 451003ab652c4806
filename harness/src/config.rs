//! Harness configuration.
//!
//! Loaded from a TOML file. Every field has a default, so a partial file (or
//! no file at all) yields a usable configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::amount;
use crate::error::HarnessError;
use crate::visibility::VisibilityPolicy;

/// Top-level harness configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    /// Create profiles without consulting the name registry, and skip the
    /// domain verification step in scenarios.
    #[serde(default = "default_true")]
    pub skip_domain_verification: bool,

    /// Skip scenario steps whose preconditions are not met instead of failing.
    #[serde(default = "default_true")]
    pub safe_mode: bool,

    /// Reuse an active bond between the participants when one exists.
    #[serde(default)]
    pub reuse_bond: bool,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub amounts: AmountConfig,

    #[serde(default)]
    pub visibility: VisibilityPolicy,

    #[serde(default)]
    pub participants: ParticipantConfig,
}

/// Sandbox ledger settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LedgerConfig {
    /// Polls before a committed object version becomes visible.
    #[serde(default = "default_indexing_lag")]
    pub indexing_lag: u32,

    /// Seconds the ledger clock advances per submitted transaction.
    #[serde(default = "default_clock_step_secs")]
    pub clock_step_secs: u64,

    #[serde(default = "default_start_timestamp")]
    pub start_timestamp: u64,

    /// Deploy the name registry and wire it into the trust contract.
    #[serde(default = "default_true")]
    pub name_registry: bool,

    /// Lifetime of domains registered by scenarios, in seconds.
    #[serde(default = "default_domain_ttl_secs")]
    pub domain_ttl_secs: u64,
}

/// Display amounts used by scenarios, e.g. `"0.01"`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AmountConfig {
    #[serde(default = "default_bond_amount")]
    pub bond_amount: String,

    #[serde(default = "default_join_amount")]
    pub join_amount: String,

    /// Amount the faucet hands out per request.
    #[serde(default = "default_faucet_amount")]
    pub faucet_amount: String,

    /// Headroom required on top of a deposit before submitting it.
    #[serde(default = "default_fee_reserve")]
    pub fee_reserve: String,

    /// Balance below which a participant is topped up from the faucet.
    #[serde(default = "default_minimum_balance")]
    pub minimum_balance: String,
}

/// Names for the two scenario participants.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParticipantConfig {
    #[serde(default = "default_user_1")]
    pub user_1: String,

    #[serde(default = "default_user_2")]
    pub user_2: String,
}

/// Amounts from [`AmountConfig`] converted to stroops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Amounts {
    pub bond: i128,
    pub join: i128,
    pub faucet: i128,
    pub fee_reserve: i128,
    pub minimum_balance: i128,
}

fn default_true() -> bool {
    true
}

fn default_indexing_lag() -> u32 {
    2
}

fn default_clock_step_secs() -> u64 {
    5
}

fn default_start_timestamp() -> u64 {
    1_700_000_000
}

fn default_domain_ttl_secs() -> u64 {
    365 * 24 * 60 * 60
}

fn default_bond_amount() -> String {
    "0.01".into()
}

fn default_join_amount() -> String {
    "0.01".into()
}

fn default_faucet_amount() -> String {
    "10".into()
}

fn default_fee_reserve() -> String {
    "0.01".into()
}

fn default_minimum_balance() -> String {
    "0.1".into()
}

fn default_user_1() -> String {
    "testuser".into()
}

fn default_user_2() -> String {
    "counterparty".into()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            amounts: AmountConfig::default(),
            visibility: VisibilityPolicy::default(),
            participants: ParticipantConfig::default(),
            skip_domain_verification: true,
            safe_mode: true,
            reuse_bond: false,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            indexing_lag: default_indexing_lag(),
            clock_step_secs: default_clock_step_secs(),
            start_timestamp: default_start_timestamp(),
            name_registry: true,
            domain_ttl_secs: default_domain_ttl_secs(),
        }
    }
}

impl Default for AmountConfig {
    fn default() -> Self {
        Self {
            bond_amount: default_bond_amount(),
            join_amount: default_join_amount(),
            faucet_amount: default_faucet_amount(),
            fee_reserve: default_fee_reserve(),
            minimum_balance: default_minimum_balance(),
        }
    }
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            user_1: default_user_1(),
            user_2: default_user_2(),
        }
    }
}

impl AmountConfig {
    pub fn to_stroops(&self) -> Result<Amounts, HarnessError> {
        Ok(Amounts {
            bond: amount::to_stroops(&self.bond_amount)?,
            join: amount::to_stroops(&self.join_amount)?,
            faucet: amount::to_stroops(&self.faucet_amount)?,
            fee_reserve: amount::to_stroops(&self.fee_reserve)?,
            minimum_balance: amount::to_stroops(&self.minimum_balance)?,
        })
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, HarnessError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, HarnessError> {
        toml::from_str(s).map_err(|e| HarnessError::Config(format!("invalid TOML: {e}")))
    }

    pub fn to_toml_string(&self) -> Result<String, HarnessError> {
        toml::to_string_pretty(self).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Reject configurations the scenarios cannot run with.
    pub fn validate(&self) -> Result<Amounts, HarnessError> {
        let amounts = self.amounts.to_stroops()?;
        if amounts.bond <= 0 || amounts.join <= 0 {
            return Err(HarnessError::Config(
                "bond_amount and join_amount must be positive".into(),
            ));
        }
        if amounts.faucet <= 0 {
            return Err(HarnessError::Config("faucet_amount must be positive".into()));
        }
        if self.participants.user_1.is_empty() || self.participants.user_2.is_empty() {
            return Err(HarnessError::Config("participant names must be non-empty".into()));
        }
        if self.participants.user_1 == self.participants.user_2 {
            return Err(HarnessError::Config("participant names must differ".into()));
        }
        self.visibility.validate()?;
        Ok(amounts)
    }
}
