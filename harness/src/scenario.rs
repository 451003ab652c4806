//! End-to-end scenarios run against the sandbox ledger.
//!
//! Each scenario creates its own accounts, drives the contract through the
//! client, and checks every indexed snapshot it reads. A failed expectation
//! aborts the scenario with [`HarnessError::Assertion`].

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::Serialize;
use tracing::info;
use trust_bond::trust_score::{BASE_TRUST_SCORE, BREAK_PENALTY, JOIN_REWARD};

use crate::amount::to_display;
use crate::client::TrustClient;
use crate::error::HarnessError;
use crate::sandbox::Account;
use crate::snapshot::{BondKind, BondState, BondView, ProfileView};
use crate::visibility::Sleeper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Profile, bond, optional join, withdraw, optional break.
    Lifecycle,
    /// Join reward followed by break penalty.
    TrustScore,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub name: &'static str,
    pub status: StepStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: &'static str,
    pub steps: Vec<StepReport>,
    pub profiles: Vec<ProfileView>,
    pub bond: Option<BondView>,
    /// Display-unit balances by account label, plus `escrow`.
    pub balances: BTreeMap<String, String>,
}

impl ScenarioReport {
    fn new(scenario: &'static str) -> Self {
        Self {
            scenario,
            steps: Vec::new(),
            profiles: Vec::new(),
            bond: None,
            balances: BTreeMap::new(),
        }
    }

    fn pass(&mut self, name: &'static str, detail: impl Into<String>) {
        let detail = detail.into();
        info!(scenario = self.scenario, step = name, %detail, "step passed");
        self.steps.push(StepReport {
            name,
            status: StepStatus::Passed,
            detail,
        });
    }

    fn skip(&mut self, name: &'static str, reason: impl Into<String>) {
        let detail = reason.into();
        info!(scenario = self.scenario, step = name, %detail, "step skipped");
        self.steps.push(StepReport {
            name,
            status: StepStatus::Skipped,
            detail,
        });
    }

    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.name == name)
    }

    fn record_balances<S: Sleeper>(
        &mut self,
        client: &TrustClient<S>,
        accounts: &[&Account],
    ) -> Result<(), HarnessError> {
        for account in accounts {
            let balance = client.balance(account)?;
            self.balances.insert(account.label.clone(), to_display(balance));
        }
        let escrow = client.sandbox().escrow_balance()?;
        self.balances.insert("escrow".into(), to_display(escrow));
        Ok(())
    }
}

fn expect_eq<T: PartialEq + Debug>(what: &str, expected: T, actual: T) -> Result<(), HarnessError> {
    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::Assertion(format!(
            "{what}: expected {expected:?}, got {actual:?}"
        )))
    }
}

fn expect(what: &str, condition: bool) -> Result<(), HarnessError> {
    if condition {
        Ok(())
    } else {
        Err(HarnessError::Assertion(what.to_string()))
    }
}

fn expect_consistent(profile: &ProfileView) -> Result<(), HarnessError> {
    expect(
        &format!("bond counters of profile {} add up", profile.id),
        profile.counters_consistent(),
    )
}

pub fn run<S: Sleeper>(
    client: &mut TrustClient<S>,
    scenario: Scenario,
) -> Result<Vec<ScenarioReport>, HarnessError> {
    match scenario {
        Scenario::Lifecycle => Ok(vec![run_lifecycle(client)?]),
        Scenario::TrustScore => Ok(vec![run_trust_score(client)?]),
        Scenario::All => Ok(vec![run_lifecycle(client)?, run_trust_score(client)?]),
    }
}

/// Fund, create a profile and a bond, then walk the bond through join,
/// withdraw and break. In safe mode, steps whose preconditions are missing
/// are skipped instead of failing the run.
///
/// Participants are looked up by label, so repeated runs on one client act
/// as the same accounts. With `reuse_bond` the bond is left open and a later
/// run picks it up again.
pub fn run_lifecycle<S: Sleeper>(
    client: &mut TrustClient<S>,
) -> Result<ScenarioReport, HarnessError> {
    let config = client.config().clone();
    let amounts = client.amounts();
    let mut report = ScenarioReport::new("lifecycle");
    let user_1 = client.participant(&config.participants.user_1);
    let user_2 = client.participant(&config.participants.user_2);

    let balance = client.ensure_funded(&user_1)?;
    client.check_and_verify_balance(&user_1, amounts.bond)?;
    report.pass("fund", format!("{} holds {}", user_1.label, to_display(balance)));

    let (profile_id, created) = client.find_or_create_profile(&user_1, &user_1.label)?;
    let profile = client.get_profile_data(profile_id)?;
    if created {
        expect_eq("initial trust score", BASE_TRUST_SCORE, profile.trust_score)?;
        expect_eq("initial bond count", 0, profile.total_bonds)?;
    }
    expect_consistent(&profile)?;
    report.pass(
        "profile",
        format!("profile {profile_id} score {}", profile.trust_score),
    );

    if config.skip_domain_verification {
        report.skip("verify_domain", "domain verification disabled");
    } else {
        let verified = client.verify_domain(&user_1, &user_1.label)?;
        expect("profile name verified against the name registry", verified)?;
        report.pass("verify_domain", format!("{} owns {}", user_1.label, user_1.label));
    }

    let reused = if config.reuse_bond {
        client.find_active_bond(&user_1, &user_2)?
    } else {
        None
    };
    let bond_id = match reused {
        Some(bond_id) => {
            report.pass("bond", format!("reusing bond {bond_id}"));
            bond_id
        }
        None => {
            let bond_id = client.create_bond(&user_1, profile_id, &user_2, amounts.bond)?;
            let bond = client.get_bond_info(bond_id)?;
            expect_eq("new bond type", BondKind::OneWay, bond.bond_type)?;
            expect_eq("new bond status", BondState::Active, bond.bond_status)?;
            expect_eq("creator stake", amounts.bond, bond.money_by_user_1)?;
            expect_eq("counterparty stake", 0, bond.money_by_user_2)?;
            expect_eq("counterparty", user_2.handle.as_str(), bond.user_2.as_str())?;
            let after = client.get_profile_data(profile_id)?;
            expect_eq("active bonds", profile.active_bonds + 1, after.active_bonds)?;
            expect_consistent(&after)?;
            report.pass("bond", format!("bond {bond_id} holds {}", to_display(amounts.bond)));
            bond_id
        }
    };

    let joined = lifecycle_join(client, &mut report, &user_2, bond_id)?;

    if config.reuse_bond {
        report.skip("withdraw", format!("bond {bond_id} kept open for reuse"));
        report.skip("break", format!("bond {bond_id} kept open for reuse"));
    } else {
        lifecycle_withdraw(client, &mut report, &user_1, bond_id, profile_id)?;
        match joined {
            Some(counterparty_profile) => {
                lifecycle_break(client, &mut report, &user_2, bond_id, counterparty_profile)?;
            }
            None => report.skip("break", "bond was never joined"),
        }
    }

    report.bond = Some(client.get_bond_info(bond_id)?);
    report.profiles.push(client.get_profile_data(profile_id)?);
    if let Some(counterparty_profile) = joined {
        report.profiles.push(client.get_profile_data(counterparty_profile)?);
    }
    report.record_balances(client, &[&user_1, &user_2])?;
    Ok(report)
}

/// Join `bond_id` as `user_2`. Returns the joiner's profile id, or `None`
/// when the step was skipped.
fn lifecycle_join<S: Sleeper>(
    client: &mut TrustClient<S>,
    report: &mut ScenarioReport,
    user_2: &Account,
    bond_id: u64,
) -> Result<Option<u64>, HarnessError> {
    let amounts = client.amounts();
    let bond = client.get_bond_info(bond_id)?;
    if bond.joined {
        report.skip("join", format!("bond {bond_id} was already joined"));
        return Ok(None);
    }

    if client.config().safe_mode {
        let ready = client.has_trust_profile(user_2)?
            && client.balance(user_2)? >= amounts.join.saturating_add(amounts.fee_reserve);
        if !ready {
            report.skip("join", format!("{} has no profile or funds", user_2.label));
            return Ok(None);
        }
    } else {
        client.ensure_funded(user_2)?;
    }

    let (profile_id, _) = client.find_or_create_profile(user_2, &user_2.label)?;
    let score = client.get_trust_score(profile_id)?;
    client.join_bond(user_2, bond_id, profile_id, amounts.join)?;

    let bond = client.get_bond_info(bond_id)?;
    expect_eq("type after join", BondKind::TwoWay, bond.bond_type)?;
    expect_eq("counterparty stake", amounts.join, bond.money_by_user_2)?;
    expect("bond marked joined", bond.joined)?;
    let profile = client.get_profile_data(profile_id)?;
    expect_eq("score after join", score + JOIN_REWARD, profile.trust_score)?;
    expect_consistent(&profile)?;
    report.pass(
        "join",
        format!("{} joined with {}", user_2.label, to_display(amounts.join)),
    );
    Ok(Some(profile_id))
}

fn lifecycle_withdraw<S: Sleeper>(
    client: &mut TrustClient<S>,
    report: &mut ScenarioReport,
    user_1: &Account,
    bond_id: u64,
    profile_id: u64,
) -> Result<(), HarnessError> {
    let bond = client.get_bond_info(bond_id)?;
    let before = client.get_profile_data(profile_id)?;
    let paid = client.withdraw_bond(user_1, bond_id, profile_id)?;
    expect_eq("withdrawn amount", bond.money_by_user_1, paid)?;
    let bond = client.get_bond_info(bond_id)?;
    expect_eq("creator stake after withdraw", 0, bond.money_by_user_1)?;
    expect_eq("status after withdraw", BondState::Active, bond.bond_status)?;
    expect_eq("type after withdraw", BondKind::OneWay, bond.bond_type)?;
    let after = client.get_profile_data(profile_id)?;
    expect_eq("withdrawn bonds", before.withdrawn_bonds + 1, after.withdrawn_bonds)?;
    expect_eq(
        "money in withdrawn bonds",
        before.money_in_withdrawn_bonds + paid,
        after.money_in_withdrawn_bonds,
    )?;
    expect_consistent(&after)?;
    report.pass("withdraw", format!("{} got back {}", user_1.label, to_display(paid)));
    Ok(())
}

fn lifecycle_break<S: Sleeper>(
    client: &mut TrustClient<S>,
    report: &mut ScenarioReport,
    user_2: &Account,
    bond_id: u64,
    profile_id: u64,
) -> Result<(), HarnessError> {
    let before = client.get_profile_data(profile_id)?;
    client.break_bond(user_2, bond_id, profile_id)?;

    let bond = client.get_bond_info(bond_id)?;
    expect_eq("status after break", BondState::Broken, bond.bond_status)?;
    expect_eq("locked after break", 0, bond.locked())?;
    let after = client.get_profile_data(profile_id)?;
    expect_eq(
        "score after break",
        before.trust_score - BREAK_PENALTY,
        after.trust_score,
    )?;
    expect_eq("broken bonds", before.broken_bonds + 1, after.broken_bonds)?;
    expect_consistent(&after)?;
    report.pass(
        "break",
        format!("{} broke bond {bond_id}, score {}", user_2.label, after.trust_score),
    );
    Ok(())
}

/// Two participants with fresh profiles: the counterparty joins a bond and
/// then breaks it, moving its score from the base value up by the join
/// reward and down by the break penalty.
pub fn run_trust_score<S: Sleeper>(
    client: &mut TrustClient<S>,
) -> Result<ScenarioReport, HarnessError> {
    let config = client.config().clone();
    let amounts = client.amounts();
    let mut report = ScenarioReport::new("trust_score");
    let creator = client.create_account(&config.participants.user_1);
    let joiner = client.create_account(&config.participants.user_2);

    client.request_faucet(&creator)?;
    client.request_faucet(&joiner)?;
    let creator_profile = client.create_trust_profile(&creator, &creator.label, false)?;
    let joiner_profile = client.create_trust_profile(&joiner, &joiner.label, false)?;
    expect_eq(
        "initial score",
        BASE_TRUST_SCORE,
        client.get_trust_score(joiner_profile)?,
    )?;
    report.pass("profiles", format!("profiles {creator_profile} and {joiner_profile}"));

    let bond_id = client.create_bond(&creator, creator_profile, &joiner, amounts.bond)?;
    client.join_bond(&joiner, bond_id, joiner_profile, amounts.join)?;
    let joined_score = client.get_trust_score(joiner_profile)?;
    expect_eq("score after join", BASE_TRUST_SCORE + JOIN_REWARD, joined_score)?;
    expect_eq(
        "bond type after join",
        BondKind::TwoWay,
        client.get_bond_info(bond_id)?.bond_type,
    )?;
    report.pass("join", format!("score {joined_score}"));

    let creator_balance = client.balance(&creator)?;
    let escrow = client.sandbox().escrow_balance()?;
    client.break_bond(&joiner, bond_id, joiner_profile)?;

    let broken_score = client.get_trust_score(joiner_profile)?;
    expect_eq(
        "score after break",
        BASE_TRUST_SCORE + JOIN_REWARD - BREAK_PENALTY,
        broken_score,
    )?;
    let bond = client.get_bond_info(bond_id)?;
    expect_eq("status after break", BondState::Broken, bond.bond_status)?;
    expect_eq("locked after break", 0, bond.locked())?;

    let released = amounts.bond + amounts.join;
    expect_eq(
        "creator balance after break",
        creator_balance + released,
        client.balance(&creator)?,
    )?;
    expect_eq(
        "escrow after break",
        escrow - released,
        client.sandbox().escrow_balance()?,
    )?;

    let creator_view = client.get_profile_data(creator_profile)?;
    expect_eq("creator withdrawn bonds", 1, creator_view.withdrawn_bonds)?;
    expect_consistent(&creator_view)?;
    let joiner_view = client.get_profile_data(joiner_profile)?;
    expect_eq("joiner broken bonds", 1, joiner_view.broken_bonds)?;
    expect_eq("joiner money in broken bonds", amounts.join, joiner_view.money_in_broken_bonds)?;
    expect_consistent(&joiner_view)?;
    report.pass("break", format!("score {broken_score}"));

    report.bond = Some(bond);
    report.profiles = vec![creator_view, joiner_view];
    report.record_balances(client, &[&creator, &joiner])?;
    Ok(report)
}
