//! Trust Score Policy
//!
//! Every profile starts at `BASE_TRUST_SCORE`. Joining a bond as the second
//! party earns `JOIN_REWARD`; breaking a bond costs `BREAK_PENALTY`. The score
//! is a signed integer with no floor or ceiling.

use soroban_sdk::{Env, Symbol};

use crate::{Error, TrustProfile};

pub const BASE_TRUST_SCORE: i64 = 100;
pub const JOIN_REWARD: i64 = 10;
pub const BREAK_PENALTY: i64 = 50;

pub fn after_join(score: i64) -> Result<i64, Error> {
    score
        .checked_add(JOIN_REWARD)
        .ok_or(Error::ArithmeticOverflow)
}

pub fn after_break(score: i64) -> Result<i64, Error> {
    score
        .checked_sub(BREAK_PENALTY)
        .ok_or(Error::ArithmeticOverflow)
}

/// Emit a score change event if the score moved.
pub fn emit_score_changed(e: &Env, profile: &TrustProfile, old_score: i64) {
    if profile.trust_score != old_score {
        e.events().publish(
            (Symbol::new(e, "trust_score_changed"), profile.id),
            (profile.owner.clone(), old_score, profile.trust_score),
        );
    }
}
