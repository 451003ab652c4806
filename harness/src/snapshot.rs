//! Strict decoding of object snapshots returned by the ledger endpoint.
//!
//! Snapshots are JSON objects. Integer fields may arrive either as JSON
//! numbers or as decimal strings (the endpoint renders u64 and i128 as
//! strings). Any missing field, wrong type, or unknown enum code is an error;
//! nothing falls back to a default.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("snapshot is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` should be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field `{field}` has unparsable value {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field `{field}` has unknown code {code}")]
    UnknownCode { field: &'static str, code: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BondKind {
    OneWay,
    TwoWay,
}

impl BondKind {
    #[must_use]
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::OneWay),
            1 => Some(Self::TwoWay),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BondState {
    Active,
    Withdrawn,
    Broken,
}

impl BondState {
    #[must_use]
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Active),
            1 => Some(Self::Withdrawn),
            2 => Some(Self::Broken),
            _ => None,
        }
    }
}

/// Decoded trust profile snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub id: u64,
    pub owner: String,
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
    pub version: u64,
}

impl ProfileView {
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        let obj = as_object(value)?;
        Ok(Self {
            id: u64_field(obj, "id")?,
            owner: str_field(obj, "owner")?,
            name: str_field(obj, "name")?,
            trust_score: i64_field(obj, "trust_score")?,
            total_bonds: u64_field(obj, "total_bonds")?,
            active_bonds: u64_field(obj, "active_bonds")?,
            withdrawn_bonds: u64_field(obj, "withdrawn_bonds")?,
            broken_bonds: u64_field(obj, "broken_bonds")?,
            money_in_active_bonds: i128_field(obj, "money_in_active_bonds")?,
            money_in_withdrawn_bonds: i128_field(obj, "money_in_withdrawn_bonds")?,
            money_in_broken_bonds: i128_field(obj, "money_in_broken_bonds")?,
            created_at: u64_field(obj, "created_at")?,
            updated_at: u64_field(obj, "updated_at")?,
            version: u64_field(obj, "version")?,
        })
    }

    /// `total == active + withdrawn + broken`, without overflow.
    #[must_use]
    pub fn counters_consistent(&self) -> bool {
        self.active_bonds
            .checked_add(self.withdrawn_bonds)
            .and_then(|v| v.checked_add(self.broken_bonds))
            == Some(self.total_bonds)
    }
}

/// Decoded trust bond snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BondView {
    pub id: u64,
    pub user_1: String,
    pub user_2: String,
    pub bond_type: BondKind,
    pub bond_status: BondState,
    pub money_by_user_1: i128,
    pub money_by_user_2: i128,
    pub joined: bool,
    pub created_at: u64,
    pub updated_at: u64,
    pub version: u64,
}

impl BondView {
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        let obj = as_object(value)?;
        let type_code = u64_field(obj, "bond_type")?;
        let status_code = u64_field(obj, "bond_status")?;
        Ok(Self {
            id: u64_field(obj, "id")?,
            user_1: str_field(obj, "user_1")?,
            user_2: str_field(obj, "user_2")?,
            bond_type: BondKind::from_code(type_code).ok_or(DecodeError::UnknownCode {
                field: "bond_type",
                code: type_code,
            })?,
            bond_status: BondState::from_code(status_code).ok_or(DecodeError::UnknownCode {
                field: "bond_status",
                code: status_code,
            })?,
            money_by_user_1: i128_field(obj, "money_by_user_1")?,
            money_by_user_2: i128_field(obj, "money_by_user_2")?,
            joined: bool_field(obj, "joined")?,
            created_at: u64_field(obj, "created_at")?,
            updated_at: u64_field(obj, "updated_at")?,
            version: u64_field(obj, "version")?,
        })
    }

    #[must_use]
    pub fn locked(&self) -> i128 {
        self.money_by_user_1.saturating_add(self.money_by_user_2)
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, DecodeError> {
    value.as_object().ok_or(DecodeError::NotAnObject)
}

fn field<'a>(obj: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, DecodeError> {
    obj.get(name).ok_or(DecodeError::MissingField(name))
}

fn str_field(obj: &Map<String, Value>, name: &'static str) -> Result<String, DecodeError> {
    field(obj, name)?
        .as_str()
        .map(str::to_owned)
        .ok_or(DecodeError::WrongType {
            field: name,
            expected: "a string",
        })
}

fn bool_field(obj: &Map<String, Value>, name: &'static str) -> Result<bool, DecodeError> {
    field(obj, name)?.as_bool().ok_or(DecodeError::WrongType {
        field: name,
        expected: "a boolean",
    })
}

/// Integer from a JSON number or a decimal string.
fn int_field<T>(obj: &Map<String, Value>, name: &'static str) -> Result<T, DecodeError>
where
    T: std::str::FromStr,
{
    let text = match field(obj, name)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(DecodeError::WrongType {
                field: name,
                expected: "an integer or decimal string",
            })
        }
    };
    text.parse().map_err(|_| DecodeError::InvalidNumber {
        field: name,
        value: text,
    })
}

fn u64_field(obj: &Map<String, Value>, name: &'static str) -> Result<u64, DecodeError> {
    int_field(obj, name)
}

fn i64_field(obj: &Map<String, Value>, name: &'static str) -> Result<i64, DecodeError> {
    int_field(obj, name)
}

fn i128_field(obj: &Map<String, Value>, name: &'static str) -> Result<i128, DecodeError> {
    int_field(obj, name)
}
