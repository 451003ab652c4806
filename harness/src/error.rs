//! Error types for the trust harness.

use std::fmt::Debug;

use serde::Serialize;
use thiserror::Error;
use trust_bond::Error as TrustError;

use crate::amount::AmountError;
use crate::indexer::ObjectRef;
use crate::snapshot::DecodeError;

/// Coarse classification of a failure, used for retry decisions and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientFunds,
    PreconditionViolation,
    NotFound,
    TransientUnavailable,
    Decode,
    Config,
    Invoke,
    Assertion,
}

/// Errors that can occur while driving the ledger.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Client-side balance check failed before submission.
    #[error("insufficient balance for {account}: need {needed} stroops, have {available}")]
    InsufficientFunds {
        account: String,
        needed: i128,
        available: i128,
    },

    /// The trust bond contract rejected the call.
    #[error("{op} rejected by trust contract: {error:?}")]
    Rejected { op: &'static str, error: TrustError },

    /// The name registry rejected the call.
    #[error("{op} rejected by name registry: {error:?}")]
    RegistryRejected {
        op: &'static str,
        error: name_service::Error,
    },

    /// The object was never committed to the ledger.
    #[error("{0} not found")]
    NotFound(ObjectRef),

    /// The indexer has not caught up with the wanted version yet.
    #[error("{object} not yet visible: want version {wanted}, indexed {indexed}")]
    NotYetVisible {
        object: ObjectRef,
        wanted: u64,
        indexed: u64,
    },

    #[error("snapshot decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("configuration error: {0}")]
    Config(String),

    /// Host-level failure that carries no contract error code.
    #[error("{op} failed in host: {detail}")]
    Invoke { op: &'static str, detail: String },

    /// A scenario expectation did not hold.
    #[error("assertion failed: {0}")]
    Assertion(String),
}

impl HarnessError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Rejected { error, .. } => match error {
                TrustError::InsufficientFunds => ErrorKind::InsufficientFunds,
                TrustError::ProfileNotFound | TrustError::BondNotFound => ErrorKind::NotFound,
                _ => ErrorKind::PreconditionViolation,
            },
            Self::RegistryRejected { error, .. } => match error {
                name_service::Error::DomainNotFound => ErrorKind::NotFound,
                _ => ErrorKind::PreconditionViolation,
            },
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotYetVisible { .. } => ErrorKind::TransientUnavailable,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Amount(_) | Self::Config(_) => ErrorKind::Config,
            Self::Invoke { .. } => ErrorKind::Invoke,
            Self::Assertion(_) => ErrorKind::Assertion,
        }
    }

    /// Only transient errors are worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientUnavailable
    }

    /// The contract error code, when the trust contract rejected the call.
    #[must_use]
    pub fn contract_error(&self) -> Option<TrustError> {
        match self {
            Self::Rejected { error, .. } => Some(*error),
            _ => None,
        }
    }
}

/// Unpack the nested result of a generated `try_*` contract call.
///
/// The outer error is the call failing: `Ok(e)` carries the contract's own
/// error value, `Err(_)` a host failure. The inner error is a return value
/// that did not convert.
pub(crate) fn settle_with<T, C, E, I>(
    op: &'static str,
    result: Result<Result<T, C>, Result<E, I>>,
    reject: impl FnOnce(E) -> HarnessError,
) -> Result<T, HarnessError>
where
    C: Debug,
    I: Debug,
{
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(conversion)) => Err(HarnessError::Invoke {
            op,
            detail: format!("unexpected return value: {conversion:?}"),
        }),
        Err(Ok(error)) => Err(reject(error)),
        Err(Err(invoke)) => Err(HarnessError::Invoke {
            op,
            detail: format!("{invoke:?}"),
        }),
    }
}

/// [`settle_with`] for trust contract entry points returning `Result<_, Error>`.
pub(crate) fn settle<T, C, I>(
    op: &'static str,
    result: Result<Result<T, C>, Result<TrustError, I>>,
) -> Result<T, HarnessError>
where
    C: Debug,
    I: Debug,
{
    settle_with(op, result, |error| HarnessError::Rejected { op, error })
}

/// [`settle_with`] for calls whose only errors come from the host.
pub(crate) fn settle_host<T, C, E, I>(
    op: &'static str,
    result: Result<Result<T, C>, Result<E, I>>,
) -> Result<T, HarnessError>
where
    C: Debug,
    E: Debug,
    I: Debug,
{
    settle_with(op, result, |error| HarnessError::Invoke {
        op,
        detail: format!("{error:?}"),
    })
}
