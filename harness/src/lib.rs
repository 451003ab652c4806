//! Scenario harness for the trust bond contract.
//!
//! Drives the contract the way an off-chain client would: accounts are
//! funded from a faucet, calls are submitted one at a time, and object state
//! is read back through an indexer that lags behind the ledger. Reads wait for
//! visibility with bounded exponential backoff and are decoded with a strict
//! schema before any assertion is made.

pub mod amount;
pub mod client;
pub mod config;
pub mod error;
pub mod indexer;
pub mod logging;
pub mod sandbox;
pub mod scenario;
pub mod snapshot;
pub mod visibility;

pub use client::TrustClient;
pub use config::HarnessConfig;
pub use error::{ErrorKind, HarnessError};
pub use indexer::ObjectRef;
pub use sandbox::{Account, Sandbox, TxEffects};
pub use snapshot::{BondKind, BondState, BondView, ProfileView};
pub use visibility::{RecordingSleeper, Sleeper, ThreadSleeper, VisibilityPolicy};
