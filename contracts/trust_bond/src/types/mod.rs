//! Ledger object types for trust profiles and bonds.
//!
//! Both carry their own transition methods so that every precondition is
//! checked on an in-memory copy before anything is written back to storage.

pub mod bond;
pub mod profile;

pub use bond::{BondSide, BondStatus, BondType, BreakOutcome, TrustBond};
pub use profile::TrustProfile;
