//! Persistent review state for seed
//!
//! The concept ledger lives in the private repository and is synchronized
//! with the remote on every access.

pub mod ledger;

pub use ledger::{ConceptLedger, DEFAULT_AUTHORIZE_REASON, SYNC_MESSAGE};
