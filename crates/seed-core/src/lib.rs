//! Core domain models for seed
//!
//! This crate contains:
//! - Concept lifecycle model (ConceptStatus, ConceptEntry)
//! - Publication records, metadata and results
//! - Repository layout conventions
//! - Shared error types

pub mod concept;
pub mod error;
pub mod layout;
pub mod publication;
pub mod timestamp;

pub use concept::{ConceptEntry, ConceptStatus};
pub use error::{Error, ErrorKind, RemoteError, Result};
pub use publication::{
    PublicationMetadata, PublicationRecord, PublicationResult, RedactionSummary,
};
