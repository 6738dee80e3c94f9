//! Publication run records and results

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Error, ErrorKind};

pub const PUBLICATION_SOURCE: &str = "SEED v0 Publishing Platform";
pub const PUBLICATION_DESCRIPTION: &str =
    "Authorized and redacted concepts from compound intelligence work";

/// Immutable record of what a single publish run staged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub processed_concepts: Vec<String>,
    pub total_redactions: usize,
    #[serde(with = "crate::timestamp")]
    pub timestamp: OffsetDateTime,
}

impl PublicationRecord {
    pub fn new(processed_concepts: Vec<String>, total_redactions: usize) -> Self {
        Self {
            processed_concepts,
            total_redactions,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Contents of `publication_metadata.json` on the public branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationMetadata {
    pub source: String,
    pub description: String,
    pub branch: String,
    pub total_concepts: usize,
    pub total_redactions: usize,
    pub redaction_rules_count: usize,
    pub concepts: Vec<String>,
    pub redaction_summary: RedactionSummary,
    #[serde(with = "crate::timestamp")]
    pub published_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionSummary {
    /// Replacement labels (e.g. `[API_KEY_REDACTED]`) of the rules that
    /// matched during the run, not the matched terms. Terms are the sensitive
    /// values being removed, so they are never written to the public branch.
    pub rules_applied: Vec<String>,
    pub total_redactions: usize,
}

impl PublicationMetadata {
    pub fn new(
        record: &PublicationRecord,
        branch: &str,
        redaction_rules_count: usize,
        rules_applied: Vec<String>,
    ) -> Self {
        Self {
            source: PUBLICATION_SOURCE.to_string(),
            description: PUBLICATION_DESCRIPTION.to_string(),
            branch: branch.to_string(),
            total_concepts: record.processed_concepts.len(),
            total_redactions: record.total_redactions,
            redaction_rules_count,
            concepts: record.processed_concepts.clone(),
            redaction_summary: RedactionSummary {
                rules_applied,
                total_redactions: record.total_redactions,
            },
            published_at: record.timestamp,
        }
    }
}

/// Structured outcome of `publish()`. Failures carry zeroed counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationResult {
    pub success: bool,
    pub message: String,
    pub concepts_processed: usize,
    pub total_redactions: usize,
    #[serde(default)]
    pub published_concepts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PublicationResult {
    /// Successful run that published nothing.
    pub fn unchanged(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            concepts_processed: 0,
            total_redactions: 0,
            published_concepts: Vec::new(),
            public_branch: None,
            error: None,
            error_kind: None,
            warnings: Vec::new(),
        }
    }

    pub fn published(record: &PublicationRecord, branch: &str) -> Self {
        Self {
            success: true,
            message: format!(
                "Successfully published {} concepts to {} branch",
                record.processed_concepts.len(),
                branch
            ),
            concepts_processed: record.processed_concepts.len(),
            total_redactions: record.total_redactions,
            published_concepts: record.processed_concepts.clone(),
            public_branch: Some(branch.to_string()),
            error: None,
            error_kind: None,
            warnings: Vec::new(),
        }
    }

    pub fn failed(err: &Error) -> Self {
        Self {
            success: false,
            message: "Publication failed".to_string(),
            concepts_processed: 0,
            total_redactions: 0,
            published_concepts: Vec::new(),
            public_branch: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}
