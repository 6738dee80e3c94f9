//! Concept lifecycle domain model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, Result};

/// Review status of a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConceptStatus {
    /// Discovered but not yet reviewed
    Quarantined,
    Authorized,
    Rejected,
    NeedsRevision,
    NeedsRedact,
}

impl ConceptStatus {
    pub const ALL: [ConceptStatus; 5] = [
        ConceptStatus::Quarantined,
        ConceptStatus::Authorized,
        ConceptStatus::Rejected,
        ConceptStatus::NeedsRevision,
        ConceptStatus::NeedsRedact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptStatus::Quarantined => "QUARANTINED",
            ConceptStatus::Authorized => "AUTHORIZED",
            ConceptStatus::Rejected => "REJECTED",
            ConceptStatus::NeedsRevision => "NEEDS_REVISION",
            ConceptStatus::NeedsRedact => "NEEDS_REDACT",
        }
    }

    /// Only authorized concepts may leave the private repository.
    pub fn is_publishable(&self) -> bool {
        match self {
            ConceptStatus::Authorized => true,
            ConceptStatus::Quarantined
            | ConceptStatus::Rejected
            | ConceptStatus::NeedsRevision
            | ConceptStatus::NeedsRedact => false,
        }
    }

    /// Commit message recorded when a concept moves into this status.
    pub fn commit_message(&self, concept: &str, reason: Option<&str>) -> String {
        let suffix = reason.map(|r| format!(": {}", r)).unwrap_or_default();
        match self {
            ConceptStatus::Quarantined => format!("SEED: Quarantined {}{}", concept, suffix),
            ConceptStatus::Authorized => format!("SEED: Authorized {} for publication", concept),
            ConceptStatus::Rejected => format!("SEED: Rejected {}{}", concept, suffix),
            ConceptStatus::NeedsRevision => {
                format!("SEED: Marked {} as needs revision{}", concept, suffix)
            }
            ConceptStatus::NeedsRedact => {
                format!("SEED: Marked {} as needs redaction{}", concept, suffix)
            }
        }
    }
}

impl fmt::Display for ConceptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConceptStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        ConceptStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| Error::Other(anyhow::anyhow!("Unknown concept status: {}", s)))
    }
}

/// One ledger record. The ledger file is keyed by `concept_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptEntry {
    #[serde(default)]
    pub concept_name: String,
    pub status: ConceptStatus,
    #[serde(with = "crate::timestamp", default = "crate::timestamp::unknown")]
    pub timestamp: OffsetDateTime,
    #[serde(default)]
    pub reviewer: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ConceptEntry {
    /// Entry for a newly discovered concept.
    pub fn quarantined(concept_name: impl Into<String>) -> Self {
        Self {
            concept_name: concept_name.into(),
            status: ConceptStatus::Quarantined,
            timestamp: OffsetDateTime::now_utc(),
            reviewer: None,
            reason: None,
        }
    }

    /// Record a reviewer decision. Reviewer and reason are only overwritten
    /// when supplied.
    pub fn apply(&mut self, status: ConceptStatus, reviewer: Option<&str>, reason: Option<&str>) {
        self.status = status;
        self.timestamp = OffsetDateTime::now_utc();
        if let Some(reviewer) = reviewer {
            self.reviewer = Some(reviewer.to_string());
        }
        if let Some(reason) = reason {
            self.reason = Some(reason.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&ConceptStatus::NeedsRevision).unwrap();
        assert_eq!(json, "\"NEEDS_REVISION\"");

        let parsed: ConceptStatus = serde_json::from_str("\"NEEDS_REDACT\"").unwrap();
        assert_eq!(parsed, ConceptStatus::NeedsRedact);

        assert!(serde_json::from_str::<ConceptStatus>("\"PUBLISHED\"").is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "authorized".parse::<ConceptStatus>().unwrap(),
            ConceptStatus::Authorized
        );
        assert_eq!(
            "needs-revision".parse::<ConceptStatus>().unwrap(),
            ConceptStatus::NeedsRevision
        );
        assert!("approved".parse::<ConceptStatus>().is_err());
    }

    #[test]
    fn test_only_authorized_is_publishable() {
        let publishable: Vec<_> = ConceptStatus::ALL
            .into_iter()
            .filter(ConceptStatus::is_publishable)
            .collect();
        assert_eq!(publishable, vec![ConceptStatus::Authorized]);
    }

    #[test]
    fn test_entry_tolerates_missing_fields() {
        let entry: ConceptEntry =
            serde_json::from_str(r#"{"status": "AUTHORIZED", "extra": 1}"#).unwrap();
        assert_eq!(entry.concept_name, "");
        assert_eq!(entry.status, ConceptStatus::Authorized);
        assert_eq!(entry.timestamp, crate::timestamp::unknown());
        assert_eq!(entry.reviewer, None);
    }

    #[test]
    fn test_apply_keeps_reviewer_when_absent() {
        let mut entry = ConceptEntry::quarantined("Foo");
        entry.apply(ConceptStatus::Authorized, Some("isaac"), Some("ok"));
        entry.apply(ConceptStatus::Rejected, None, Some("leaks"));

        assert_eq!(entry.status, ConceptStatus::Rejected);
        assert_eq!(entry.reviewer.as_deref(), Some("isaac"));
        assert_eq!(entry.reason.as_deref(), Some("leaks"));
    }

    #[test]
    fn test_entry_round_trip() {
        let mut entry = ConceptEntry::quarantined("Foo");
        entry.apply(ConceptStatus::Authorized, Some("isaac"), None);

        let json = serde_json::to_string(&entry).unwrap();
        let back: ConceptEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.concept_name, entry.concept_name);
        assert_eq!(back.status, entry.status);
        assert_eq!(back.reviewer, entry.reviewer);
        assert_eq!(back.timestamp.unix_timestamp(), entry.timestamp.unix_timestamp());
    }
}
