//! Redaction for seed
//!
//! Exact-match rules ([`RedactionRuleStore`]) decide what is rewritten before
//! content leaves the private repository. [`SecretDetector`] finds likely
//! credentials so they can be turned into rules.

pub mod detector;
pub mod preview;
pub mod rules;

pub use detector::{DetectedSecret, SecretDetector};
pub use preview::RedactionPreview;
pub use rules::{DEFAULT_REPLACEMENT, Redaction, RedactionRuleStore, RuleHit};
