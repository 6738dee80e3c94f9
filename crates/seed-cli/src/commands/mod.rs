pub mod completions;
pub mod concepts;
pub mod publish;
pub mod rules;

use std::sync::Arc;

use anyhow::Result;
use seed_config::{Config, Credentials};
use seed_security::RedactionRuleStore;
use seed_storage::ConceptLedger;
use seed_vcs::{GitCli, Identity};

pub fn identity(config: &Config) -> Identity {
    Identity {
        name: config.identity.name.clone(),
        email: config.identity.email.clone(),
    }
}

pub fn open_rules(config: &Config) -> Result<RedactionRuleStore> {
    Ok(RedactionRuleStore::open(&config.redaction.rules_file)?)
}

/// Ledger over a git working copy of the private branch.
pub fn open_ledger(config: &Config, credentials: &Credentials) -> ConceptLedger {
    let vcs = GitCli::new(
        &credentials.url,
        Some(&credentials.token),
        &config.repository.workdir,
        identity(config),
        config.git_timeout(),
    );
    ConceptLedger::new(Arc::new(vcs), config.repository.branch.clone())
}
