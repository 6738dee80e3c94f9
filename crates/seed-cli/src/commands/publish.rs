use std::sync::Arc;

use anyhow::Result;
use seed_config::Config;
use seed_core::PublicationResult;
use seed_engine::{DetectorRuleAuthor, MirrorChangeDetector, Publisher};
use seed_security::SecretDetector;
use seed_vcs::{GitCli, GitHubContents};
use tracing::debug;

pub async fn handle(config: &Config, json: bool) -> Result<()> {
    // Fails before any remote component is built
    let credentials = config.credentials()?;

    let mut ledger = super::open_ledger(config, &credentials);
    let mut rules = super::open_rules(config)?;

    let public_vcs = GitCli::new(
        &credentials.url,
        Some(&credentials.token),
        &config.publish.public_workdir,
        super::identity(config),
        config.git_timeout(),
    );
    let host = GitHubContents::new(
        &credentials.url,
        &credentials.token,
        &config.publish.api_base,
        config.request_timeout(),
    )?;
    let detector = MirrorChangeDetector::new(&config.publish.cache_dir)
        .watching_rules(rules.path());

    let mut publisher = Publisher::new(
        Arc::new(public_vcs),
        config.publish.public_branch.clone(),
        Arc::new(host),
        Arc::new(detector),
        &config.publish.staging_dir,
    )?;
    if config.redaction.detect_secrets {
        let detector = SecretDetector::with_patterns(&config.extra_patterns());
        publisher = publisher.with_rule_author(Arc::new(DetectorRuleAuthor::new(detector)));
    }

    debug!(
        "Publishing {} -> {}",
        config.repository.branch, config.publish.public_branch
    );
    let result = publisher.publish(&mut ledger, &mut rules).await;
    ledger.close();
    rules.close();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    if !result.success {
        anyhow::bail!(
            "{}",
            result.error.unwrap_or_else(|| result.message.clone())
        );
    }

    Ok(())
}

fn print_result(result: &PublicationResult) {
    if result.success {
        println!("✓ {}", result.message);
    } else {
        println!("✗ {}", result.message);
    }

    if !result.published_concepts.is_empty() {
        println!("  Concepts: {}", result.published_concepts.join(", "));
        println!("  Redactions: {}", result.total_redactions);
    }
    if let Some(branch) = &result.public_branch {
        println!("  Branch: {}", branch);
    }
    for warning in &result.warnings {
        println!("  Warning: {}", warning);
    }
}
