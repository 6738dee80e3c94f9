use std::path::Path;

use anyhow::Result;
use seed_config::Config;
use seed_security::RedactionRuleStore;

use crate::cli::RulesCommands;

pub fn handle(cmd: RulesCommands, config: &Config) -> Result<()> {
    let mut rules = super::open_rules(config)?;
    let result = match cmd {
        RulesCommands::List => list(&rules),
        RulesCommands::Add { term, replacement } => add(&mut rules, &term, &replacement),
        RulesCommands::Remove { term } => remove(&mut rules, &term),
        RulesCommands::Preview { file, context } => preview(&rules, &file, context),
    };
    rules.close();
    result
}

fn list(rules: &RedactionRuleStore) -> Result<()> {
    if rules.is_empty() {
        println!("No redaction rules.");
        return Ok(());
    }

    println!("Redaction rules ({}):", rules.len());
    for (term, replacement) in rules.rules() {
        println!("  {} -> {}", term, replacement);
    }

    Ok(())
}

fn add(rules: &mut RedactionRuleStore, term: &str, replacement: &str) -> Result<()> {
    rules.add_rule(term, replacement)?;
    println!("✓ Added rule: {} -> {}", term, replacement);
    Ok(())
}

fn remove(rules: &mut RedactionRuleStore, term: &str) -> Result<()> {
    if !rules.remove_rule(term)? {
        anyhow::bail!("No rule for '{}'", term);
    }
    println!("✓ Removed rule: {}", term);
    Ok(())
}

fn preview(rules: &RedactionRuleStore, file: &Path, context: usize) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let matches = rules.preview(&content, context);

    if matches.is_empty() {
        println!("No redactions in {}", file.display());
        return Ok(());
    }

    println!("Redactions in {} ({}):", file.display(), matches.len());
    for m in matches {
        println!("  @{} {} -> {}", m.position, m.term, m.replacement);
        println!("    ...{}...", m.context);
    }

    Ok(())
}
