use anyhow::Result;
use seed_config::Config;
use seed_core::{ConceptEntry, ConceptStatus, Error};
use seed_storage::ConceptLedger;

use crate::cli::ConceptsCommands;

pub async fn handle(cmd: ConceptsCommands, config: &Config) -> Result<()> {
    let credentials = config.credentials()?;
    let mut ledger = super::open_ledger(config, &credentials);

    let result = match cmd {
        ConceptsCommands::Refresh => refresh(&mut ledger).await,
        ConceptsCommands::Sync => sync(&mut ledger).await,
        ConceptsCommands::List { status } => list(&mut ledger, status).await,
        ConceptsCommands::Status { name } => status(&mut ledger, &name).await,
        ConceptsCommands::Show { name } => show(&mut ledger, &name).await,
        ConceptsCommands::Authorize { name, reviewer } => {
            let entry = ledger.authorize(&name, reviewer.as_deref()).await?;
            print_transition(&entry);
            Ok(())
        }
        ConceptsCommands::Reject {
            name,
            reason,
            reviewer,
        } => {
            let entry = ledger.reject(&name, &reason, reviewer.as_deref()).await?;
            print_transition(&entry);
            Ok(())
        }
        ConceptsCommands::NeedsRevision {
            name,
            reason,
            reviewer,
        } => {
            let entry = ledger
                .mark_needs_revision(&name, &reason, reviewer.as_deref())
                .await?;
            print_transition(&entry);
            Ok(())
        }
        ConceptsCommands::NeedsRedact {
            name,
            reason,
            reviewer,
        } => {
            let entry = ledger
                .mark_needs_redact(&name, &reason, reviewer.as_deref())
                .await?;
            print_transition(&entry);
            Ok(())
        }
    };

    ledger.close();
    result
}

async fn refresh(ledger: &mut ConceptLedger) -> Result<()> {
    let registered = ledger.refresh().await?;

    if registered.is_empty() {
        println!("No new concepts.");
    } else {
        println!("✓ Registered {} new concepts as QUARANTINED:", registered.len());
        for name in registered {
            println!("  {}", name);
        }
    }

    Ok(())
}

async fn sync(ledger: &mut ConceptLedger) -> Result<()> {
    if ledger.sync().await? {
        println!("✓ Ledger synced");
    } else {
        println!("Ledger already up to date.");
    }
    Ok(())
}

async fn list(ledger: &mut ConceptLedger, status: Option<String>) -> Result<()> {
    let entries = match status {
        Some(status) => {
            let status: ConceptStatus = status.parse()?;
            ledger.list_by_status(status).await?
        }
        None => ledger.list_all().await?,
    };

    if entries.is_empty() {
        println!("No concepts found.");
        return Ok(());
    }

    println!("Concepts ({}):", entries.len());
    for entry in entries {
        println!("  {:<16} {}", entry.status, entry.concept_name);
    }

    Ok(())
}

async fn status(ledger: &mut ConceptLedger, name: &str) -> Result<()> {
    let entry = ledger
        .get_entry(name)
        .await?
        .ok_or_else(|| Error::ConceptNotFound(name.to_string()))?;

    println!("Concept: {}", entry.concept_name);
    println!("  Status: {}", entry.status);
    println!("  Updated: {}", entry.timestamp);
    if let Some(reviewer) = &entry.reviewer {
        println!("  Reviewer: {}", reviewer);
    }
    if let Some(reason) = &entry.reason {
        println!("  Reason: {}", reason);
    }

    Ok(())
}

async fn show(ledger: &mut ConceptLedger, name: &str) -> Result<()> {
    let content = ledger
        .concept_content(name)
        .await?
        .ok_or_else(|| Error::ConceptNotFound(name.to_string()))?;
    print!("{}", content);
    Ok(())
}

fn print_transition(entry: &ConceptEntry) {
    println!("✓ {} is now {}", entry.concept_name, entry.status);
    if let Some(reviewer) = &entry.reviewer {
        println!("  Reviewer: {}", reviewer);
    }
    if let Some(reason) = &entry.reason {
        println!("  Reason: {}", reason);
    }
}
