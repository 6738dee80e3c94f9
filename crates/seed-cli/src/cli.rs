use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "Review, redact and publish concepts to a public branch", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage redaction rules
    #[command(subcommand)]
    Rules(RulesCommands),

    /// Review concepts in the private repository
    #[command(subcommand)]
    Concepts(ConceptsCommands),

    /// Publish authorized concepts to the public branch
    Publish {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List all rules
    List,

    /// Add or replace a rule
    Add {
        /// Exact text to redact
        term: String,

        #[arg(long, default_value = seed_security::DEFAULT_REPLACEMENT)]
        replacement: String,
    },

    /// Remove a rule
    Remove { term: String },

    /// Show what the current rules would redact in a file
    Preview {
        file: PathBuf,

        /// Characters of context around each match
        #[arg(long, default_value = "30")]
        context: usize,
    },
}

#[derive(Subcommand)]
pub enum ConceptsCommands {
    /// Register new concept directories as quarantined
    Refresh,

    /// Register new concepts and report whether the ledger changed
    Sync,

    /// List concepts
    List {
        /// Only concepts with this status (e.g. authorized, needs-revision)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show a concept's review status
    Status { name: String },

    /// Print a concept's source document
    Show { name: String },

    /// Approve a concept for publication
    Authorize {
        name: String,

        #[arg(long)]
        reviewer: Option<String>,
    },

    /// Reject a concept
    Reject {
        name: String,

        #[arg(long, default_value = "Not suitable for publication")]
        reason: String,

        #[arg(long)]
        reviewer: Option<String>,
    },

    /// Send a concept back for content changes
    NeedsRevision {
        name: String,

        #[arg(long, default_value = "Requires content revision")]
        reason: String,

        #[arg(long)]
        reviewer: Option<String>,
    },

    /// Flag a concept as needing redaction rules
    NeedsRedact {
        name: String,

        #[arg(long, default_value = "Requires redaction")]
        reason: String,

        #[arg(long)]
        reviewer: Option<String>,
    },
}
