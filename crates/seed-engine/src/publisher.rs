//! Publication of authorized concepts to the public branch.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use seed_core::layout;
use seed_core::{
    ConceptStatus, Error, PublicationMetadata, PublicationRecord, PublicationResult, Result,
};
use seed_security::RedactionRuleStore;
use seed_storage::ConceptLedger;
use seed_vcs::{ContentHost, VersionControl};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::author::RuleAuthor;
use crate::branch::PublicBranch;
use crate::change::ChangeDetector;
use crate::links::LinkRewriter;
use crate::staging::{StagedFile, StagingArea};

pub const NO_AUTHORIZED_MESSAGE: &str = "No authorized concepts to publish";
pub const NO_CHANGES_MESSAGE: &str = "No changes detected in authorized concepts";

/// Moves authorized concepts from the private working copy to the public
/// branch. The change baseline is only advanced after every upload succeeded.
pub struct Publisher {
    branch: PublicBranch,
    host: Arc<dyn ContentHost>,
    detector: Arc<dyn ChangeDetector>,
    author: Option<Arc<dyn RuleAuthor>>,
    staging: StagingArea,
    links: LinkRewriter,
}

impl Publisher {
    pub fn new(
        public_vcs: Arc<dyn VersionControl>,
        public_branch: impl Into<String>,
        host: Arc<dyn ContentHost>,
        detector: Arc<dyn ChangeDetector>,
        staging_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            branch: PublicBranch::new(public_vcs, public_branch),
            host,
            detector,
            author: None,
            staging: StagingArea::new(staging_dir),
            links: LinkRewriter::new()?,
        })
    }

    pub fn with_rule_author(mut self, author: Arc<dyn RuleAuthor>) -> Self {
        self.author = Some(author);
        self
    }

    pub fn public_branch(&self) -> &str {
        self.branch.name()
    }

    /// Run one publication. Never returns an error; failures are reported in
    /// the result with zeroed counters.
    pub async fn publish(
        &self,
        ledger: &mut ConceptLedger,
        rules: &mut RedactionRuleStore,
    ) -> PublicationResult {
        let span = info_span!("publish", run_id = %Uuid::new_v4());

        async {
            match self.run(ledger, rules).await {
                Ok(result) => {
                    info!("{}", result.message);
                    result
                }
                Err(e) => {
                    error!("Publication failed: {}", e);
                    PublicationResult::failed(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        ledger: &mut ConceptLedger,
        rules: &mut RedactionRuleStore,
    ) -> Result<PublicationResult> {
        let mut warnings = Vec::new();

        // 1. Authorized concepts
        let mut authorized = Vec::new();
        for entry in ledger.list_by_status(ConceptStatus::Authorized).await? {
            match layout::validate_concept_name(&entry.concept_name) {
                Ok(()) => authorized.push(entry.concept_name),
                Err(e) => {
                    warn!("Skipping ledger entry: {}", e);
                    warnings.push(e.to_string());
                }
            }
        }
        if authorized.is_empty() {
            return Ok(PublicationResult::unchanged(NO_AUTHORIZED_MESSAGE).with_warnings(warnings));
        }
        let concepts_dir = ledger.concepts_dir();

        // 2. Change detection
        let changed = self
            .detector
            .concepts_needing_redaction(&authorized, &concepts_dir)
            .await?;
        if changed.is_empty() {
            return Ok(PublicationResult::unchanged(NO_CHANGES_MESSAGE).with_warnings(warnings));
        }
        info!(
            "{} authorized concepts, {} changed",
            authorized.len(),
            changed.len()
        );

        // 3. Rule authoring for changed concepts
        if let Some(author) = &self.author {
            let added = author.author_rules(&changed, &concepts_dir, rules).await?;
            if added > 0 {
                info!("Added {} redaction rules", added);
            }
        }

        // 4. Redact and stage every authorized concept
        self.staging.prepare()?;
        let mut staged = Vec::new();
        let mut processed = Vec::new();
        let mut total_redactions = 0;
        let mut applied = BTreeSet::new();

        for name in &authorized {
            let Some(source) = layout::find_source(&concepts_dir, name) else {
                warn!("Concept file not found for {}", name);
                warnings.push(format!("Concept file not found for {}", name));
                continue;
            };

            let content = match std::fs::read_to_string(&source) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to read {}: {}", source.display(), e);
                    warnings.push(format!("Failed to read {}: {}", name, e));
                    continue;
                }
            };

            let redaction = rules.redact(&content);
            let public = self.links.rewrite(&redaction.content);
            staged.push(self.staging.stage_concept(name, &public)?);

            debug!("Staged {} with {} redactions", name, redaction.count);
            total_redactions += redaction.count;
            applied.extend(redaction.hits.into_iter().map(|hit| hit.replacement));
            processed.push(name.clone());
        }

        // 5. Something must have been staged
        if processed.is_empty() {
            return Err(Error::NothingStaged);
        }
        let record = PublicationRecord::new(processed, total_redactions);

        // 6. Public branch
        let state = self.branch.ensure().await?;
        debug!("Public branch {} {:?}", self.branch.name(), state);

        // 7. Upload staged concepts
        let mut uploaded = 0;
        for file in &staged {
            if self.upload(file, &format!("SEED: Published {}", file.repo_path)).await? {
                uploaded += 1;
            }
        }
        info!("Uploaded {} of {} staged concepts", uploaded, staged.len());

        // 8. Publication metadata
        let metadata = PublicationMetadata::new(
            &record,
            self.branch.name(),
            rules.len(),
            applied.into_iter().collect(),
        );
        let file = self.staging.write_metadata(&metadata)?;
        self.upload(&file, "SEED: Updated publication metadata").await?;

        // 9. Advance the baseline for exactly what was published
        if let Err(e) = self
            .detector
            .update_published_content(&record.processed_concepts, &concepts_dir)
            .await
        {
            warn!("Published, but failed to update change cache: {}", e);
            warnings.push(format!("Failed to update change cache: {}", e));
        }

        Ok(PublicationResult::published(&record, self.branch.name()).with_warnings(warnings))
    }

    /// Upload one staged file against the current remote version. Returns
    /// `false` when the remote already holds identical content.
    async fn upload(&self, file: &StagedFile, message: &str) -> Result<bool> {
        let content = std::fs::read(&file.local_path)?;
        let branch = self.branch.name();

        let existing = self.host.get_file(&file.repo_path, branch).await?;
        if existing.as_ref().is_some_and(|remote| remote.content == content) {
            debug!("{} unchanged on {}", file.repo_path, branch);
            return Ok(false);
        }

        let prior_sha = existing.as_ref().map(|remote| remote.sha.as_str());
        self.host
            .put_file(&file.repo_path, branch, &content, message, prior_sha)
            .await?;
        debug!("Uploaded {}", file.repo_path);
        Ok(true)
    }
}
