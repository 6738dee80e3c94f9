//! Concept review ledger stored as `authorized.json` in the private repository.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use seed_core::layout::{self, CONCEPTS_DIR, LEDGER_FILE};
use seed_core::{ConceptEntry, ConceptStatus, Error, Result};
use seed_vcs::VersionControl;
use serde::Deserialize;
use tracing::{debug, info, warn};

pub const DEFAULT_AUTHORIZE_REASON: &str = "Approved for publication";
pub const SYNC_MESSAGE: &str = "SEED: Sync authorized.json status updates";

/// On-disk forms accepted when reading the ledger. Only the map form is
/// ever written.
#[derive(Deserialize)]
#[serde(untagged)]
enum LedgerFile {
    Map(BTreeMap<String, ConceptEntry>),
    List(Vec<ConceptEntry>),
}

/// Status of every concept, synchronized from the remote before each use.
pub struct ConceptLedger {
    vcs: Arc<dyn VersionControl>,
    branch: String,
    entries: BTreeMap<String, ConceptEntry>,
}

impl ConceptLedger {
    pub fn new(vcs: Arc<dyn VersionControl>, branch: impl Into<String>) -> Self {
        Self {
            vcs,
            branch: branch.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn workdir(&self) -> &Path {
        self.vcs.workdir()
    }

    pub fn concepts_dir(&self) -> PathBuf {
        self.workdir().join(CONCEPTS_DIR)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.workdir().join(LEDGER_FILE)
    }

    /// Re-clone the remote, load the ledger and register every concept
    /// directory that has no entry as quarantined. New registrations are
    /// pushed immediately so a later refresh finds them. Returns the names
    /// that were newly registered.
    pub async fn refresh(&mut self) -> Result<Vec<String>> {
        self.vcs.clone_fresh().await?;
        self.vcs.checkout(&self.branch).await?;
        self.vcs.pull(&self.branch).await?;

        self.entries = load_entries(&self.ledger_path())?;

        let mut registered = Vec::new();
        for name in scan_concepts(&self.concepts_dir())? {
            if !self.entries.contains_key(&name) {
                info!("Registering new concept {} as QUARANTINED", name);
                self.entries
                    .insert(name.clone(), ConceptEntry::quarantined(&name));
                registered.push(name);
            }
        }

        if !registered.is_empty() {
            self.save()?;
            self.propagate(SYNC_MESSAGE, &registered.join(", ")).await?;
        }

        debug!(
            "Ledger refreshed: {} entries, {} new",
            self.entries.len(),
            registered.len()
        );
        Ok(registered)
    }

    /// Entries with `status`, ordered by concept name.
    pub async fn list_by_status(&mut self, status: ConceptStatus) -> Result<Vec<ConceptEntry>> {
        self.refresh().await?;
        Ok(self
            .entries
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect())
    }

    pub async fn list_all(&mut self) -> Result<Vec<ConceptEntry>> {
        self.refresh().await?;
        Ok(self.entries.values().cloned().collect())
    }

    pub async fn get_entry(&mut self, concept_name: &str) -> Result<Option<ConceptEntry>> {
        self.refresh().await?;
        Ok(self.entries.get(concept_name).cloned())
    }

    pub async fn get_status(&mut self, concept_name: &str) -> Result<Option<ConceptStatus>> {
        Ok(self.get_entry(concept_name).await?.map(|e| e.status))
    }

    /// Record a review decision and propagate it to the remote.
    ///
    /// A failure to commit or push after the ledger file was written is
    /// reported as [`Error::Diverged`]. The local write is discarded by the
    /// next refresh, so the whole transition must be repeated.
    pub async fn transition(
        &mut self,
        concept_name: &str,
        status: ConceptStatus,
        reviewer: Option<&str>,
        reason: Option<&str>,
    ) -> Result<ConceptEntry> {
        layout::validate_concept_name(concept_name)?;
        self.refresh().await?;

        let entry = self
            .entries
            .entry(concept_name.to_string())
            .or_insert_with(|| ConceptEntry::quarantined(concept_name));
        let previous = entry.status;
        entry.apply(status, reviewer, reason);
        let updated = entry.clone();

        self.save()?;

        let message = status.commit_message(concept_name, reason);
        self.propagate(&message, concept_name).await?;

        info!("{}: {} -> {}", concept_name, previous, status);
        Ok(updated)
    }

    /// Register and push newly discovered concepts. Returns `false` when
    /// the remote ledger was already complete.
    pub async fn sync(&mut self) -> Result<bool> {
        let registered = self.refresh().await?;
        if registered.is_empty() {
            debug!("Ledger already in sync");
            return Ok(false);
        }

        info!("Synced {} newly registered concepts", registered.len());
        Ok(true)
    }

    pub async fn authorize(
        &mut self,
        concept_name: &str,
        reviewer: Option<&str>,
    ) -> Result<ConceptEntry> {
        self.transition(
            concept_name,
            ConceptStatus::Authorized,
            reviewer,
            Some(DEFAULT_AUTHORIZE_REASON),
        )
        .await
    }

    pub async fn reject(
        &mut self,
        concept_name: &str,
        reason: &str,
        reviewer: Option<&str>,
    ) -> Result<ConceptEntry> {
        self.transition(concept_name, ConceptStatus::Rejected, reviewer, Some(reason))
            .await
    }

    pub async fn mark_needs_revision(
        &mut self,
        concept_name: &str,
        reason: &str,
        reviewer: Option<&str>,
    ) -> Result<ConceptEntry> {
        self.transition(
            concept_name,
            ConceptStatus::NeedsRevision,
            reviewer,
            Some(reason),
        )
        .await
    }

    pub async fn mark_needs_redact(
        &mut self,
        concept_name: &str,
        reason: &str,
        reviewer: Option<&str>,
    ) -> Result<ConceptEntry> {
        self.transition(
            concept_name,
            ConceptStatus::NeedsRedact,
            reviewer,
            Some(reason),
        )
        .await
    }

    /// Source document of a concept, if one exists in the working tree.
    pub async fn concept_content(&mut self, concept_name: &str) -> Result<Option<String>> {
        layout::validate_concept_name(concept_name)?;
        self.refresh().await?;

        match layout::find_source(&self.concepts_dir(), concept_name) {
            Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }

    pub fn close(self) {
        debug!("Closed ledger for branch {}", self.branch);
    }

    /// Commit and push the working copy. Remote failures become
    /// [`Error::Diverged`] since the ledger file is already written.
    async fn propagate(&self, message: &str, concept: &str) -> Result<()> {
        let result = async {
            self.vcs.add_all().await?;
            self.vcs.commit(message).await?;
            self.vcs.push(&self.branch).await
        }
        .await;

        result.map_err(|err| {
            warn!(
                "Ledger change for {} written locally but not propagated: {}",
                concept, err
            );
            match err {
                Error::Remote(source) => Error::Diverged {
                    concept: concept.to_string(),
                    source,
                },
                other => other,
            }
        })
    }

    /// Write through a temporary file so a crash never leaves a truncated
    /// ledger for the next commit.
    fn save(&self) -> Result<()> {
        let path = self.ledger_path();
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        debug!("Saved {} ledger entries", self.entries.len());
        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, ConceptEntry>> {
    if !path.exists() {
        debug!("No ledger at {}, starting empty", path.display());
        return Ok(BTreeMap::new());
    }

    let content = std::fs::read_to_string(path)?;
    let parsed: LedgerFile = serde_json::from_str(&content).map_err(|e| Error::CorruptStore {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let entries = match parsed {
        LedgerFile::Map(map) => map
            .into_iter()
            .map(|(name, mut entry)| {
                entry.concept_name = name.clone();
                (name, entry)
            })
            .collect(),
        LedgerFile::List(list) => {
            let mut map = BTreeMap::new();
            for entry in list {
                if entry.concept_name.is_empty() {
                    return Err(Error::CorruptStore {
                        path: path.to_path_buf(),
                        reason: "list entry without concept_name".to_string(),
                    });
                }
                if map.contains_key(&entry.concept_name) {
                    warn!(
                        "Duplicate ledger entry for {}, keeping the later one",
                        entry.concept_name
                    );
                }
                map.insert(entry.concept_name.clone(), entry);
            }
            map
        }
    };

    Ok(entries)
}

/// Names of concept directories, sorted.
fn scan_concepts(concepts_dir: &Path) -> Result<Vec<String>> {
    if !concepts_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(concepts_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!("Skipping non UTF-8 concept directory {:?}", entry.file_name());
            continue;
        };
        if layout::validate_concept_name(&name).is_err() {
            debug!("Skipping directory {:?}", name);
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}
