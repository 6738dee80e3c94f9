//! Scratch directory holding the files of one publication run.
//!
//! Cleared at the start of a run and left in place afterwards for inspection.

use std::path::{Path, PathBuf};

use seed_core::layout::{self, CONCEPTS_DIR, METADATA_FILE};
use seed_core::{PublicationMetadata, Result};
use tracing::debug;

pub struct StagingArea {
    root: PathBuf,
}

/// A staged file and its repository-relative path on the public branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub repo_path: String,
    pub local_path: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove anything left by a previous run and recreate the layout.
    pub fn prepare(&self) -> Result<()> {
        if self.root.exists() {
            debug!("Clearing staging area {}", self.root.display());
            std::fs::remove_dir_all(&self.root)?;
        }
        std::fs::create_dir_all(self.root.join(CONCEPTS_DIR))?;
        Ok(())
    }

    pub fn stage_concept(&self, name: &str, content: &str) -> Result<StagedFile> {
        let repo_path = layout::published_path(name);
        let local_path = self.root.join(&repo_path);
        std::fs::write(&local_path, content)?;
        Ok(StagedFile {
            repo_path,
            local_path,
        })
    }

    pub fn write_metadata(&self, metadata: &PublicationMetadata) -> Result<StagedFile> {
        let local_path = self.root.join(METADATA_FILE);
        std::fs::write(&local_path, serde_json::to_string_pretty(metadata)?)?;
        Ok(StagedFile {
            repo_path: METADATA_FILE.to_string(),
            local_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seed_core::PublicationRecord;

    #[test]
    fn test_prepare_clears_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path().join("staging"));

        staging.prepare().unwrap();
        let old = staging.stage_concept("Old", "stale").unwrap();
        assert!(old.local_path.exists());

        staging.prepare().unwrap();
        assert!(!old.local_path.exists());
        assert!(staging.root().join(CONCEPTS_DIR).is_dir());
    }

    #[test]
    fn test_stage_concept_layout() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        staging.prepare().unwrap();

        let file = staging.stage_concept("Foo", "# Foo").unwrap();
        assert_eq!(file.repo_path, "concepts/Foo_itself.md");
        assert_eq!(std::fs::read_to_string(file.local_path).unwrap(), "# Foo");
    }

    #[test]
    fn test_write_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        staging.prepare().unwrap();

        let record = PublicationRecord::new(vec!["Foo".to_string()], 1);
        let metadata = PublicationMetadata::new(&record, "public", 3, vec![]);
        let file = staging.write_metadata(&metadata).unwrap();

        assert_eq!(file.repo_path, METADATA_FILE);
        let raw = std::fs::read_to_string(file.local_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["redaction_rules_count"], 3);
    }
}
