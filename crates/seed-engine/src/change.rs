//! Change detection against the last published baseline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use seed_core::Result;
use seed_core::layout;
use tracing::{debug, info, warn};

/// Decides which authorized concepts changed since they were last published.
///
/// Implementations own their baseline. The publisher only asks for it to be
/// advanced after a run has fully succeeded.
#[async_trait]
pub trait ChangeDetector: Send + Sync {
    async fn concepts_needing_redaction(
        &self,
        authorized: &[String],
        concepts_dir: &Path,
    ) -> Result<Vec<String>>;

    /// Record the current sources of `published` as the new baseline.
    async fn update_published_content(&self, published: &[String], concepts_dir: &Path)
        -> Result<()>;
}

const RULES_DIGEST_FILE: &str = "rules.blake3";

/// Keeps a copy of each concept's last published source under `cache_dir`
/// and compares BLAKE3 digests.
///
/// With [`watching_rules`](Self::watching_rules) the digest of the rule file
/// used for the last publication is kept too, so a rule change marks every
/// concept as changed even when its source is untouched.
pub struct MirrorChangeDetector {
    cache_dir: PathBuf,
    rules_file: Option<PathBuf>,
}

impl MirrorChangeDetector {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            rules_file: None,
        }
    }

    pub fn watching_rules(mut self, rules_file: impl Into<PathBuf>) -> Self {
        self.rules_file = Some(rules_file.into());
        self
    }

    fn mirror_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name).join(layout::published_file_name(name))
    }

    fn rules_digest_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name).join(RULES_DIGEST_FILE)
    }

    /// Digest of the current rule file. A missing file hashes as empty.
    fn rules_digest(&self) -> Result<Option<String>> {
        let Some(path) = &self.rules_file else {
            return Ok(None);
        };
        let hash = if path.is_file() {
            digest(path)?
        } else {
            blake3::hash(b"")
        };
        Ok(Some(hash.to_hex().to_string()))
    }

    fn rules_changed(&self, name: &str, current: Option<&str>) -> Result<bool> {
        let Some(current) = current else {
            return Ok(false);
        };
        let stored = self.rules_digest_path(name);
        if !stored.is_file() {
            return Ok(true);
        }
        Ok(std::fs::read_to_string(stored)?.trim() != current)
    }
}

fn digest(path: &Path) -> Result<blake3::Hash> {
    Ok(blake3::hash(&std::fs::read(path)?))
}

#[async_trait]
impl ChangeDetector for MirrorChangeDetector {
    async fn concepts_needing_redaction(
        &self,
        authorized: &[String],
        concepts_dir: &Path,
    ) -> Result<Vec<String>> {
        let rules = self.rules_digest()?;
        let mut changed = Vec::new();

        for name in authorized {
            let Some(source) = layout::find_source(concepts_dir, name) else {
                debug!("No source for {}, nothing to compare", name);
                continue;
            };

            let mirror = self.mirror_path(name);
            let needs = if mirror.is_file() {
                digest(&source)? != digest(&mirror)?
                    || self.rules_changed(name, rules.as_deref())?
            } else {
                true
            };

            if needs {
                debug!("{} changed since last publication", name);
                changed.push(name.clone());
            }
        }

        info!(
            "{} of {} authorized concepts need redaction",
            changed.len(),
            authorized.len()
        );
        Ok(changed)
    }

    async fn update_published_content(
        &self,
        published: &[String],
        concepts_dir: &Path,
    ) -> Result<()> {
        let rules = self.rules_digest()?;

        for name in published {
            let Some(source) = layout::find_source(concepts_dir, name) else {
                warn!("Source for published concept {} disappeared", name);
                continue;
            };
            let mirror = self.mirror_path(name);
            if let Some(parent) = mirror.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&source, &mirror)?;
            if let Some(rules) = &rules {
                std::fs::write(self.rules_digest_path(name), rules)?;
            }
        }

        info!("Updated published content cache for {} concepts", published.len());
        Ok(())
    }
}
