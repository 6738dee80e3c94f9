//! Exact-match redaction rules backed by `redacted.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use seed_core::{Error, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::preview::{self, RedactionPreview};

pub const DEFAULT_REPLACEMENT: &str = "[REDACTED]";

/// Per-rule match count from a single redaction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub term: String,
    pub replacement: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    pub content: String,
    pub count: usize,
    pub hits: Vec<RuleHit>,
}

enum Segment<'a> {
    Plain(String),
    Redacted(&'a str),
}

/// Mapping of sensitive term to replacement, written through to disk on
/// every mutation.
#[derive(Debug)]
pub struct RedactionRuleStore {
    path: PathBuf,
    rules: BTreeMap<String, String>,
}

impl RedactionRuleStore {
    /// Open the store at `path`. A missing file is created empty; an
    /// unreadable or malformed one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            info!(
                "No rule file at {}, creating empty rule set",
                path.display()
            );
            let store = Self {
                path,
                rules: BTreeMap::new(),
            };
            store.persist()?;
            return Ok(store);
        }

        let content = std::fs::read_to_string(&path)?;
        let rules: BTreeMap<String, String> =
            serde_json::from_str(&content).map_err(|e| Error::CorruptStore {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if rules.contains_key("") {
            return Err(Error::CorruptStore {
                path,
                reason: "rule with empty term".to_string(),
            });
        }

        info!("Loaded {} redaction rules from {}", rules.len(), path.display());
        Ok(Self { path, rules })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_rule(&mut self, term: &str, replacement: &str) -> Result<()> {
        if term.is_empty() {
            return Err(Error::InvalidRule("term must not be empty".to_string()));
        }

        let previous = self
            .rules
            .insert(term.to_string(), replacement.to_string());

        if let Err(e) = self.persist() {
            match previous {
                Some(old) => self.rules.insert(term.to_string(), old),
                None => self.rules.remove(term),
            };
            return Err(e);
        }

        Ok(())
    }

    pub fn add_rule_default(&mut self, term: &str) -> Result<()> {
        self.add_rule(term, DEFAULT_REPLACEMENT)
    }

    /// Returns `false` when no rule exists for `term`.
    pub fn remove_rule(&mut self, term: &str) -> Result<bool> {
        let Some(replacement) = self.rules.remove(term) else {
            warn!("Term not found in redaction rules");
            return Ok(false);
        };

        if let Err(e) = self.persist() {
            self.rules.insert(term.to_string(), replacement);
            return Err(e);
        }

        Ok(true)
    }

    /// Snapshot of the current rules.
    pub fn rules(&self) -> BTreeMap<String, String> {
        self.rules.clone()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.rules.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in application order: longest term first, ties by term.
    fn ordered_rules(&self) -> Vec<(&str, &str)> {
        let mut ordered: Vec<(&str, &str)> = self
            .rules
            .iter()
            .map(|(t, r)| (t.as_str(), r.as_str()))
            .collect();
        ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        ordered
    }

    /// Apply every rule once. Text inserted by a replacement is never matched
    /// by a later rule.
    pub fn redact(&self, content: &str) -> Redaction {
        let mut segments = vec![Segment::Plain(content.to_string())];
        let mut hits = Vec::new();
        let mut total = 0;

        for (term, replacement) in self.ordered_rules() {
            let mut count = 0;
            let mut next = Vec::with_capacity(segments.len());

            for segment in segments {
                match segment {
                    Segment::Plain(text) if text.contains(term) => {
                        let mut pieces = text.split(term);
                        if let Some(first) = pieces.next() {
                            push_plain(&mut next, first);
                        }
                        for piece in pieces {
                            count += 1;
                            next.push(Segment::Redacted(replacement));
                            push_plain(&mut next, piece);
                        }
                    }
                    other => next.push(other),
                }
            }

            segments = next;

            if count > 0 {
                debug!("Redacted {} occurrences for rule -> {}", count, replacement);
                total += count;
                hits.push(RuleHit {
                    term: term.to_string(),
                    replacement: replacement.to_string(),
                    count,
                });
            }
        }

        let content = segments
            .iter()
            .map(|s| match s {
                Segment::Plain(text) => text.as_str(),
                Segment::Redacted(replacement) => replacement,
            })
            .collect();

        Redaction {
            content,
            count: total,
            hits,
        }
    }

    /// Redacted content and total match count.
    pub fn apply_redactions(&self, content: &str) -> (String, usize) {
        let redaction = self.redact(content);
        (redaction.content, redaction.count)
    }

    pub fn apply_redactions_to_file(&self, path: &Path) -> Result<(String, usize)> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.apply_redactions(&content))
    }

    /// Mirror `source` into `target`, redacting files whose extension is in
    /// `extensions`. Returns match counts keyed by relative path.
    pub fn redact_directory(
        &self,
        source: &Path,
        target: &Path,
        extensions: &[&str],
    ) -> Result<BTreeMap<String, usize>> {
        std::fs::create_dir_all(target)?;
        let mut results = BTreeMap::new();

        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches_ext = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.contains(&ext));
            if !matches_ext {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| Error::Other(e.into()))?;
            let target_file = target.join(relative);
            if let Some(parent) = target_file.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let (redacted, count) = self.apply_redactions_to_file(entry.path())?;
            std::fs::write(&target_file, redacted)?;

            let key = relative.to_string_lossy().replace('\\', "/");
            info!("Redacted {} terms in {}", count, key);
            results.insert(key, count);
        }

        Ok(results)
    }

    /// Every match the current rules would make, with surrounding context.
    pub fn preview(&self, content: &str, context_chars: usize) -> Vec<RedactionPreview> {
        preview::preview(content, &self.ordered_rules(), context_chars)
    }

    /// Release the store. Mutations are already on disk.
    pub fn close(self) {
        debug!("Closed rule store at {}", self.path.display());
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&self.rules)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(
            "Saved {} redaction rules to {}",
            self.rules.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn push_plain(segments: &mut Vec<Segment<'_>>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Plain(text.to_string()));
    }
}
