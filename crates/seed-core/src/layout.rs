//! On-disk layout of the private repository and the public branch.
//!
//! Private: `concepts/<Name>/<Name>_itself.md`, ledger at `authorized.json`.
//! Public: `concepts/<Name>_itself.md`, metadata at `publication_metadata.json`.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub const CONCEPTS_DIR: &str = "concepts";
pub const LEDGER_FILE: &str = "authorized.json";
pub const METADATA_FILE: &str = "publication_metadata.json";
pub const PUBLIC_README: &str = "README.md";

/// Reject names that could escape the concepts directory.
pub fn validate_concept_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.trim() != name;
    if bad {
        return Err(Error::InvalidConceptName(name.to_string()));
    }
    Ok(())
}

/// Candidate source documents for a concept, in lookup order.
pub fn source_candidates(concepts_dir: &Path, name: &str) -> [PathBuf; 2] {
    let dir = concepts_dir.join(name);
    [
        dir.join(format!("{}_itself.md", name)),
        dir.join(format!("{}.md", name)),
    ]
}

/// First existing source document for a concept.
pub fn find_source(concepts_dir: &Path, name: &str) -> Option<PathBuf> {
    source_candidates(concepts_dir, name)
        .into_iter()
        .find(|p| p.is_file())
}

pub fn published_file_name(name: &str) -> String {
    format!("{}_itself.md", name)
}

/// Repository-relative path of a published concept on the public branch.
pub fn published_path(name: &str) -> String {
    format!("{}/{}", CONCEPTS_DIR, published_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_concept_name() {
        assert!(validate_concept_name("Other_Concept").is_ok());
        assert!(validate_concept_name("Räumlich Denken").is_ok());
        assert!(validate_concept_name("").is_err());
        assert!(validate_concept_name("..").is_err());
        assert!(validate_concept_name("../etc").is_err());
        assert!(validate_concept_name("a/b").is_err());
        assert!(validate_concept_name(" padded").is_err());
    }

    #[test]
    fn test_find_source_prefers_itself() {
        let dir = tempfile::tempdir().unwrap();
        let concept = dir.path().join("Foo");
        std::fs::create_dir_all(&concept).unwrap();
        std::fs::write(concept.join("Foo.md"), "plain").unwrap();
        assert_eq!(find_source(dir.path(), "Foo"), Some(concept.join("Foo.md")));

        std::fs::write(concept.join("Foo_itself.md"), "itself").unwrap();
        assert_eq!(
            find_source(dir.path(), "Foo"),
            Some(concept.join("Foo_itself.md"))
        );
        assert_eq!(find_source(dir.path(), "Bar"), None);
    }

    #[test]
    fn test_published_path() {
        assert_eq!(published_path("Foo"), "concepts/Foo_itself.md");
    }
}
