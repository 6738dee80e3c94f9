//! Per-file content host trait

use async_trait::async_trait;
use seed_core::Result;

/// A file as stored on the content host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: Vec<u8>,
    /// Version identifier required to overwrite the file.
    pub sha: String,
}

/// Remote store that accepts single-file writes against a branch.
#[async_trait]
pub trait ContentHost: Send + Sync {
    /// Fetch a file, or `None` if it does not exist on `branch`.
    async fn get_file(&self, path: &str, branch: &str) -> Result<Option<RemoteFile>>;

    /// Create or replace a file. `prior_sha` must match the current version
    /// when the file already exists. Returns the new version identifier.
    async fn put_file(
        &self,
        path: &str,
        branch: &str,
        content: &[u8],
        message: &str,
        prior_sha: Option<&str>,
    ) -> Result<String>;
}
