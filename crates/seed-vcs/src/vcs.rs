//! Version control trait

use std::path::Path;

use async_trait::async_trait;
use seed_core::Result;

/// A local working copy of a remote repository.
///
/// Every operation acts on [`workdir`](Self::workdir). Implementations use
/// interior mutability so a working copy can be shared behind an `Arc`.
#[async_trait]
pub trait VersionControl: Send + Sync {
    fn workdir(&self) -> &Path;

    /// Discard the working copy and clone the remote again.
    async fn clone_fresh(&self) -> Result<()>;

    async fn checkout(&self, branch: &str) -> Result<()>;

    /// Start a branch with no history and an empty working tree.
    async fn checkout_orphan(&self, branch: &str) -> Result<()>;

    async fn pull(&self, branch: &str) -> Result<()>;

    /// Stage every change in the working tree.
    async fn add_all(&self) -> Result<()>;

    /// Commit staged changes. Returns `false` when there was nothing to commit.
    async fn commit(&self, message: &str) -> Result<bool>;

    async fn push(&self, branch: &str) -> Result<()>;

    async fn remote_branch_exists(&self, branch: &str) -> Result<bool>;
}
