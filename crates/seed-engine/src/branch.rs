//! Public branch lifecycle.

use std::sync::Arc;

use seed_core::Result;
use seed_core::layout::PUBLIC_README;
use seed_vcs::VersionControl;
use tracing::info;

pub const PUBLIC_README_CONTENT: &str =
    "# Public Knowledge Base\n\nAuthorized and redacted concepts from compound intelligence work.\n";
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial public branch commit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    /// Created as a history-less branch holding only the README.
    Created,
    /// Already existed; checked out and fast-forwarded.
    Updated,
}

/// Keeps a working copy of the public branch, which shares no history with
/// the private branch.
pub struct PublicBranch {
    vcs: Arc<dyn VersionControl>,
    branch: String,
}

impl PublicBranch {
    pub fn new(vcs: Arc<dyn VersionControl>, branch: impl Into<String>) -> Self {
        Self {
            vcs,
            branch: branch.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.branch
    }

    pub async fn ensure(&self) -> Result<BranchState> {
        self.vcs.clone_fresh().await?;

        if self.vcs.remote_branch_exists(&self.branch).await? {
            info!("Switching to existing {} branch", self.branch);
            self.vcs.checkout(&self.branch).await?;
            self.vcs.pull(&self.branch).await?;
            return Ok(BranchState::Updated);
        }

        info!("Creating new {} branch", self.branch);
        self.vcs.checkout_orphan(&self.branch).await?;
        std::fs::write(
            self.vcs.workdir().join(PUBLIC_README),
            PUBLIC_README_CONTENT,
        )?;
        self.vcs.add_all().await?;
        self.vcs.commit(INITIAL_COMMIT_MESSAGE).await?;
        self.vcs.push(&self.branch).await?;
        Ok(BranchState::Created)
    }
}
