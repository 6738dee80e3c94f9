//! Version control and content hosting for seed
//!
//! - [`VersionControl`]: working-copy operations (clone, commit, push)
//! - [`ContentHost`]: single-file reads and writes against a branch
//!
//! Production backends are [`GitCli`] and [`GitHubContents`]; [`memory`]
//! provides an in-process remote implementing both.

pub mod git;
pub mod github;
pub mod host;
pub mod memory;
pub mod vcs;

pub use git::{GitCli, Identity};
pub use github::GitHubContents;
pub use host::{ContentHost, RemoteFile};
pub use memory::{MemoryHost, MemoryRemote, MemoryWorkingCopy, VcsOp};
pub use vcs::VersionControl;
