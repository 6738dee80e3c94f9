//! Publication pipeline for seed
//!
//! Takes authorized concepts from the private working copy, redacts and
//! link-rewrites them, and publishes them to a history-less public branch.

pub mod author;
pub mod branch;
pub mod change;
pub mod links;
pub mod publisher;
pub mod staging;

pub use author::{DetectorRuleAuthor, RuleAuthor};
pub use branch::{BranchState, PublicBranch};
pub use change::{ChangeDetector, MirrorChangeDetector};
pub use links::LinkRewriter;
pub use publisher::{NO_AUTHORIZED_MESSAGE, NO_CHANGES_MESSAGE, Publisher};
pub use staging::{StagedFile, StagingArea};
