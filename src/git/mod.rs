//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the repository state
//! operations the bump workflow needs, so the workflow can run against a
//! real repository or against an in-memory fake.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: the real implementation using the `git2` crate
//! - [mock::MockRepository]: a recording fake for testing
//!
//! Workflow code depends on the [Repository] trait only.
//!
//! ```rust
//! # use depbump::git::Repository;
//! # fn example(repo: &dyn Repository) -> depbump::Result<()> {
//! if repo.status()?.is_empty() {
//!     repo.checkout_branch("master")?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use std::path::{Path, PathBuf};

use crate::error::Result;
use git2::Oid;

/// How a merge of a remote-tracking branch into a local branch went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Local branch already contains the remote commits
    UpToDate,
    /// Local branch was moved forward to the remote commit
    FastForward(Oid),
    /// Histories diverged and a merge commit was created
    Merged(Oid),
}

/// Repository state operations consumed by the bump workflow
///
/// Every operation is scoped to one working copy. Implementations are not
/// expected to tolerate concurrent calls against the same copy.
///
/// ## Error Handling
///
/// Implementations map their native failures (e.g. `git2::Error`) to
/// [crate::error::DepBumpError::VersionControl], keeping the native message.
pub trait Repository {
    /// Root of the working tree
    fn workdir(&self) -> Result<PathBuf>;

    /// Paths with tracked or untracked changes; empty when the tree is clean
    ///
    /// Ignored files are not reported.
    fn status(&self) -> Result<Vec<String>>;

    /// Check out an existing local branch, updating HEAD and the working tree
    ///
    /// # Returns
    /// * `Err` - If the branch does not exist or the checkout would overwrite changes
    fn checkout_branch(&self, branch: &str) -> Result<()>;

    /// URL configured for a remote
    ///
    /// # Returns
    /// * `Err` - If the remote does not exist or has no URL
    fn remote_url(&self, remote: &str) -> Result<String>;

    /// Branch that `refs/remotes/<remote>/HEAD` points at, if known
    fn default_branch(&self, remote: &str) -> Result<Option<String>>;

    /// Fetch every branch of a remote into its remote-tracking refs
    fn fetch_all(&self, remote: &str) -> Result<()>;

    /// Merge a remote-tracking branch (e.g. `origin/master`) into a local branch
    ///
    /// The local branch must be checked out.
    ///
    /// # Returns
    /// * `Err` - If the merge produces conflicts; nothing is resolved automatically
    fn merge_branches(&self, local: &str, remote_branch: &str) -> Result<MergeOutcome>;

    /// Create a branch at the current HEAD commit
    ///
    /// # Returns
    /// * `Ok(Oid)` - The commit the new branch points at
    /// * `Err` - If a branch with that name already exists
    fn create_branch(&self, name: &str) -> Result<Oid>;

    /// Stage exactly `paths` (relative to the working tree) and commit them on
    /// HEAD with the current HEAD commit as the single parent
    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<Oid>;

    /// Push a local branch to the same ref name on a remote, without force
    ///
    /// # Returns
    /// * `Err` - If the remote rejects the update (non-fast-forward, auth, ...)
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;
}
