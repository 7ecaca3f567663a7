use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use git2::Oid;

use crate::error::{DepBumpError, Result};
use crate::git::{MergeOutcome, Repository};

/// Operations of [MockRepository] that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Status,
    Checkout,
    RemoteUrl,
    Fetch,
    Merge,
    CreateBranch,
    Commit,
    Push,
}

/// A call received by [MockRepository], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Status,
    Checkout(String),
    RemoteUrl(String),
    DefaultBranch(String),
    Fetch(String),
    Merge { local: String, remote_branch: String },
    CreateBranch(String),
    Commit { paths: Vec<PathBuf>, message: String },
    Push { remote: String, branch: String },
}

impl MockCall {
    /// Whether the call changes repository state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            MockCall::Checkout(_)
                | MockCall::Fetch(_)
                | MockCall::Merge { .. }
                | MockCall::CreateBranch(_)
                | MockCall::Commit { .. }
                | MockCall::Push { .. }
        )
    }
}

struct MockState {
    changed_paths: Vec<String>,
    remote_urls: HashMap<String, String>,
    remote_head: Option<String>,
    branches: HashMap<String, Oid>,
    head: Option<String>,
    merge_outcome: MergeOutcome,
    failures: HashMap<MockOperation, String>,
    calls: Vec<MockCall>,
    next_oid: u8,
}

/// Mock repository for testing without actual git operations
///
/// Branches are plain name → OID entries; commits allocate synthetic OIDs.
/// The working directory is real so manifest edits can be observed.
pub struct MockRepository {
    workdir: PathBuf,
    state: RefCell<MockState>,
}

impl MockRepository {
    /// Create a mock repository whose working tree lives at `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        MockRepository {
            workdir: workdir.into(),
            state: RefCell::new(MockState {
                changed_paths: Vec::new(),
                remote_urls: HashMap::new(),
                remote_head: None,
                branches: HashMap::new(),
                head: None,
                merge_outcome: MergeOutcome::UpToDate,
                failures: HashMap::new(),
                calls: Vec::new(),
                next_oid: 1,
            }),
        }
    }

    /// Add a local branch pointing to an OID
    pub fn add_branch(&mut self, name: impl Into<String>, oid: Oid) {
        self.state.get_mut().branches.insert(name.into(), oid);
    }

    /// Configure a remote URL
    pub fn set_remote_url(&mut self, remote: impl Into<String>, url: impl Into<String>) {
        self.state
            .get_mut()
            .remote_urls
            .insert(remote.into(), url.into());
    }

    /// Branch advertised as the remote's HEAD
    pub fn set_remote_head(&mut self, branch: impl Into<String>) {
        self.state.get_mut().remote_head = Some(branch.into());
    }

    /// Report a path as changed in the working tree
    pub fn add_changed_path(&mut self, path: impl Into<String>) {
        self.state.get_mut().changed_paths.push(path.into());
    }

    pub fn set_merge_outcome(&mut self, outcome: MergeOutcome) {
        self.state.get_mut().merge_outcome = outcome;
    }

    /// Make an operation fail with the given message
    pub fn fail_on(&mut self, operation: MockOperation, message: impl Into<String>) {
        self.state
            .get_mut()
            .failures
            .insert(operation, message.into());
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.borrow().calls.clone()
    }

    /// Currently checked out branch
    pub fn head_branch(&self) -> Option<String> {
        self.state.borrow().head.clone()
    }

    pub fn branch_oid(&self, name: &str) -> Option<Oid> {
        self.state.borrow().branches.get(name).copied()
    }

    fn record(&self, call: MockCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn check(&self, operation: MockOperation) -> Result<()> {
        match self.state.borrow().failures.get(&operation) {
            Some(message) => Err(DepBumpError::version_control(message.clone())),
            None => Ok(()),
        }
    }

    fn head_oid(&self) -> Result<Oid> {
        let state = self.state.borrow();
        state
            .head
            .as_ref()
            .and_then(|head| state.branches.get(head))
            .copied()
            .ok_or_else(|| DepBumpError::version_control("HEAD does not point at a branch"))
    }
}

impl Repository for MockRepository {
    fn workdir(&self) -> Result<PathBuf> {
        Ok(self.workdir.clone())
    }

    fn status(&self) -> Result<Vec<String>> {
        self.record(MockCall::Status);
        self.check(MockOperation::Status)?;
        Ok(self.state.borrow().changed_paths.clone())
    }

    fn checkout_branch(&self, branch: &str) -> Result<()> {
        self.record(MockCall::Checkout(branch.to_string()));
        self.check(MockOperation::Checkout)?;

        let mut state = self.state.borrow_mut();
        if !state.branches.contains_key(branch) {
            return Err(DepBumpError::version_control(format!(
                "Cannot find branch '{}'",
                branch
            )));
        }
        state.head = Some(branch.to_string());
        Ok(())
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        self.record(MockCall::RemoteUrl(remote.to_string()));
        self.check(MockOperation::RemoteUrl)?;

        self.state
            .borrow()
            .remote_urls
            .get(remote)
            .cloned()
            .ok_or_else(|| {
                DepBumpError::version_control(format!("Cannot find remote '{}'", remote))
            })
    }

    fn default_branch(&self, remote: &str) -> Result<Option<String>> {
        self.record(MockCall::DefaultBranch(remote.to_string()));
        Ok(self.state.borrow().remote_head.clone())
    }

    fn fetch_all(&self, remote: &str) -> Result<()> {
        self.record(MockCall::Fetch(remote.to_string()));
        self.check(MockOperation::Fetch)
    }

    fn merge_branches(&self, local: &str, remote_branch: &str) -> Result<MergeOutcome> {
        self.record(MockCall::Merge {
            local: local.to_string(),
            remote_branch: remote_branch.to_string(),
        });
        self.check(MockOperation::Merge)?;
        Ok(self.state.borrow().merge_outcome)
    }

    fn create_branch(&self, name: &str) -> Result<Oid> {
        self.record(MockCall::CreateBranch(name.to_string()));
        self.check(MockOperation::CreateBranch)?;

        let head = self.head_oid()?;
        let mut state = self.state.borrow_mut();
        if state.branches.contains_key(name) {
            return Err(DepBumpError::version_control(format!(
                "Branch '{}' already exists",
                name
            )));
        }
        state.branches.insert(name.to_string(), head);
        Ok(head)
    }

    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<Oid> {
        self.record(MockCall::Commit {
            paths: paths.iter().map(|p| p.to_path_buf()).collect(),
            message: message.to_string(),
        });
        self.check(MockOperation::Commit)?;

        self.head_oid()?;
        let mut state = self.state.borrow_mut();
        let oid = Oid::from_bytes(&[state.next_oid; 20])?;
        state.next_oid = state.next_oid.wrapping_add(1);

        if let Some(head) = state.head.clone() {
            state.branches.insert(head, oid);
        }
        Ok(oid)
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(MockCall::Push {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        self.check(MockOperation::Push)
    }
}
