//! Main workflow orchestration logic
//!
//! Runs the bump pipeline against a [Repository] and a [HostingApi]:
//!
//! 1. Check credentials
//! 2. Require a clean working tree
//! 3. Sync the base branch with the remote
//! 4. Verify the recorded version of the package
//! 5. Create and check out the bump branch
//! 6. Rewrite the manifest
//! 7. Commit the manifest
//! 8. Push the branch
//! 9. Open the pull request
//!
//! The first failure aborts the run. Nothing is rolled back: a branch,
//! commit or push that already happened stays in place.

use std::cell::Cell;
use std::fmt;
use std::path::Path;

use git2::Oid;
use tracing::{debug, info, warn};

use crate::config::{Config, Credentials, FALLBACK_BASE_BRANCH};
use crate::domain::{BumpRequest, RepoInfo};
use crate::error::{DepBumpError, Result};
use crate::git::Repository;
use crate::hosting::{api_base_url, HostingApi, NewPullRequest, PullRequest};
use crate::manifest::Manifest;

/// Last stage a run has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowStage {
    Start,
    CredentialsChecked,
    TreeClean,
    Synced,
    VersionVerified,
    BranchCreated,
    ManifestUpdated,
    Committed,
    Pushed,
    PullRequestCreated,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Start => "start",
            WorkflowStage::CredentialsChecked => "credentials checked",
            WorkflowStage::TreeClean => "tree clean",
            WorkflowStage::Synced => "synced",
            WorkflowStage::VersionVerified => "version verified",
            WorkflowStage::BranchCreated => "branch created",
            WorkflowStage::ManifestUpdated => "manifest updated",
            WorkflowStage::Committed => "committed",
            WorkflowStage::Pushed => "pushed",
            WorkflowStage::PullRequestCreated => "pull request created",
        };
        f.write_str(name)
    }
}

/// Result of a successful bump
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOutcome {
    /// The branch that was pushed
    pub branch: String,

    /// The bump commit on that branch
    pub commit: Oid,

    /// The pull request that was opened
    pub pull_request: PullRequest,
}

/// The bump pipeline bound to its collaborators
pub struct BumpWorkflow<'a> {
    repo: &'a dyn Repository,
    hosting: &'a dyn HostingApi,
    config: &'a Config,
    credentials: Credentials,
    stage: Cell<WorkflowStage>,
}

impl<'a> BumpWorkflow<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        hosting: &'a dyn HostingApi,
        config: &'a Config,
        credentials: Credentials,
    ) -> Self {
        BumpWorkflow {
            repo,
            hosting,
            config,
            credentials,
            stage: Cell::new(WorkflowStage::Start),
        }
    }

    /// Last stage reached by the most recent run
    pub fn stage(&self) -> WorkflowStage {
        self.stage.get()
    }

    /// Run the whole pipeline for `request`
    ///
    /// # Returns
    /// * `Ok(WorkflowOutcome)` - Branch pushed and pull request opened
    /// * `Err` - The first violated precondition or collaborator failure
    pub fn run(&self, request: &BumpRequest) -> Result<WorkflowOutcome> {
        self.stage.set(WorkflowStage::Start);

        let result = self.execute(request);
        if let Err(e) = &result {
            warn!(stage = %self.stage(), error = %e, "bump aborted");
        }
        result
    }

    fn advance(&self, stage: WorkflowStage) {
        self.stage.set(stage);
        info!(stage = %stage, "stage reached");
    }

    fn execute(&self, request: &BumpRequest) -> Result<WorkflowOutcome> {
        self.credentials.validate()?;
        let manifest_path = self.config.manifest_path()?;
        self.advance(WorkflowStage::CredentialsChecked);

        let changes = self.repo.status()?;
        if !changes.is_empty() {
            return Err(DepBumpError::precondition(format!(
                "repo has uncommitted changes: {}",
                changes.join(", ")
            )));
        }
        self.advance(WorkflowStage::TreeClean);

        let remote = self.config.remote.as_str();
        let repo_info = RepoInfo::from_remote_url(&self.repo.remote_url(remote)?)?;
        let base = self.base_branch()?;
        self.sync(remote, &base)?;
        self.advance(WorkflowStage::Synced);

        let mut manifest = self.load_manifest(&manifest_path)?;
        self.verify_version(&manifest, request)?;
        self.advance(WorkflowStage::VersionVerified);

        let names = request.names();
        let base_commit = self.repo.create_branch(&names.branch)?;
        self.repo.checkout_branch(&names.branch)?;
        debug!(branch = %names.branch, base = %base_commit, "created bump branch");
        self.advance(WorkflowStage::BranchCreated);

        manifest.set_version(&request.package_name, &request.after_version)?;
        manifest.save()?;
        self.advance(WorkflowStage::ManifestUpdated);

        let commit = self
            .repo
            .commit_paths(&[manifest_path.as_path()], &names.commit_message)?;
        debug!(commit = %commit, "committed manifest");
        self.advance(WorkflowStage::Committed);

        self.repo.push_branch(remote, &names.branch)?;
        self.advance(WorkflowStage::Pushed);

        let base_url = api_base_url(&repo_info.host);
        let session = self.hosting.authenticate(&base_url, &self.credentials)?;
        let body = &self.config.pull_request.body;
        let pull_request = session.create_pull_request(&NewPullRequest {
            owner: repo_info.owner,
            repo: repo_info.name,
            head: names.branch.clone(),
            base,
            title: names.pull_request_title(&self.config.pull_request.title_prefix),
            body: (!body.is_empty()).then(|| body.clone()),
        })?;
        self.advance(WorkflowStage::PullRequestCreated);

        Ok(WorkflowOutcome {
            branch: names.branch,
            commit,
            pull_request,
        })
    }

    /// Configured base branch, else the remote's HEAD branch, else `master`
    fn base_branch(&self) -> Result<String> {
        if let Some(branch) = &self.config.default_branch {
            return Ok(branch.clone());
        }

        Ok(self
            .repo
            .default_branch(&self.config.remote)?
            .unwrap_or_else(|| FALLBACK_BASE_BRANCH.to_string()))
    }

    fn sync(&self, remote: &str, base: &str) -> Result<()> {
        self.repo.checkout_branch(base)?;
        self.repo.fetch_all(remote)?;

        let outcome = self
            .repo
            .merge_branches(base, &format!("{}/{}", remote, base))?;
        debug!(branch = base, outcome = ?outcome, "merged remote-tracking branch");
        Ok(())
    }

    fn load_manifest(&self, manifest_path: &Path) -> Result<Manifest> {
        let path = self.repo.workdir()?.join(manifest_path);
        let manifest = Manifest::load(path, self.config.dependency_field.as_str())?;
        debug!(path = %manifest.path().display(), "loaded manifest");
        Ok(manifest)
    }

    fn verify_version(&self, manifest: &Manifest, request: &BumpRequest) -> Result<()> {
        match manifest.version_of(&request.package_name) {
            Some(current) if current == request.before_version => Ok(()),
            Some(current) => Err(DepBumpError::precondition(format!(
                "{} is at {} in {}, expected {}",
                request.package_name, current, self.config.manifest, request.before_version
            ))),
            None => Err(DepBumpError::precondition(format!(
                "{} is not listed in '{}' of {}",
                request.package_name, self.config.dependency_field, self.config.manifest
            ))),
        }
    }
}
