use std::cell::RefCell;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, Cred, CredentialType, ErrorCode, FetchOptions, Oid, PushOptions,
    RemoteCallbacks, Repository as Git2Repo, Signature, Status, StatusOptions,
};
use tracing::debug;

use crate::config::{CommitAuthor, Credentials};
use crate::error::{DepBumpError, Result};
use crate::git::MergeOutcome;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    credentials: Option<Credentials>,
    author: Option<CommitAuthor>,
}

impl Git2Repository {
    /// Open the repository rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::open(path).map_err(|e| {
            DepBumpError::version_control(format!(
                "'{}' is not a git repository: {}",
                path.display(),
                e.message()
            ))
        })?;

        Ok(Self::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo,
            credentials: None,
            author: None,
        }
    }

    /// Credentials offered to HTTP(S) remotes during fetch and push
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Commit identity overriding the repository's `user.name`/`user.email`
    pub fn with_author(mut self, author: Option<CommitAuthor>) -> Self {
        self.author = author;
        self
    }

    fn signature(&self) -> Result<Signature<'static>> {
        match &self.author {
            Some(author) => Ok(Signature::now(&author.name, &author.email)?),
            None => self.repo.signature().map_err(|e| {
                DepBumpError::version_control(format!(
                    "Cannot determine commit author from repository config: {}",
                    e.message()
                ))
            }),
        }
    }

    fn find_remote(&self, remote_name: &str) -> Result<git2::Remote<'_>> {
        self.repo.find_remote(remote_name).map_err(|e| {
            DepBumpError::version_control(format!(
                "Cannot find remote '{}': {}",
                remote_name,
                e.message()
            ))
        })
    }

    fn remote_callbacks(&self) -> RemoteCallbacks<'_> {
        let credentials = self.credentials.as_ref();
        let mut attempts = CredentialAttempts::default();
        let mut callbacks = RemoteCallbacks::new();

        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            attempts.next(credentials, username_from_url, allowed_types)
        });

        callbacks
    }

    /// Update working tree and index to `commit` relative to the current HEAD
    fn checkout_commit(&self, commit: &git2::Commit<'_>) -> Result<()> {
        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;
        Ok(())
    }
}

impl super::Repository for Git2Repository {
    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| DepBumpError::version_control("repository has no working directory"))
    }

    fn status(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;

        Ok(statuses
            .iter()
            .filter(|entry| {
                let status = entry.status();
                status != Status::CURRENT && !status.contains(Status::IGNORED)
            })
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect())
    }

    fn checkout_branch(&self, branch_name: &str) -> Result<()> {
        let branch = self
            .repo
            .find_branch(branch_name, BranchType::Local)
            .map_err(|e| {
                DepBumpError::version_control(format!(
                    "Cannot find branch '{}': {}",
                    branch_name,
                    e.message()
                ))
            })?;

        let reference = branch.into_reference();
        let ref_name = reference
            .name()
            .ok_or_else(|| {
                DepBumpError::version_control(format!(
                    "Branch '{}' has a non UTF-8 reference name",
                    branch_name
                ))
            })?
            .to_string();
        let commit = reference.peel_to_commit()?;

        self.checkout_commit(&commit)?;
        self.repo.set_head(&ref_name)?;

        debug!(branch = branch_name, commit = %commit.id(), "checked out branch");
        Ok(())
    }

    fn remote_url(&self, remote_name: &str) -> Result<String> {
        let remote = self.find_remote(remote_name)?;

        remote.url().map(str::to_string).ok_or_else(|| {
            DepBumpError::version_control(format!("Remote '{}' has no URL", remote_name))
        })
    }

    fn default_branch(&self, remote_name: &str) -> Result<Option<String>> {
        let head_ref = format!("refs/remotes/{}/HEAD", remote_name);
        let prefix = format!("refs/remotes/{}/", remote_name);

        match self.repo.find_reference(&head_ref) {
            Ok(reference) => Ok(reference
                .symbolic_target()
                .and_then(|target| target.strip_prefix(&prefix))
                .map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn fetch_all(&self, remote_name: &str) -> Result<()> {
        let mut remote = self.find_remote(remote_name)?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(self.remote_callbacks());

        let refspec = format!("+refs/heads/*:refs/remotes/{}/*", remote_name);
        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch_options), None)
            .map_err(|e| {
                DepBumpError::version_control(format!(
                    "Failed to fetch from remote '{}': {}",
                    remote_name,
                    e.message()
                ))
            })?;

        debug!(remote = remote_name, "fetched all branches");
        Ok(())
    }

    fn merge_branches(&self, local: &str, remote_branch: &str) -> Result<MergeOutcome> {
        let local_ref_name = format!("refs/heads/{}", local);
        let mut local_ref = self.repo.find_reference(&local_ref_name).map_err(|e| {
            DepBumpError::version_control(format!(
                "Cannot find branch '{}': {}",
                local,
                e.message()
            ))
        })?;

        let remote_ref = self
            .repo
            .find_reference(&format!("refs/remotes/{}", remote_branch))
            .map_err(|e| {
                DepBumpError::version_control(format!(
                    "Cannot find remote-tracking branch '{}': {}",
                    remote_branch,
                    e.message()
                ))
            })?;
        let incoming = self.repo.reference_to_annotated_commit(&remote_ref)?;

        let (analysis, _) = self
            .repo
            .merge_analysis_for_ref(&local_ref, &[&incoming])?;

        if analysis.is_up_to_date() {
            return Ok(MergeOutcome::UpToDate);
        }

        let remote_commit = self.repo.find_commit(incoming.id())?;

        if analysis.is_fast_forward() {
            self.checkout_commit(&remote_commit)?;
            local_ref.set_target(
                remote_commit.id(),
                &format!("fast-forward {} to {}", local, remote_branch),
            )?;
            return Ok(MergeOutcome::FastForward(remote_commit.id()));
        }

        let local_commit = local_ref.peel_to_commit()?;
        let mut index = self
            .repo
            .merge_commits(&local_commit, &remote_commit, None)?;

        if index.has_conflicts() {
            let mut conflicted = Vec::new();
            for conflict in index.conflicts()? {
                let conflict = conflict?;
                let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
                if let Some(entry) = entry {
                    conflicted.push(String::from_utf8_lossy(&entry.path).into_owned());
                }
            }

            return Err(DepBumpError::version_control(format!(
                "Merging '{}' into '{}' has conflicts: {}",
                remote_branch,
                local,
                conflicted.join(", ")
            )));
        }

        let tree_id = index.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_id)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo.checkout_tree(tree.as_object(), Some(&mut checkout))?;

        let signature = self.signature()?;
        let message = format!(
            "Merge remote-tracking branch '{}' into {}",
            remote_branch, local
        );
        let merge_oid = self.repo.commit(
            Some(local_ref_name.as_str()),
            &signature,
            &signature,
            &message,
            &tree,
            &[&local_commit, &remote_commit],
        )?;

        Ok(MergeOutcome::Merged(merge_oid))
    }

    fn create_branch(&self, name: &str) -> Result<Oid> {
        let head = self.repo.head()?.peel_to_commit()?;

        self.repo.branch(name, &head, false).map_err(|e| {
            if e.code() == ErrorCode::Exists {
                DepBumpError::version_control(format!("Branch '{}' already exists", name))
            } else {
                DepBumpError::version_control(format!(
                    "Cannot create branch '{}': {}",
                    name,
                    e.message()
                ))
            }
        })?;

        Ok(head.id())
    }

    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(path).map_err(|e| {
                DepBumpError::version_control(format!(
                    "Cannot stage '{}': {}",
                    path.display(),
                    e.message()
                ))
            })?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let parent = self.repo.head()?.peel_to_commit()?;
        let signature = self.signature()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        Ok(oid)
    }

    fn push_branch(&self, remote_name: &str, branch: &str) -> Result<()> {
        let mut remote = self.find_remote(remote_name)?;
        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
        let rejected: RefCell<Option<String>> = RefCell::new(None);

        {
            let mut callbacks = self.remote_callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    *rejected.borrow_mut() = Some(format!("{}: {}", refname, status));
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);

            remote
                .push(&[refspec.as_str()], Some(&mut push_options))
                .map_err(|e| {
                    DepBumpError::version_control(format!(
                        "Failed to push '{}' to '{}': {}",
                        branch,
                        remote_name,
                        e.message()
                    ))
                })?;
        }

        if let Some(reason) = rejected.into_inner() {
            return Err(DepBumpError::version_control(format!(
                "Remote '{}' rejected {}",
                remote_name, reason
            )));
        }

        Ok(())
    }
}


/// Key files tried after the SSH agent, relative to `~/.ssh`
const SSH_KEY_FILES: [&str; 3] = ["id_ed25519", "id_rsa", "id_ecdsa"];

/// Credentials already offered during one fetch or push
///
/// libgit2 calls the credentials callback again after every rejected
/// attempt. Each method is offered once; when all of them are used up the
/// callback fails so the operation ends with an authentication error.
#[derive(Debug, Default)]
struct CredentialAttempts {
    username: bool,
    userpass: bool,
    agent: bool,
    key_files: usize,
    default: bool,
}

impl CredentialAttempts {
    fn next(
        &mut self,
        credentials: Option<&Credentials>,
        username_from_url: Option<&str>,
        allowed_types: CredentialType,
    ) -> std::result::Result<Cred, git2::Error> {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::USERNAME) && !self.username {
            self.username = true;
            return Cred::username(username);
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) && !self.userpass {
            self.userpass = true;
            if let Some(credentials) = credentials {
                return Cred::userpass_plaintext(&credentials.username, &credentials.password);
            }
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if !self.agent {
                self.agent = true;
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }

            let ssh_dir = dirs::home_dir().map(|home| home.join(".ssh"));
            while self.key_files < SSH_KEY_FILES.len() {
                let key = SSH_KEY_FILES[self.key_files];
                self.key_files += 1;

                if let Some(path) = ssh_dir.as_ref().map(|dir| dir.join(key)) {
                    if path.exists() {
                        if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }
        }

        if allowed_types.contains(CredentialType::DEFAULT) && !self.default {
            self.default = true;
            return Cred::default();
        }

        Err(git2::Error::from_str(
            "authentication failed: every available credential was rejected",
        ))
    }
}
