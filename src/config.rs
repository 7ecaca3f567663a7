use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{DepBumpError, Result};

/// Name of the per-repository configuration file.
pub const CONFIG_FILE_NAME: &str = "depbump.toml";

/// Base branch when neither configuration nor the remote name one.
pub const FALLBACK_BASE_BRANCH: &str = "master";

/// Represents the complete configuration for depbump.
///
/// Contains the remote and branch to work against, the manifest location,
/// pull request presentation and commit authoring overrides.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Base branch of the pull request. When unset, the branch the remote's
    /// HEAD points at is used, falling back to [FALLBACK_BASE_BRANCH].
    #[serde(default)]
    pub default_branch: Option<String>,

    /// Manifest path relative to the repository root.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Top-level manifest field holding dependency-name → version-range entries.
    #[serde(default = "default_dependency_field")]
    pub dependency_field: String,

    #[serde(default)]
    pub pull_request: PullRequestConfig,

    #[serde(default)]
    pub commit: CommitConfig,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_manifest() -> String {
    "package.json".to_string()
}

fn default_dependency_field() -> String {
    "dependencies".to_string()
}

fn default_title_prefix() -> String {
    "[Technical]".to_string()
}

/// Configuration for the pull request that is opened after the push.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PullRequestConfig {
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    #[serde(default)]
    pub body: String,
}

impl Default for PullRequestConfig {
    fn default() -> Self {
        PullRequestConfig {
            title_prefix: default_title_prefix(),
            body: String::new(),
        }
    }
}

/// Commit author override. When unset the repository's `user.name` and
/// `user.email` are used.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct CommitConfig {
    #[serde(default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub author_email: Option<String>,
}

impl CommitConfig {
    /// The configured author, if both name and email are set
    pub fn author(&self) -> Option<CommitAuthor> {
        match (&self.author_name, &self.author_email) {
            (Some(name), Some(email)) => Some(CommitAuthor {
                name: name.clone(),
                email: email.clone(),
            }),
            _ => None,
        }
    }
}

/// Identity recorded as author and committer of the bump commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl Config {
    /// Manifest path as a clean repository-relative path
    ///
    /// `.` components are dropped so the path can be staged as-is; absolute
    /// paths and `..` are rejected since the manifest must live inside the
    /// working tree.
    pub fn manifest_path(&self) -> Result<PathBuf> {
        let mut path = PathBuf::new();
        for component in Path::new(&self.manifest).components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => path.push(part),
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(DepBumpError::configuration(format!(
                        "manifest '{}' must be a path inside the repository",
                        self.manifest
                    )));
                }
            }
        }

        if path.as_os_str().is_empty() {
            return Err(DepBumpError::configuration(format!(
                "manifest '{}' does not name a file",
                self.manifest
            )));
        }
        Ok(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            remote: default_remote(),
            default_branch: None,
            manifest: default_manifest(),
            dependency_field: default_dependency_field(),
            pull_request: PullRequestConfig::default(),
            commit: CommitConfig::default(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `depbump.toml` in the repository root
/// 3. `.depbump.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, repository_path: &Path) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(repository_path),
    };

    let Some(path) = path else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| {
        DepBumpError::configuration(format!("cannot read {}: {}", path.display(), e))
    })?;

    toml::from_str(&config_str).map_err(|e| {
        DepBumpError::configuration(format!("invalid config {}: {}", path.display(), e))
    })
}

fn find_config_file(repository_path: &Path) -> Option<PathBuf> {
    let repo_config = repository_path.join(CONFIG_FILE_NAME);
    if repo_config.exists() {
        return Some(repo_config);
    }

    let user_config = dirs::config_dir()?.join(format!(".{}", CONFIG_FILE_NAME));
    user_config.exists().then_some(user_config)
}

/// Username/password pair used for both git transport and the hosting API.
///
/// The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub const USERNAME_VAR: &'static str = "GITHUB_USERNAME";
    pub const PASSWORD_VAR: &'static str = "GITHUB_PASSWORD";

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `GITHUB_USERNAME` and `GITHUB_PASSWORD` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let credentials = Credentials {
            username: lookup(Self::USERNAME_VAR).unwrap_or_default(),
            password: lookup(Self::PASSWORD_VAR).unwrap_or_default(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Fails with a configuration error if either half is missing.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(DepBumpError::configuration(format!(
                "{} is not set",
                Self::USERNAME_VAR
            )));
        }
        if self.password.is_empty() {
            return Err(DepBumpError::configuration(format!(
                "{} is not set",
                Self::PASSWORD_VAR
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
