//! Command line surface
//!
//! `Args` mirrors the positional invocation
//! `depbump <REPOSITORY_PATH> <PACKAGE> <BEFORE_VERSION> <AFTER_VERSION>`
//! plus optional overrides of the configuration file.

pub mod orchestration;

use std::path::PathBuf;

use crate::config::Config;
use crate::domain::BumpRequest;

#[derive(clap::Parser, Debug, Clone, PartialEq)]
#[command(
    name = "depbump",
    version,
    about = "Bump a dependency in a package manifest and open a pull request"
)]
pub struct Args {
    #[arg(help = "Path to the repository working copy")]
    pub repository_path: PathBuf,

    #[arg(help = "Name of the dependency to bump")]
    pub package_name: String,

    #[arg(help = "Version range currently recorded in the manifest")]
    pub before_version: String,

    #[arg(help = "Version range to record")]
    pub after_version: String,

    #[arg(short, long, help = "Custom configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Remote to sync with and push to")]
    pub remote: Option<String>,

    #[arg(long, help = "Base branch of the pull request")]
    pub base: Option<String>,

    #[arg(long, help = "Manifest path relative to the repository root")]
    pub manifest: Option<String>,

    #[arg(long, help = "Pull request description")]
    pub body: Option<String>,

    #[arg(short, long, help = "Enable debug logging")]
    pub verbose: bool,
}

impl Args {
    pub fn bump_request(&self) -> BumpRequest {
        BumpRequest::new(
            self.repository_path.clone(),
            self.package_name.clone(),
            self.before_version.clone(),
            self.after_version.clone(),
        )
    }

    /// Apply command line overrides on top of file configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(remote) = &self.remote {
            config.remote = remote.clone();
        }
        if let Some(base) = &self.base {
            config.default_branch = Some(base.clone());
        }
        if let Some(manifest) = &self.manifest {
            config.manifest = manifest.clone();
        }
        if let Some(body) = &self.body {
            config.pull_request.body = body.clone();
        }
    }
}
