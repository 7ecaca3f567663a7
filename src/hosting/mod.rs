//! Code hosting API abstraction
//!
//! The workflow only needs to open one pull request per run. [HostingApi]
//! turns credentials into an authenticated [HostingSession] for a given API
//! base URL; the session creates the pull request.
//!
//! - [github::GitHubApi]: REST implementation for github.com and Enterprise
//! - [mock::MockHostingApi]: recording fake for testing

pub mod github;
pub mod mock;

pub use github::GitHubApi;
pub use mock::MockHostingApi;

use serde::Deserialize;

use crate::config::Credentials;
use crate::error::Result;

/// Host of the public SaaS offering.
pub const PUBLIC_HOST: &str = "github.com";

/// API endpoint of the public SaaS offering.
pub const PUBLIC_API_URL: &str = "https://api.github.com";

/// Resolve the REST API base URL for a git host.
///
/// `github.com` maps to `https://api.github.com`; every other host is
/// treated as an Enterprise instance serving the API under `/api/v3`.
pub fn api_base_url(host: &str) -> String {
    if host.eq_ignore_ascii_case(PUBLIC_HOST) {
        PUBLIC_API_URL.to_string()
    } else {
        format!("https://{}/api/v3", host)
    }
}

/// Pull request to be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub owner: String,
    pub repo: String,
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: Option<String>,
}

/// Pull request as reported back by the hosting API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

/// Entry point of a hosting API
pub trait HostingApi {
    /// Build a session for `base_url` authenticated with `credentials`
    ///
    /// No network round-trip is implied; rejected credentials surface on the
    /// first request made through the session.
    fn authenticate(
        &self,
        base_url: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn HostingSession>>;
}

/// Authenticated access to a hosting API
pub trait HostingSession {
    /// Open a pull request
    ///
    /// # Returns
    /// * `Err` - On network failure, rejected authentication, or remote-side
    ///   validation (duplicate pull request, unknown branch, ...)
    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest>;
}
