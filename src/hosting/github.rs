use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::Credentials;
use crate::error::{DepBumpError, Result};
use crate::hosting::{HostingApi, HostingSession, NewPullRequest, PullRequest};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("depbump/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API, public or Enterprise
#[derive(Debug, Clone)]
pub struct GitHubApi {
    timeout: Duration,
}

impl GitHubApi {
    pub fn new(timeout: Duration) -> Self {
        GitHubApi { timeout }
    }
}

impl Default for GitHubApi {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl HostingApi for GitHubApi {
    fn authenticate(
        &self,
        base_url: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn HostingSession>> {
        let session = GitHubSession::new(base_url, credentials.clone(), self.timeout)?;
        Ok(Box::new(session))
    }
}

/// HTTP client bound to one API base URL and one set of credentials
pub struct GitHubSession {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl GitHubSession {
    pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DepBumpError::hosting_api(format!("cannot build HTTP client: {}", e))
            })?;

        Ok(GitHubSession {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn pulls_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}/pulls", self.base_url, owner, repo)
    }
}

impl HostingSession for GitHubSession {
    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest> {
        let url = self.pulls_url(&request.owner, &request.repo);
        debug!(url = %url, head = %request.head, base = %request.base, "POST request");

        let mut body = json!({
            "title": request.title,
            "head": request.head,
            "base": request.base,
        });
        if let Some(text) = &request.body {
            body["body"] = json!(text);
        }

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(&body)
            .send()?;

        let status = response.status();
        if status.is_success() {
            return response.json::<PullRequest>().map_err(|e| {
                DepBumpError::hosting_api(format!("unexpected pull request response: {}", e))
            });
        }

        let text = response.text().unwrap_or_default();
        Err(DepBumpError::hosting_api(format!(
            "creating pull request failed ({}): {}",
            status,
            api_error_message(&text)
        )))
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Flatten a GitHub error body into one line, falling back to the raw text
fn api_error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) else {
        return body.trim().to_string();
    };

    let details: Vec<String> = parsed
        .errors
        .into_iter()
        .filter_map(|detail| detail.message.or(detail.code))
        .collect();

    if details.is_empty() {
        parsed.message
    } else {
        format!("{}: {}", parsed.message, details.join("; "))
    }
}
