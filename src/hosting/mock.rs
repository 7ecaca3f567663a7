use std::cell::RefCell;
use std::rc::Rc;

use crate::config::Credentials;
use crate::error::{DepBumpError, Result};
use crate::hosting::{HostingApi, HostingSession, NewPullRequest, PullRequest};

#[derive(Default)]
struct MockHostingState {
    authentications: Vec<(String, String)>,
    requests: Vec<NewPullRequest>,
    rejection: Option<String>,
}

/// Hosting API fake recording every authentication and pull request
#[derive(Default, Clone)]
pub struct MockHostingApi {
    state: Rc<RefCell<MockHostingState>>,
}

impl MockHostingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every pull request creation fail with `message`
    pub fn reject_with(&self, message: impl Into<String>) {
        self.state.borrow_mut().rejection = Some(message.into());
    }

    /// `(base_url, username)` of every authentication, in order
    pub fn authentications(&self) -> Vec<(String, String)> {
        self.state.borrow().authentications.clone()
    }

    pub fn requests(&self) -> Vec<NewPullRequest> {
        self.state.borrow().requests.clone()
    }
}

impl HostingApi for MockHostingApi {
    fn authenticate(
        &self,
        base_url: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn HostingSession>> {
        self.state
            .borrow_mut()
            .authentications
            .push((base_url.to_string(), credentials.username.clone()));

        Ok(Box::new(MockHostingSession {
            base_url: base_url.to_string(),
            state: Rc::clone(&self.state),
        }))
    }
}

struct MockHostingSession {
    base_url: String,
    state: Rc<RefCell<MockHostingState>>,
}

impl HostingSession for MockHostingSession {
    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = &state.rejection {
            return Err(DepBumpError::hosting_api(message.clone()));
        }

        state.requests.push(request.clone());
        let number = state.requests.len() as u64;
        let web_root = self
            .base_url
            .replace("https://api.github.com", "https://github.com")
            .replace("/api/v3", "");

        Ok(PullRequest {
            number,
            html_url: format!(
                "{}/{}/{}/pull/{}",
                web_root, request.owner, request.repo, number
            ),
        })
    }
}
