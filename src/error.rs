use thiserror::Error;

/// Unified error type for depbump operations
#[derive(Error, Debug)]
pub enum DepBumpError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Version control error: {0}")]
    VersionControl(String),

    #[error("Hosting API error: {0}")]
    HostingApi(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in depbump
pub type Result<T> = std::result::Result<T, DepBumpError>;

impl From<git2::Error> for DepBumpError {
    fn from(err: git2::Error) -> Self {
        DepBumpError::VersionControl(err.message().to_string())
    }
}

impl From<reqwest::Error> for DepBumpError {
    fn from(err: reqwest::Error) -> Self {
        DepBumpError::HostingApi(err.to_string())
    }
}

impl DepBumpError {
    /// Create a configuration error with context
    pub fn configuration(msg: impl Into<String>) -> Self {
        DepBumpError::Configuration(msg.into())
    }

    /// Create a precondition error with context
    pub fn precondition(msg: impl Into<String>) -> Self {
        DepBumpError::Precondition(msg.into())
    }

    /// Create a version control error with context
    pub fn version_control(msg: impl Into<String>) -> Self {
        DepBumpError::VersionControl(msg.into())
    }

    /// Create a hosting API error with context
    pub fn hosting_api(msg: impl Into<String>) -> Self {
        DepBumpError::HostingApi(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        DepBumpError::Manifest(msg.into())
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, DepBumpError::Precondition(_))
    }
}
