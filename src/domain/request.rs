use std::path::PathBuf;

use super::BumpNames;

/// Input of a single bump run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpRequest {
    pub repository_path: PathBuf,
    pub package_name: String,
    pub before_version: String,
    pub after_version: String,
}

impl BumpRequest {
    pub fn new(
        repository_path: impl Into<PathBuf>,
        package_name: impl Into<String>,
        before_version: impl Into<String>,
        after_version: impl Into<String>,
    ) -> Self {
        BumpRequest {
            repository_path: repository_path.into(),
            package_name: package_name.into(),
            before_version: before_version.into(),
            after_version: after_version.into(),
        }
    }

    /// Branch name and commit message for this request
    pub fn names(&self) -> BumpNames {
        BumpNames::new(&self.package_name, &self.after_version)
    }
}
