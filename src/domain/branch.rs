/// Branch name and commit message derived from a package and target version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpNames {
    pub branch: String,
    pub commit_message: String,
}

impl BumpNames {
    /// Derive the names for bumping `package_name` to `version`
    ///
    /// Both names are pure functions of the inputs:
    /// - branch: `bump-<package>-v<version>`
    /// - commit message: `Bump <package> to v<version>`
    ///
    /// where the package has `@` and `/` removed and the version has `^` and
    /// `~` removed.
    pub fn new(package_name: &str, version: &str) -> Self {
        let package = sanitize_package_name(package_name);
        let version = sanitize_version(version);

        BumpNames {
            branch: format!("bump-{}-v{}", package, version),
            commit_message: format!("Bump {} to v{}", package, version),
        }
    }

    /// Pull request title for these names, e.g. `[Technical] Bump x to v1.0.0`
    pub fn pull_request_title(&self, prefix: &str) -> String {
        if prefix.is_empty() {
            self.commit_message.clone()
        } else {
            format!("{} {}", prefix, self.commit_message)
        }
    }
}

/// Strip the characters that npm scopes introduce into package names
pub fn sanitize_package_name(name: &str) -> String {
    name.chars().filter(|c| !matches!(c, '@' | '/')).collect()
}

/// Strip range operators from a version string
pub fn sanitize_version(version: &str) -> String {
    version.chars().filter(|c| !matches!(c, '^' | '~')).collect()
}
