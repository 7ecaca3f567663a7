//! JSON dependency manifest (e.g. `package.json`)
//!
//! The document is kept as a generic JSON value with insertion-ordered
//! objects, so rewriting it only changes the one entry that was bumped plus
//! whitespace normalization.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{DepBumpError, Result};

/// A parsed manifest and the field holding its dependency entries
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    dependency_field: String,
    document: Value,
}

impl Manifest {
    /// Read and parse the manifest at `path`
    pub fn load(path: impl Into<PathBuf>, dependency_field: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| {
            DepBumpError::manifest(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::parse(path, dependency_field, &content)
    }

    /// Parse manifest content that was read from `path`
    pub fn parse(
        path: impl Into<PathBuf>,
        dependency_field: impl Into<String>,
        content: &str,
    ) -> Result<Self> {
        let path = path.into();
        let document: Value = serde_json::from_str(content).map_err(|e| {
            DepBumpError::manifest(format!("{} is not valid JSON: {}", path.display(), e))
        })?;

        if !document.is_object() {
            return Err(DepBumpError::manifest(format!(
                "{} does not contain a JSON object",
                path.display()
            )));
        }

        Ok(Manifest {
            path,
            dependency_field: dependency_field.into(),
            document,
        })
    }

    /// Where the manifest is read from and saved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version range currently recorded for `package`
    pub fn version_of(&self, package: &str) -> Option<&str> {
        self.document
            .get(&self.dependency_field)?
            .get(package)?
            .as_str()
    }

    /// Record `version` for `package`, keeping its position in the section
    pub fn set_version(&mut self, package: &str, version: &str) -> Result<()> {
        let field = &self.dependency_field;
        let dependencies = self
            .document
            .get_mut(field)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                DepBumpError::manifest(format!(
                    "{} has no '{}' object",
                    self.path.display(),
                    field
                ))
            })?;

        match dependencies.get_mut(package) {
            Some(entry) => *entry = Value::String(version.to_string()),
            None => {
                dependencies.insert(package.to_string(), Value::String(version.to_string()));
            }
        }

        Ok(())
    }

    /// Serialized form: 2-space indentation and a trailing newline
    pub fn to_json_string(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(&self.document).map_err(|e| {
            DepBumpError::manifest(format!("cannot serialize {}: {}", self.path.display(), e))
        })?;
        out.push('\n');
        Ok(out)
    }

    /// Write the manifest back to the path it was loaded from
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.to_json_string()?)?;
        Ok(())
    }
}
