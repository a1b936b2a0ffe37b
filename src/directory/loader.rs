use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::ReferenceId;
use crate::storage::IdentityResolver;

/// Errors that can occur during directory loading.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Snapshot of known identities and their display names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    names: HashMap<ReferenceId, String>,
}

impl Directory {
    pub fn new(names: HashMap<ReferenceId, String>) -> Self {
        Directory { names }
    }

    /// Create an empty directory.
    pub fn empty() -> Self {
        Directory::default()
    }

    pub fn name_of(&self, id: &ReferenceId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names for the subset of `ids` present in this directory.
    pub fn lookup(&self, ids: &HashSet<ReferenceId>) -> HashMap<ReferenceId, String> {
        ids.iter()
            .filter_map(|id| self.names.get(id).map(|name| (id.clone(), name.clone())))
            .collect()
    }
}

#[async_trait]
impl IdentityResolver for Directory {
    async fn resolve_many(
        &self,
        ids: &HashSet<ReferenceId>,
    ) -> anyhow::Result<HashMap<ReferenceId, String>> {
        Ok(self.lookup(ids))
    }
}

/// Load a directory from a YAML or JSON file mapping id to display name.
pub fn load_directory(path: impl AsRef<Path>) -> Result<Directory, DirectoryError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let names: HashMap<ReferenceId, String> = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    validate_names(&names)?;

    Ok(Directory::new(names))
}

/// Validate directory entries.
fn validate_names(names: &HashMap<ReferenceId, String>) -> Result<(), DirectoryError> {
    for (id, name) in names {
        if id.as_str().is_empty() {
            return Err(DirectoryError::Validation(
                "Identity id cannot be empty".to_string(),
            ));
        }
        if name.trim().is_empty() {
            return Err(DirectoryError::Validation(format!(
                "Empty display name for identity: {}",
                id
            )));
        }
    }

    Ok(())
}

/// Loader bound to a directory file path.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    path: PathBuf,
}

impl DirectoryLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DirectoryLoader { path: path.into() }
    }

    pub fn load(&self) -> Result<Directory, DirectoryError> {
        load_directory(&self.path)
    }

    /// Get the directory file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
