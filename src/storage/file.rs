// src/storage/file.rs
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::domain::{Trace, TraceId};

use super::traits::{StoreError, TraceLoader};

/// Extensions tried, in order, when looking up a transcript file.
const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Parse a transcript from file contents, picking the format by extension.
pub fn parse_trace(content: &str, extension: &str) -> Result<Trace, StoreError> {
    match extension {
        "json" => Ok(serde_json::from_str(content)?),
        _ => Ok(serde_yaml::from_str(content)?),
    }
}

/// Load a transcript from a single file.
pub fn load_trace_file(path: impl AsRef<Path>) -> Result<Trace, StoreError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("json");

    parse_trace(&content, extension)
}

/// Transcript store reading `<dir>/<id>.{json,yaml,yml}`.
#[derive(Debug, Clone)]
pub struct FileTraceStore {
    dir: PathBuf,
}

impl FileTraceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileTraceStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Locate the file holding transcript `id`.
    ///
    /// Ids that could escape the store directory never match.
    fn locate(&self, id: &TraceId) -> Option<PathBuf> {
        let id = id.as_str();
        let escapes = Path::new(id)
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') || escapes {
            return None;
        }

        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{id}.{ext}")))
            .find(|path| path.is_file())
    }
}

#[async_trait]
impl TraceLoader for FileTraceStore {
    async fn load(&self, id: &TraceId) -> Result<Trace, StoreError> {
        let path = self
            .locate(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        debug!(trace_id = %id, path = %path.display(), "Loading transcript");

        let content = tokio::fs::read_to_string(&path).await?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("json");

        parse_trace(&content, extension)
    }
}
