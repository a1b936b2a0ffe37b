// src/storage/traits.rs
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::domain::{ReferenceId, Trace, TraceId};

/// Errors raised while loading a transcript.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Transcript not found: {0}")]
    NotFound(TraceId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Source of recorded transcripts.
#[async_trait]
pub trait TraceLoader: Send + Sync {
    /// Load a fully materialized transcript.
    async fn load(&self, id: &TraceId) -> Result<Trace, StoreError>;
}

/// Batch lookup of display names for identity references.
///
/// Ids the resolver does not know are left out of the result; a partial
/// miss is not an error.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_many(
        &self,
        ids: &HashSet<ReferenceId>,
    ) -> anyhow::Result<HashMap<ReferenceId, String>>;
}
