// src/storage/memory.rs
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use crate::domain::{ReferenceId, Trace, TraceId};

use super::traits::{IdentityResolver, StoreError, TraceLoader};

/// In-memory transcript store and identity resolver.
#[derive(Debug, Default)]
pub struct MemoryStore {
    traces: Mutex<HashMap<TraceId, Trace>>,
    names: Mutex<HashMap<ReferenceId, String>>,
    resolve_requests: Mutex<Vec<HashSet<ReferenceId>>>,
    fail_resolution: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transcript, replacing any with the same id.
    pub fn insert_trace(&self, trace: Trace) {
        self.traces.lock().insert(trace.id.clone(), trace);
    }

    /// Register a display name.
    pub fn insert_name(&self, id: impl Into<String>, name: impl Into<String>) {
        self.names.lock().insert(ReferenceId::new(id), name.into());
    }

    /// Make every subsequent resolution fail (for testing).
    pub fn set_fail_resolution(&self, fail: bool) {
        *self.fail_resolution.lock() = fail;
    }

    /// Id sets passed to `resolve_many`, in call order (for assertions).
    pub fn get_resolve_requests(&self) -> Vec<HashSet<ReferenceId>> {
        self.resolve_requests.lock().clone()
    }
}

#[async_trait]
impl TraceLoader for MemoryStore {
    async fn load(&self, id: &TraceId) -> Result<Trace, StoreError> {
        self.traces
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

#[async_trait]
impl IdentityResolver for MemoryStore {
    async fn resolve_many(
        &self,
        ids: &HashSet<ReferenceId>,
    ) -> anyhow::Result<HashMap<ReferenceId, String>> {
        self.resolve_requests.lock().push(ids.clone());

        if *self.fail_resolution.lock() {
            anyhow::bail!("identity backend unavailable");
        }

        let names = self.names.lock();
        Ok(ids
            .iter()
            .filter_map(|id| names.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_trace() {
        let store = MemoryStore::new();
        store.insert_trace(Trace::new("7"));

        let trace = store.load(&TraceId::new("7")).await.unwrap();
        assert_eq!(trace.id.as_str(), "7");
    }

    #[tokio::test]
    async fn test_unknown_trace() {
        let store = MemoryStore::new();

        let result = store.load(&TraceId::new("missing")).await;
        assert!(matches!(result, Err(StoreError::NotFound(id)) if id.as_str() == "missing"));
    }

    #[tokio::test]
    async fn test_partial_resolution() {
        let store = MemoryStore::new();
        store.insert_name("U1", "alice");

        let ids = HashSet::from([ReferenceId::new("U1"), ReferenceId::new("U404")]);
        let names = store.resolve_many(&ids).await.unwrap();

        assert_eq!(names.len(), 1);
        assert_eq!(names[&ReferenceId::new("U1")], "alice");
        assert_eq!(store.get_resolve_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_resolution() {
        let store = MemoryStore::new();
        store.set_fail_resolution(true);

        let result = store.resolve_many(&HashSet::new()).await;
        tokio_test::assert_err!(result);
    }
}
