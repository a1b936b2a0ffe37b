use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{FilterMode, ReferenceId, Trace, TraceId};
use crate::observability::MetricsRegistry;
use crate::storage::{IdentityResolver, StoreError, TraceLoader};

use super::filter::{filter_trace, ViewerScope};
use super::references::ReferenceCollector;

/// Errors surfaced to callers of a projection.
#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Unknown transcript: {0}")]
    TraceNotFound(TraceId),

    #[error("Failed to load transcript: {0}")]
    Load(StoreError),
}

impl From<StoreError> for ProjectionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ProjectionError::TraceNotFound(id),
            other => ProjectionError::Load(other),
        }
    }
}

/// Resolved display names for the references of a projection.
#[derive(Debug, Clone, Default)]
pub struct Handles {
    names: HashMap<ReferenceId, String>,
}

impl Handles {
    pub fn new(names: HashMap<ReferenceId, String>) -> Self {
        Handles { names }
    }

    /// Display name for `id`, or a placeholder when it did not resolve.
    pub fn name_of(&self, id: &ReferenceId) -> Cow<'_, str> {
        match self.names.get(id) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("Unknown Object #{}", id)),
        }
    }

    pub fn is_resolved(&self, id: &ReferenceId) -> bool {
        self.names.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for every id in `ids`, placeholders included, sorted by id.
    pub fn complete_for<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ReferenceId>,
    ) -> BTreeMap<ReferenceId, String> {
        ids.into_iter()
            .map(|id| (id.clone(), self.name_of(id).into_owned()))
            .collect()
    }
}

/// Viewer-facing result of projecting one transcript.
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub filter: FilterMode,
    pub viewer: ReferenceId,

    /// Transcript after viewer filtering
    pub trace: Trace,

    /// Every reference that needs a display name
    #[serde(skip)]
    pub references: HashSet<ReferenceId>,

    #[serde(skip)]
    pub handles: Handles,
}

impl Projection {
    /// Display names for every collected reference.
    pub fn names(&self) -> BTreeMap<ReferenceId, String> {
        self.handles.complete_for(&self.references)
    }
}

/// Composes loading, filtering, reference collection and resolution.
pub struct TranscriptProjector {
    loader: Arc<dyn TraceLoader>,
    resolver: Arc<dyn IdentityResolver>,
    metrics: Arc<MetricsRegistry>,
}

impl TranscriptProjector {
    pub fn new(loader: Arc<dyn TraceLoader>, resolver: Arc<dyn IdentityResolver>) -> Self {
        TranscriptProjector {
            loader,
            resolver,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Share a metrics registry with the rest of the application.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Project transcript `id` for `viewer` under `mode`.
    ///
    /// Only a failure to load the transcript is an error; a failing
    /// resolver degrades to placeholder names.
    pub async fn project(
        &self,
        id: &TraceId,
        mode: FilterMode,
        viewer: ReferenceId,
    ) -> Result<Projection, ProjectionError> {
        let start = Instant::now();

        let trace = match self.loader.load(id).await {
            Ok(trace) => trace,
            Err(e) => {
                self.metrics.record_load_failure(matches!(e, StoreError::NotFound(_)));
                warn!(trace_id = %id, error = %e, "Failed to load transcript");
                return Err(e.into());
            }
        };

        let scope = ViewerScope::for_viewer(mode, viewer);
        let filtered = filter_trace(&trace, &scope);

        // The affecting ids are shown to the viewer too, so they need names.
        let mut collector = ReferenceCollector::new();
        collector.visit_trace(&filtered).extend(&scope.affecting);
        let references = collector.finish();

        let handles = match self.resolver.resolve_many(&references).await {
            Ok(names) => Handles::new(names),
            Err(e) => {
                self.metrics.record_resolver_failure();
                warn!(trace_id = %id, error = %e, "Identity resolution failed, using placeholders");
                Handles::default()
            }
        };

        let unresolved = references
            .iter()
            .filter(|r| !handles.is_resolved(r))
            .count();

        self.metrics
            .record_projection(mode, trace.details_discarded());
        self.metrics
            .record_references(references.len() - unresolved, unresolved);
        self.metrics.record_latency(start);

        info!(
            trace_id = %id,
            filter = %mode,
            viewer = %scope.viewer,
            rules = filtered.rule_transcripts.len(),
            actions = filtered.action_transcripts.len(),
            references = references.len(),
            unresolved,
            latency_us = start.elapsed().as_micros() as u64,
            "Projection completed"
        );

        Ok(Projection {
            filter: mode,
            viewer: scope.viewer,
            trace: filtered,
            references,
            handles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionResult, ConditionResult, RuleResult, Subject, Target, TestValue};
    use crate::observability::tracing::init_test_tracing;
    use crate::storage::MemoryStore;
    use std::sync::atomic::Ordering;

    fn sample_trace() -> Trace {
        let mut trace = Trace::new("100");
        trace.subject_transcript = Some(Subject::new("OBJ", "D100"));
        trace.push_rule(RuleResult::new("R1", "U1", true));
        trace.push_rule(RuleResult::new("R2", "U2", true));
        trace.push_condition(ConditionResult::new(
            "R2",
            "reviewers",
            TestValue::List(vec!["U3".into()]),
        ));
        trace.push_action(ActionResult::new(Some("R1"), "addcc", Target::Multi(vec!["U2".into()])));
        trace.push_action(ActionResult::new(Some("R2"), "addcc", Target::Multi(vec!["U1".into()])));
        trace
    }

    fn projector() -> (Arc<MemoryStore>, TranscriptProjector) {
        let store = Arc::new(MemoryStore::new());
        store.insert_trace(sample_trace());
        store.insert_name("U1", "alice");
        store.insert_name("U2", "bob");
        store.insert_name("OBJ", "D100: Add things");

        let projector = TranscriptProjector::new(store.clone(), store.clone());
        (store, projector)
    }

    #[tokio::test]
    async fn test_affected_projection() {
        init_test_tracing();
        let (store, projector) = projector();

        let projection = projector
            .project(&TraceId::new("100"), FilterMode::Affected, "U1".into())
            .await
            .unwrap();

        assert_eq!(projection.trace.rule_transcripts.len(), 1);
        assert_eq!(projection.trace.action_transcripts.len(), 1);

        // References come from the filtered transcript plus the viewer.
        let expected: HashSet<ReferenceId> =
            ["OBJ", "U1", "U2", "U3"].into_iter().map(ReferenceId::new).collect();
        assert_eq!(projection.references, expected);
        assert_eq!(store.get_resolve_requests(), vec![expected]);
    }

    #[tokio::test]
    async fn test_references_of_filtered_out_rules_are_not_resolved() {
        let (store, projector) = projector();

        let projection = projector
            .project(&TraceId::new("100"), FilterMode::Owned, "U1".into())
            .await
            .unwrap();

        assert!(!projection.references.contains(&ReferenceId::new("U3")));
        assert!(!store.get_resolve_requests()[0].contains(&ReferenceId::new("U3")));
    }

    #[tokio::test]
    async fn test_unresolved_names_use_placeholder() {
        let (_store, projector) = projector();

        let projection = projector
            .project(&TraceId::new("100"), FilterMode::All, "U1".into())
            .await
            .unwrap();

        let names = projection.names();
        assert_eq!(names[&ReferenceId::new("U1")], "alice");
        assert_eq!(names[&ReferenceId::new("U3")], "Unknown Object #U3");
        assert_eq!(
            projection.handles.name_of(&"U404".into()),
            "Unknown Object #U404"
        );
    }

    #[tokio::test]
    async fn test_resolver_failure_degrades() {
        let (store, projector) = projector();
        store.set_fail_resolution(true);

        let projection = projector
            .project(&TraceId::new("100"), FilterMode::All, "U1".into())
            .await
            .unwrap();

        assert!(projection.handles.is_empty());
        assert_eq!(projection.trace.action_transcripts.len(), 2);
        assert_eq!(
            projector.metrics().resolver_failures.load(Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_transcript() {
        let (_store, projector) = projector();

        let result = projector
            .project(&TraceId::new("404"), FilterMode::All, "U1".into())
            .await;

        assert!(matches!(result, Err(ProjectionError::TraceNotFound(id)) if id.as_str() == "404"));
        assert_eq!(
            projector.metrics().traces_not_found.load(Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_discarded_details_are_shown_whole() {
        let (store, projector) = projector();
        let mut old = sample_trace();
        old.id = TraceId::new("old");
        old.subject_transcript = None;
        store.insert_trace(old.clone());

        let projection = projector
            .project(&TraceId::new("old"), FilterMode::Owned, "nobody".into())
            .await
            .unwrap();

        assert_eq!(projection.trace, old);
        assert_eq!(
            projector.metrics().projections_unfiltered.load(Ordering::Relaxed),
            1
        );
    }
}
