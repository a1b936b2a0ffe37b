use std::collections::HashSet;

use crate::domain::{ReferenceId, Trace};

/// Accumulates identity references for batch resolution.
///
/// Duplicates collapse; visiting never fails, malformed or missing
/// values simply contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCollector {
    refs: HashSet<ReferenceId>,
}

impl ReferenceCollector {
    pub fn new() -> Self {
        ReferenceCollector::default()
    }

    /// Record every reference embedded in `trace`.
    pub fn visit_trace(&mut self, trace: &Trace) -> &mut Self {
        if let Some(subject) = &trace.subject_transcript {
            self.record(&subject.identifier);
        }

        for action in &trace.action_transcripts {
            for id in action.target.ids() {
                self.record(id);
            }
        }

        for rule in trace.rule_transcripts.values() {
            if let Some(owner) = &rule.owner_id {
                self.record(owner);
            }
        }

        // Only list-valued test values name identities; scalars are literals.
        for condition in trace.condition_transcripts.values().flatten() {
            for id in condition.test_value.reference_ids() {
                self.record(id);
            }
        }

        self
    }

    /// Record additional ids the caller needs names for.
    pub fn extend<'a>(&mut self, ids: impl IntoIterator<Item = &'a ReferenceId>) -> &mut Self {
        for id in ids {
            self.record(id);
        }
        self
    }

    #[inline]
    fn record(&mut self, id: &ReferenceId) {
        if !id.as_str().is_empty() && !self.refs.contains(id) {
            self.refs.insert(id.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn finish(self) -> HashSet<ReferenceId> {
        self.refs
    }
}

/// Collect the deduplicated set of identity references in `trace`.
pub fn collect_references(trace: &Trace) -> HashSet<ReferenceId> {
    let mut collector = ReferenceCollector::new();
    collector.visit_trace(trace);
    collector.finish()
}
