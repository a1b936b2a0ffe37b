use ahash::AHashSet;
use std::collections::HashSet;
use tracing::debug;

use crate::domain::{FilterMode, ReferenceId, RuleId, Trace};

/// Who is looking at a transcript, and how.
#[derive(Debug, Clone)]
pub struct ViewerScope {
    pub mode: FilterMode,

    /// Identity the projection is computed for
    pub viewer: ReferenceId,

    /// Ids whose presence in an action's targets makes it relevant under
    /// `FilterMode::Affected`
    pub affecting: HashSet<ReferenceId>,
}

impl ViewerScope {
    /// Scope where the viewer is the only affecting identity.
    pub fn for_viewer(mode: FilterMode, viewer: ReferenceId) -> Self {
        let affecting = HashSet::from([viewer.clone()]);
        ViewerScope {
            mode,
            viewer,
            affecting,
        }
    }

    pub fn with_affecting(mut self, ids: impl IntoIterator<Item = ReferenceId>) -> Self {
        self.affecting.extend(ids);
        self
    }
}

/// Rules and actions that survive a filter pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeepSet {
    pub rule_ids: AHashSet<RuleId>,

    /// One flag per action, by position in the transcript
    pub actions: Vec<bool>,
}

impl KeepSet {
    #[inline]
    pub fn keeps_rule(&self, rule_id: &RuleId) -> bool {
        self.rule_ids.contains(rule_id)
    }

    #[inline]
    pub fn keeps_action(&self, index: usize) -> bool {
        self.actions.get(index).copied().unwrap_or(false)
    }

    pub fn kept_actions(&self) -> usize {
        self.actions.iter().filter(|kept| **kept).count()
    }
}

/// Compute which rules and actions `scope` retains.
///
/// Callers are expected to have handled the unfiltered cases; under
/// `FilterMode::All` everything is kept.
pub fn compute_keep_set(trace: &Trace, scope: &ViewerScope) -> KeepSet {
    if !scope.mode.is_filtering() {
        return KeepSet {
            rule_ids: trace.rule_transcripts.keys().cloned().collect(),
            actions: vec![true; trace.action_transcripts.len()],
        };
    }

    let mut keep = KeepSet {
        rule_ids: AHashSet::new(),
        actions: Vec::with_capacity(trace.action_transcripts.len()),
    };

    for action in &trace.action_transcripts {
        let kept = match scope.mode {
            // An effect with no rule behind it can't be owned by anyone.
            FilterMode::Owned => trace
                .rule_for_action(action)
                .is_some_and(|rule| rule.is_owned_by(&scope.viewer)),
            FilterMode::Affected => action.target.intersects(&scope.affecting),
            FilterMode::All => true,
        };

        // A dangling rule id keeps the action but never its conditions.
        if kept {
            if let Some(rule_id) = &action.rule_id {
                if trace.rule_transcripts.contains_key(rule_id) {
                    keep.rule_ids.insert(rule_id.clone());
                }
            }
        }
        keep.actions.push(kept);
    }

    // Owned rules stay visible even when they took no visible action.
    if scope.mode == FilterMode::Owned {
        for (rule_id, rule) in &trace.rule_transcripts {
            if rule.is_owned_by(&scope.viewer) {
                keep.rule_ids.insert(rule_id.clone());
            }
        }
    }

    keep
}

/// Project `trace` down to what `scope` should see.
///
/// Returns a new transcript; the input is never modified. Transcripts
/// without a subject are returned whole, as are `FilterMode::All` views.
pub fn filter_trace(trace: &Trace, scope: &ViewerScope) -> Trace {
    if !scope.mode.is_filtering() || trace.details_discarded() {
        return trace.clone();
    }

    let keep = compute_keep_set(trace, scope);

    let rule_transcripts = trace
        .rule_transcripts
        .iter()
        .filter(|(rule_id, _)| keep.keeps_rule(rule_id))
        .map(|(rule_id, rule)| (rule_id.clone(), rule.clone()))
        .collect();

    let condition_transcripts = trace
        .condition_transcripts
        .iter()
        .filter(|(rule_id, _)| keep.keeps_rule(rule_id))
        .map(|(rule_id, conditions)| (rule_id.clone(), conditions.clone()))
        .collect();

    let action_transcripts = trace
        .action_transcripts
        .iter()
        .enumerate()
        .filter(|(index, _)| keep.keeps_action(*index))
        .map(|(_, action)| action.clone())
        .collect();

    debug!(
        trace_id = %trace.id,
        filter = %scope.mode,
        viewer = %scope.viewer,
        rules_kept = keep.rule_ids.len(),
        actions_kept = keep.kept_actions(),
        "Filtered transcript"
    );

    Trace {
        id: trace.id.clone(),
        dry_run: trace.dry_run,
        time: trace.time,
        subject_transcript: trace.subject_transcript.clone(),
        rule_transcripts,
        condition_transcripts,
        action_transcripts,
        metadata: trace.metadata.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionResult, ConditionResult, RuleResult, Subject, Target, TestValue};

    fn scope(mode: FilterMode, viewer: &str) -> ViewerScope {
        ViewerScope::for_viewer(mode, ReferenceId::new(viewer))
    }

    fn rule_ids(trace: &Trace) -> Vec<&str> {
        trace.rule_transcripts.keys().map(RuleId::as_str).collect()
    }

    /// R1 owned by U1 acting on U2; R2 owned by U2 acting on U1.
    fn two_rule_trace() -> Trace {
        let mut trace = Trace::new("100");
        trace.subject_transcript = Some(Subject::new("OBJ", "object"));
        trace.push_rule(RuleResult::new("R1", "U1", true));
        trace.push_rule(RuleResult::new("R2", "U2", true));
        trace.push_condition(ConditionResult::new("R1", "author", TestValue::Null));
        trace.push_condition(ConditionResult::new("R2", "author", TestValue::Null));
        trace.push_action(ActionResult::new(Some("R1"), "addcc", Target::Multi(vec!["U2".into()])));
        trace.push_action(ActionResult::new(Some("R2"), "addcc", Target::Multi(vec!["U1".into()])));
        trace
    }

    /// Every retained condition belongs to a retained rule.
    fn assert_conditions_consistent(trace: &Trace) {
        for rule_id in trace.condition_transcripts.keys() {
            assert!(trace.rule_transcripts.contains_key(rule_id), "orphan condition for {rule_id}");
        }
    }

    #[test]
    fn test_owned_scenario() {
        let trace = two_rule_trace();
        let filtered = filter_trace(&trace, &scope(FilterMode::Owned, "U1"));

        assert_eq!(rule_ids(&filtered), vec!["R1"]);
        assert_eq!(filtered.action_transcripts.len(), 1);
        assert_eq!(filtered.action_transcripts[0].rule_id, Some(RuleId::new("R1")));
        assert_eq!(filtered.condition_transcripts.len(), 1);
        assert_conditions_consistent(&filtered);
    }

    #[test]
    fn test_affected_scenario() {
        let trace = two_rule_trace();
        let filtered = filter_trace(&trace, &scope(FilterMode::Affected, "U1"));

        assert_eq!(rule_ids(&filtered), vec!["R2"]);
        assert_eq!(filtered.action_transcripts.len(), 1);
        assert_eq!(filtered.action_transcripts[0].rule_id, Some(RuleId::new("R2")));
        assert_conditions_consistent(&filtered);
    }

    #[test]
    fn test_all_is_identity() {
        let trace = two_rule_trace();
        let filtered = filter_trace(&trace, &scope(FilterMode::All, "nobody"));

        assert_eq!(filtered, trace);
    }

    #[test]
    fn test_missing_subject_bypasses_filter() {
        let mut trace = two_rule_trace();
        trace.subject_transcript = None;

        for mode in FilterMode::MODES {
            assert_eq!(filter_trace(&trace, &scope(mode, "nobody")), trace);
        }
    }

    #[test]
    fn test_owned_rule_without_actions_is_kept() {
        let mut trace = two_rule_trace();
        trace.push_rule(RuleResult::new("R3", "U1", true));
        trace.push_condition(ConditionResult::new("R3", "title", TestValue::Null));

        let filtered = filter_trace(&trace, &scope(FilterMode::Owned, "U1"));

        assert_eq!(rule_ids(&filtered), vec!["R1", "R3"]);
        assert_eq!(filtered.conditions_for_rule(&"R3".into()).len(), 1);
        assert_eq!(filtered.actions_for_rule(&"R3".into()).count(), 0);
    }

    #[test]
    fn test_ruleless_actions_under_owned_and_affected() {
        let mut trace = two_rule_trace();
        trace.push_action(ActionResult::new(None, "email", Target::Single("U1".into())));
        // Action pointing at a rule that is missing from the transcript.
        trace.push_action(ActionResult::new(Some("R404"), "email", Target::Single("U1".into())));

        let owned = filter_trace(&trace, &scope(FilterMode::Owned, "U1"));
        assert_eq!(owned.action_transcripts.len(), 1);

        let affected = filter_trace(&trace, &scope(FilterMode::Affected, "U1"));
        assert_eq!(affected.action_transcripts.len(), 3);
        assert_eq!(rule_ids(&affected), vec!["R2"]);
        assert_conditions_consistent(&affected);
    }

    #[test]
    fn test_dangling_rule_conditions_are_dropped() {
        let mut trace = Trace::new("101");
        trace.subject_transcript = Some(Subject::new("OBJ", "object"));
        trace.push_condition(ConditionResult::new("R404", "author", TestValue::Null));
        trace.push_action(ActionResult::new(Some("R404"), "email", Target::Single("U1".into())));

        let filtered = filter_trace(&trace, &scope(FilterMode::Affected, "U1"));

        assert_eq!(filtered.action_transcripts.len(), 1);
        assert!(filtered.rule_transcripts.is_empty());
        assert!(filtered.condition_transcripts.is_empty());
        assert_conditions_consistent(&filtered);

        let keep = compute_keep_set(&trace, &scope(FilterMode::Affected, "U1"));
        assert!(!keep.keeps_rule(&RuleId::new("R404")));
        assert!(keep.keeps_action(0));
    }

    #[test]
    fn test_empty_affecting_set_keeps_nothing() {
        let trace = two_rule_trace();
        let mut empty = scope(FilterMode::Affected, "U1");
        empty.affecting.clear();

        let filtered = filter_trace(&trace, &empty);

        assert!(filtered.action_transcripts.is_empty());
        assert!(filtered.rule_transcripts.is_empty());
        assert!(filtered.condition_transcripts.is_empty());
    }

    #[test]
    fn test_extra_affecting_ids() {
        let trace = two_rule_trace();
        let scope = scope(FilterMode::Affected, "U1").with_affecting([ReferenceId::new("U2")]);

        let filtered = filter_trace(&trace, &scope);

        assert_eq!(filtered.action_transcripts.len(), 2);
        assert_eq!(rule_ids(&filtered), vec!["R1", "R2"]);
    }

    #[test]
    fn test_condition_dropped_regardless_of_result() {
        let mut trace = two_rule_trace();
        let mut passing = ConditionResult::new("R2", "title", TestValue::Null);
        passing.matched = true;
        trace.push_condition(passing);

        let filtered = filter_trace(&trace, &scope(FilterMode::Owned, "U1"));

        assert!(filtered.conditions_for_rule(&"R2".into()).is_empty());
    }

    #[test]
    fn test_filter_is_a_subset_and_preserves_order() {
        let mut trace = two_rule_trace();
        trace.push_action(ActionResult::new(Some("R1"), "email", Target::Single("U9".into())));
        trace.push_action(ActionResult::new(Some("R1"), "flag", Target::None));

        let filtered = filter_trace(&trace, &scope(FilterMode::Owned, "U1"));

        let actions: Vec<&str> = filtered
            .action_transcripts
            .iter()
            .map(|a| a.action.as_str())
            .collect();
        assert_eq!(actions, vec!["addcc", "email", "flag"]);
        for rule_id in filtered.rule_transcripts.keys() {
            assert!(trace.rule_transcripts.contains_key(rule_id));
        }
        assert_eq!(filtered.subject_transcript, trace.subject_transcript);
        assert_eq!(filtered.metadata, trace.metadata);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let trace = two_rule_trace();
        let before = trace.clone();

        let _ = filter_trace(&trace, &scope(FilterMode::Owned, "nobody"));

        assert_eq!(trace, before);
    }

    #[test]
    fn test_keep_set() {
        let trace = two_rule_trace();
        let keep = compute_keep_set(&trace, &scope(FilterMode::Affected, "U2"));

        assert!(keep.keeps_rule(&"R1".into()));
        assert!(!keep.keeps_rule(&"R2".into()));
        assert!(keep.keeps_action(0));
        assert!(!keep.keeps_action(1));
        assert!(!keep.keeps_action(7));
        assert_eq!(keep.kept_actions(), 1);
    }
}
