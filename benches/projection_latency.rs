use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use ruletrace::domain::{
    ActionResult, ConditionResult, FilterMode, ReferenceId, RuleResult, Subject, Target, TestValue,
    Trace, TraceId,
};
use ruletrace::projection::{collect_references, filter_trace, TranscriptProjector, ViewerScope};
use ruletrace::storage::MemoryStore;

/// Transcript with `rules` rules owned round-robin by 20 users, three
/// conditions per rule and two actions per rule.
fn create_test_trace(rules: usize) -> Trace {
    let mut trace = Trace::new("bench");
    trace.subject_transcript = Some(Subject::new("PHID-DREV-1", "D1"));

    for i in 0..rules {
        let rule_id = format!("R{}", i);
        let owner = format!("U{}", i % 20);

        trace.push_rule(RuleResult::new(&rule_id, &owner, i % 3 != 0));
        for field in ["author", "reviewers", "title"] {
            trace.push_condition(ConditionResult::new(
                &rule_id,
                field,
                TestValue::List(vec![ReferenceId::new(format!("U{}", (i + 1) % 20))]),
            ));
        }
        trace.push_action(ActionResult::new(
            Some(rule_id.as_str()),
            "addcc",
            Target::Multi(vec![
                ReferenceId::new(format!("U{}", (i + 3) % 20)),
                ReferenceId::new(format!("U{}", (i + 7) % 20)),
            ]),
        ));
        trace.push_action(ActionResult::new(
            Some(rule_id.as_str()),
            "email",
            Target::Single(ReferenceId::new(format!("U{}", (i + 11) % 20))),
        ));
    }

    trace
}

fn bench_filter_owned(c: &mut Criterion) {
    let trace = create_test_trace(500);
    let scope = ViewerScope::for_viewer(FilterMode::Owned, ReferenceId::new("U1"));

    c.bench_function("filter_trace_owned_500_rules", |b| {
        b.iter(|| filter_trace(black_box(&trace), black_box(&scope)))
    });
}

fn bench_filter_affected(c: &mut Criterion) {
    let trace = create_test_trace(500);
    let scope = ViewerScope::for_viewer(FilterMode::Affected, ReferenceId::new("U1"));

    c.bench_function("filter_trace_affected_500_rules", |b| {
        b.iter(|| filter_trace(black_box(&trace), black_box(&scope)))
    });
}

fn bench_collect_references(c: &mut Criterion) {
    let trace = create_test_trace(500);

    c.bench_function("collect_references_500_rules", |b| {
        b.iter(|| collect_references(black_box(&trace)))
    });
}

fn bench_full_projection(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let store = Arc::new(MemoryStore::new());
    store.insert_trace(create_test_trace(100));
    for i in 0..20 {
        store.insert_name(format!("U{}", i), format!("user{}", i));
    }

    let projector = TranscriptProjector::new(store.clone(), store);
    let id = TraceId::new("bench");

    c.bench_function("full_projection_100_rules", |b| {
        b.to_async(&runtime).iter(|| async {
            projector
                .project(black_box(&id), FilterMode::Affected, ReferenceId::new("U1"))
                .await
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_filter_owned,
    bench_filter_affected,
    bench_collect_references,
    bench_full_projection,
);

criterion_main!(benches);
