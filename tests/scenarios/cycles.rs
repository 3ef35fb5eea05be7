//! Test: Cycles - circular dependencies fail instead of recursing forever

use crate::helpers::*;
use npfe::core::{Pipeline, PipelineError};
use npfe::execution::ExecutionEngine;

fn assert_cycle(outcome: &npfe::RunOutcome) {
    assert!(
        matches!(outcome.error(), Some(PipelineError::CyclicDependency { .. })),
        "expected a cycle error, got {:?}",
        outcome
    );
}

#[tokio::test]
async fn test_two_step_cycle() {
    let log = CallLog::new();
    let mut pipeline = Pipeline::new("a-b");

    let a = pipeline.step("a");
    let b = pipeline.declare("b", vec![a.into()], log.sum("b"));
    pipeline.register(a, vec![b.into()], log.sum("a")).unwrap();

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[a]).await;

    assert_cycle(&outcome);
    assert_failed_at(&outcome, "a");
    assert!(log.calls().is_empty());
}

#[tokio::test]
async fn test_three_step_cycle_behind_acyclic_entry() {
    let log = CallLog::new();
    let mut pipeline = Pipeline::new("ring");

    let x = pipeline.step("x");
    let z = pipeline.declare("z", vec![x.into()], log.sum("z"));
    let y = pipeline.declare("y", vec![z.into()], log.sum("y"));
    pipeline.register(x, vec![y.into()], log.sum("x")).unwrap();
    let entry = pipeline.declare("entry", vec![y.into()], log.sum("entry"));

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[entry]).await;

    assert_cycle(&outcome);
    assert_eq!(outcome.error().map(|e| e.step().label.as_str()), Some("y"));
    assert!(log.calls().is_empty());
    assert_eq!(engine.records().failed_count(), 4);
}

#[tokio::test]
async fn test_self_dependency() {
    let log = CallLog::new();
    let mut pipeline = Pipeline::new("self");

    let me = pipeline.step("me");
    pipeline.register(me, vec![me.into()], log.sum("me")).unwrap();

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[me]).await;

    assert_cycle(&outcome);
    assert!(log.calls().is_empty());
}
