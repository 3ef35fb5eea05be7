//! Test: Async Completion - the completion signal, not the step body, resolves a step

use crate::helpers::*;
use npfe::core::{step_fn, Pipeline, PipelineError, Slot, StepError};
use npfe::execution::{EngineConfig, ExecutionEngine};
use serde_json::json;
use std::time::Duration;

/// The dependent waits for a completion delivered from a spawned task
#[tokio::test]
async fn test_dependent_waits_for_background_completion() {
    let log = CallLog::new();
    let mut pipeline = Pipeline::new("background");

    let slow = pipeline.declare(
        "slow",
        vec![Slot::literal(20)],
        step_fn(|args, done| async move {
            let delay = args[0].as_u64().unwrap_or(0);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                let _ = done.complete(7);
            });
            Ok(())
        }),
    );
    let after = pipeline.declare("after", vec![slow.into(), Slot::literal(1)], log.sum("after"));

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[after]).await;

    assert_resolved(&outcome, after, json!(8));
    assert_eq!(outcome.value(slow), Some(&json!(7)));
}

/// A second completion is rejected; the first value stays
#[tokio::test]
async fn test_double_completion_keeps_first_value() {
    let mut pipeline = Pipeline::new("double");

    let twice = pipeline.declare(
        "twice",
        vec![],
        step_fn(|_, done| async move {
            done.complete("first")?;
            if let Err(error) = done.complete("second") {
                assert!(matches!(error, PipelineError::DoubleCompletion { .. }));
            }
            Ok(())
        }),
    );

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[twice]).await;

    assert_resolved(&outcome, twice, json!("first"));
}

/// Propagating the double-completion error does not undo the first value
#[tokio::test]
async fn test_propagated_double_completion_keeps_first_value() {
    let mut pipeline = Pipeline::new("double-propagated");

    let twice = pipeline.declare(
        "twice",
        vec![],
        step_fn(|_, done| async move {
            done.complete(1)?;
            done.complete(2)?;
            Ok(())
        }),
    );

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[twice]).await;

    assert_resolved(&outcome, twice, json!(1));
}

/// Calling the completion alone resolves the step and unblocks its dependents
#[tokio::test]
async fn test_completion_unblocks_dependent_while_body_runs() {
    let log = CallLog::new();
    let mut pipeline = Pipeline::new("early-completion");

    let a = pipeline.declare(
        "a",
        vec![],
        step_fn(|_, done| async move {
            done.complete(5)?;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }),
    );
    let b = pipeline.declare("b", vec![a.into(), a.into()], log.sum("b"));

    let config = EngineConfig::new().with_step_timeout(Duration::from_millis(500));
    let mut engine = ExecutionEngine::with_config(pipeline, config);
    let outcome = engine.execute(&[b]).await;

    assert_resolved(&outcome, b, json!(10));
    assert_eq!(outcome.value(a), Some(&json!(5)));
}

/// An error returned after completing does not turn the step into a failure
#[tokio::test]
async fn test_error_after_completion_keeps_value() {
    let log = CallLog::new();
    let mut pipeline = Pipeline::new("late-error");

    let a = pipeline.declare(
        "a",
        vec![],
        step_fn(|_, done| async move {
            done.complete(3)?;
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(StepError::msg("temp dir cleanup failed"))
        }),
    );
    let b = pipeline.declare("b", vec![a.into(), Slot::literal(1)], log.sum("b"));

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[b]).await;

    assert_resolved(&outcome, a, json!(3));
    assert_resolved(&outcome, b, json!(4));
}

/// An error returned before any signal still fails the step
#[tokio::test]
async fn test_error_before_completion_fails() {
    let log = CallLog::new();
    let mut pipeline = Pipeline::new("early-error");

    let a = pipeline.declare(
        "a",
        vec![],
        step_fn(|_, done| async move {
            let _held = done;
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(StepError::msg("template missing"))
        }),
    );
    let b = pipeline.declare("b", vec![a.into()], log.sum("b"));

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[b]).await;

    assert_failed_at(&outcome, "a");
    assert!(matches!(
        outcome.error(),
        Some(PipelineError::StepExecution { message, .. }) if message == "template missing"
    ));
    assert!(log.calls().is_empty());
}

/// Dropping every completion handle without signalling fails the step
#[tokio::test]
async fn test_dropped_completion() {
    let mut pipeline = Pipeline::new("dropped");
    let silent = pipeline.declare("silent", vec![], step_fn(|_, _done| async { Ok(()) }));

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[silent]).await;

    assert!(matches!(
        outcome.error(),
        Some(PipelineError::CompletionDropped { .. })
    ));
}

/// A completion held forever is caught by the step timeout
#[tokio::test]
async fn test_step_timeout() {
    let mut pipeline = Pipeline::new("stuck");
    let stuck = pipeline.declare(
        "stuck",
        vec![],
        step_fn(|_, done| async move {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                let _ = done.complete(0);
            });
            Ok(())
        }),
    );

    let config = EngineConfig::new().with_step_timeout(Duration::from_millis(50));
    let mut engine = ExecutionEngine::with_config(pipeline, config);
    let outcome = engine.execute(&[stuck]).await;

    match outcome.error() {
        Some(PipelineError::StepTimedOut { step, after }) => {
            assert_eq!(step.label, "stuck");
            assert_eq!(*after, Duration::from_millis(50));
        }
        other => panic!("expected a timeout, got {:?}", other),
    }
}

/// A clone of the completion handed to another task counts as the same capability
#[tokio::test]
async fn test_cloned_completion() {
    let mut pipeline = Pipeline::new("cloned");
    let step = pipeline.declare(
        "step",
        vec![],
        step_fn(|_, done| async move {
            let handle = done.clone();
            tokio::spawn(async move {
                let _ = handle.complete("from clone");
            })
            .await
            .ok();
            assert!(done.is_done());
            Ok(())
        }),
    );

    let mut engine = ExecutionEngine::new(pipeline);
    let outcome = engine.execute(&[step]).await;

    assert_resolved(&outcome, step, json!("from clone"));
}
