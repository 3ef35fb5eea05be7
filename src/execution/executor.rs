//! Step executor - invokes a single step function and waits for its completion

use crate::core::{Completion, PipelineError, Signal, StepError, StepFn, StepRef, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Result of executing a step
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Step called its completion with a value
    Resolved { value: Value },
    /// Step requested orderly pipeline shutdown
    Shutdown { reason: Option<String> },
    /// Step raised, reported a failure, or never completed
    Failed { error: PipelineError },
}

/// Executes a single step
#[derive(Debug, Clone, Default)]
pub struct StepExecutor {
    /// Upper bound on how long a step may take to complete
    step_timeout: Option<Duration>,
}

impl StepExecutor {
    pub fn new(step_timeout: Option<Duration>) -> Self {
        Self { step_timeout }
    }

    /// Run the step function until it signals through its completion.
    ///
    /// The first signal decides the result, even while the step body is still
    /// running. A body that is still running after resolving keeps running in
    /// a background task; an error it returns later is only logged.
    pub async fn execute(&self, step: &StepRef, func: &StepFn, args: Vec<Value>) -> ExecutionResult {
        info!("Executing step: {}", step);
        debug!("Arguments for step {}: {:?}", step, args);

        let (completion, mut receiver) = Completion::channel(step.clone());
        let mut body = func(args, completion);
        let mut body_done = false;
        let mut receiver_closed = false;

        // Only bounds the wait for a signal
        let limit = self.step_timeout;
        let deadline = async move {
            match limit {
                Some(limit) => sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let dropped = || PipelineError::CompletionDropped { step: step.clone() };

        let signal = loop {
            tokio::select! {
                biased;

                received = &mut receiver, if !receiver_closed => match received {
                    Ok(signal) => break Ok(signal),
                    // Every handle is gone; the body's own result decides
                    Err(_) if body_done => break Err(dropped()),
                    Err(_) => receiver_closed = true,
                },

                result = &mut body, if !body_done => {
                    body_done = true;
                    match result {
                        Ok(()) if receiver_closed => break Err(dropped()),
                        Ok(()) => continue,
                        Err(e) => {
                            // A signal sent before the error still counts
                            if let Ok(signal) = receiver.try_recv() {
                                warn!("Step {} failed after signalling: {}", step, e);
                                break Ok(signal);
                            }
                            break Err(match e {
                                StepError::Pipeline(error) => error,
                                e => PipelineError::StepExecution {
                                    step: step.clone(),
                                    message: e.to_string(),
                                },
                            });
                        }
                    }
                }

                () = &mut deadline => {
                    let limit = limit.unwrap_or_default();
                    error!("Timeout for step {} after {:?}", step, limit);
                    break Err(PipelineError::StepTimedOut {
                        step: step.clone(),
                        after: limit,
                    });
                }
            }
        };

        if !body_done && matches!(signal, Ok(Signal::Resolved(_))) {
            let step = step.clone();
            tokio::spawn(async move {
                if let Err(e) = body.await {
                    warn!("Step {} failed after signalling: {}", step, e);
                }
            });
        }

        match signal {
            Ok(Signal::Resolved(value)) => ExecutionResult::Resolved { value },
            Ok(Signal::Shutdown(reason)) => {
                info!("Step {} requested shutdown", step);
                ExecutionResult::Shutdown { reason }
            }
            Ok(Signal::Failed(message)) => {
                error!("Step {} reported failure: {}", step, message);
                ExecutionResult::Failed {
                    error: PipelineError::StepExecution {
                        step: step.clone(),
                        message,
                    },
                }
            }
            Err(error) => {
                error!("Step {} failed: {}", step, error);
                ExecutionResult::Failed { error }
            }
        }
    }
}
