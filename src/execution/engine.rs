//! Main execution engine - resolves steps depth-first and drives a run to completion

use crate::{
    core::{
        ExecutionStatus, Pipeline, PipelineError, ResolutionRecord, RunOutcome, Slot, StepId,
        StepRef, Value,
    },
    execution::{ExecutionResult, RecordStore, StepExecutor},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        run_id: Uuid,
        pipeline_name: String,
        entries: usize,
    },
    StepStarted {
        step: StepRef,
        arguments: usize,
    },
    StepResolved {
        step: StepRef,
        value: Value,
    },
    StepFailed {
        step: StepRef,
        error: String,
    },
    ShutdownRequested {
        step: StepRef,
        reason: Option<String>,
    },
    PipelineCompleted {
        run_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Fail a step that has not completed after this long (no limit when unset)
    pub step_timeout: Option<Duration>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }
}

/// Why resolution stopped early
enum Halt {
    Failed(PipelineError),
    Shutdown {
        step: StepRef,
        reason: Option<String>,
    },
}

type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, Halt>> + Send + 'a>>;

/// Resolves a pipeline's steps, invoking each one at most once per run
pub struct ExecutionEngine {
    pipeline: Pipeline,
    executor: StepExecutor,
    records: RecordStore,
    event_handlers: Vec<EventHandler>,
}

impl ExecutionEngine {
    pub fn new(pipeline: Pipeline) -> Self {
        Self::with_config(pipeline, EngineConfig::default())
    }

    pub fn with_config(pipeline: Pipeline, config: EngineConfig) -> Self {
        Self {
            pipeline,
            executor: StepExecutor::new(config.step_timeout),
            records: RecordStore::new(),
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Records of the latest run
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Cached value of a step from the latest run
    pub fn value(&self, step: StepId) -> Option<&Value> {
        self.records.value(step)
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Run the given entries in order, resolving each one's dependencies first
    pub async fn execute(&mut self, entries: &[StepId]) -> RunOutcome {
        let run_id = Uuid::new_v4();
        self.records = RecordStore::new();

        info!(
            "Starting pipeline run: {} ({}), {} entries",
            self.pipeline.name,
            run_id,
            entries.len()
        );
        self.emit_event(ExecutionEvent::PipelineStarted {
            run_id,
            pipeline_name: self.pipeline.name.clone(),
            entries: entries.len(),
        });

        let outcome = match self.drive(entries).await {
            Ok(()) => RunOutcome::AllResolved {
                run_id,
                values: self.records.values(),
            },
            Err(Halt::Failed(error)) => RunOutcome::FailedAt {
                run_id,
                step: error.step().clone(),
                error,
            },
            Err(Halt::Shutdown { step, reason }) => RunOutcome::ShutdownRequested {
                run_id,
                step,
                reason,
            },
        };

        info!(
            "Pipeline run finished: {} - {:?} ({} resolved, {} failed)",
            self.pipeline.name,
            outcome.status(),
            self.records.resolved_count(),
            self.records.failed_count()
        );
        self.emit_event(ExecutionEvent::PipelineCompleted {
            run_id,
            status: outcome.status(),
        });

        outcome
    }

    async fn drive(&mut self, entries: &[StepId]) -> Result<(), Halt> {
        // Structural problems end the run before any step is invoked
        self.pipeline.validate().map_err(Halt::Failed)?;
        for &entry in entries {
            self.pipeline.dependencies_of(entry).map_err(Halt::Failed)?;
        }

        for &entry in entries {
            self.resolve(entry).await?;
        }

        Ok(())
    }

    /// Resolve a step, resolving its dependencies depth-first
    fn resolve(&mut self, step: StepId) -> ResolveFuture<'_> {
        Box::pin(async move {
            let step_ref = self.pipeline.step_ref(step);

            match self.records.get(step) {
                ResolutionRecord::Resolved { value, .. } => {
                    debug!("Step {} already resolved, reusing cached value", step_ref);
                    return Ok(value.clone());
                }
                ResolutionRecord::Failed { error, .. } => {
                    debug!("Step {} already failed", step_ref);
                    return Err(Halt::Failed(error.clone()));
                }
                _ => {}
            }

            let slots = self
                .pipeline
                .dependencies_of(step)
                .map_err(Halt::Failed)?
                .to_vec();

            if let Err(error) = self.records.begin(&step_ref) {
                warn!("{}", error);
                return Err(Halt::Failed(error));
            }

            let mut args = Vec::with_capacity(slots.len());
            for slot in slots {
                match slot {
                    Slot::Literal(value) => args.push(value),
                    Slot::Step(dep) => match self.resolve(dep).await {
                        Ok(value) => args.push(value),
                        Err(Halt::Failed(error)) => {
                            // The dependent inherits the originating failure and never runs
                            self.fail(&step_ref, error.clone());
                            return Err(Halt::Failed(error));
                        }
                        Err(shutdown) => return Err(shutdown),
                    },
                }
            }

            let func = self.pipeline.step_fn(step).map_err(Halt::Failed)?;
            self.emit_event(ExecutionEvent::StepStarted {
                step: step_ref.clone(),
                arguments: args.len(),
            });

            match self.executor.execute(&step_ref, &func, args).await {
                ExecutionResult::Resolved { value } => {
                    self.records
                        .resolve(&step_ref, value.clone())
                        .map_err(Halt::Failed)?;
                    info!("Step {} resolved", step_ref);
                    self.emit_event(ExecutionEvent::StepResolved {
                        step: step_ref,
                        value: value.clone(),
                    });
                    Ok(value)
                }
                ExecutionResult::Shutdown { reason } => {
                    self.emit_event(ExecutionEvent::ShutdownRequested {
                        step: step_ref.clone(),
                        reason: reason.clone(),
                    });
                    Err(Halt::Shutdown {
                        step: step_ref,
                        reason,
                    })
                }
                ExecutionResult::Failed { error } => {
                    self.fail(&step_ref, error.clone());
                    self.emit_event(ExecutionEvent::StepFailed {
                        step: step_ref,
                        error: error.to_string(),
                    });
                    Err(Halt::Failed(error))
                }
            }
        })
    }

    fn fail(&mut self, step: &StepRef, error: PipelineError) {
        if let Err(e) = self.records.fail(step, error) {
            error!("Could not record failure: {}", e);
        }
    }
}
