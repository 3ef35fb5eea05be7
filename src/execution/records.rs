//! Resolution record store - per-run memoization and cycle detection

use crate::core::{PipelineError, ResolutionRecord, StepId, StepRef, Value};
use chrono::Utc;
use std::collections::HashMap;

static PENDING: ResolutionRecord = ResolutionRecord::Pending;

/// Maps each step to its resolution record for a single run.
///
/// Every step moves Pending -> Running -> Resolved|Failed at most once;
/// any other transition is refused and leaves the record untouched.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: HashMap<StepId, ResolutionRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record of a step (Pending if never touched)
    pub fn get(&self, step: StepId) -> &ResolutionRecord {
        self.records.get(&step).unwrap_or(&PENDING)
    }

    /// Mark a step Running. A step that is already Running is part of a cycle.
    pub fn begin(&mut self, step: &StepRef) -> Result<(), PipelineError> {
        match self.get(step.id) {
            ResolutionRecord::Pending => {
                self.records.insert(
                    step.id,
                    ResolutionRecord::Running {
                        started_at: Utc::now(),
                    },
                );
                Ok(())
            }
            ResolutionRecord::Running { .. } => Err(PipelineError::CyclicDependency {
                step: step.clone(),
            }),
            other => Err(PipelineError::InvalidTransition {
                step: step.clone(),
                from: other.name(),
                to: "running",
            }),
        }
    }

    /// Mark a Running step Resolved with its value
    pub fn resolve(&mut self, step: &StepRef, value: Value) -> Result<(), PipelineError> {
        match self.get(step.id) {
            ResolutionRecord::Running { started_at } => {
                let started_at = *started_at;
                self.records.insert(
                    step.id,
                    ResolutionRecord::Resolved {
                        value,
                        started_at,
                        completed_at: Utc::now(),
                    },
                );
                Ok(())
            }
            other => Err(PipelineError::InvalidTransition {
                step: step.clone(),
                from: other.name(),
                to: "resolved",
            }),
        }
    }

    /// Mark a Running step Failed
    pub fn fail(&mut self, step: &StepRef, error: PipelineError) -> Result<(), PipelineError> {
        match self.get(step.id) {
            ResolutionRecord::Running { started_at } => {
                let started_at = *started_at;
                self.records.insert(
                    step.id,
                    ResolutionRecord::Failed {
                        error,
                        started_at,
                        failed_at: Utc::now(),
                    },
                );
                Ok(())
            }
            other => Err(PipelineError::InvalidTransition {
                step: step.clone(),
                from: other.name(),
                to: "failed",
            }),
        }
    }

    /// Cached value of a resolved step
    pub fn value(&self, step: StepId) -> Option<&Value> {
        self.get(step).value()
    }

    /// Snapshot of every resolved value
    pub fn values(&self) -> HashMap<StepId, Value> {
        self.records
            .iter()
            .filter_map(|(id, record)| record.value().map(|value| (*id, value.clone())))
            .collect()
    }

    pub fn resolved_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| matches!(r, ResolutionRecord::Resolved { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| matches!(r, ResolutionRecord::Failed { .. }))
            .count()
    }

    /// Steps left Running (suspended, or interrupted by a shutdown)
    pub fn running_steps(&self) -> Vec<StepId> {
        let mut running: Vec<StepId> = self
            .records
            .iter()
            .filter(|(_, r)| matches!(r, ResolutionRecord::Running { .. }))
            .map(|(id, _)| *id)
            .collect();
        running.sort();
        running
    }
}
