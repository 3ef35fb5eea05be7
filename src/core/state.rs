//! Execution state models

use crate::core::{
    error::{PipelineError, StepRef},
    step::{StepId, Value},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Overall status of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Every entry resolved
    Completed,
    /// A step failed or the pipeline was malformed
    Failed,
    /// A step requested orderly shutdown
    Shutdown,
}

/// Lifecycle of a single step within one run
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionRecord {
    /// Step has not been reached
    Pending,
    /// Step is resolving its dependencies or waiting for its completion
    Running { started_at: DateTime<Utc> },
    /// Step produced its value
    Resolved {
        value: Value,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step, or one of its dependencies, failed
    Failed {
        error: PipelineError,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
}

impl ResolutionRecord {
    /// Check if the record can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResolutionRecord::Resolved { .. } | ResolutionRecord::Failed { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResolutionRecord::Pending => "pending",
            ResolutionRecord::Running { .. } => "running",
            ResolutionRecord::Resolved { .. } => "resolved",
            ResolutionRecord::Failed { .. } => "failed",
        }
    }

    /// The resolved value, if any
    pub fn value(&self) -> Option<&Value> {
        match self {
            ResolutionRecord::Resolved { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Result of driving a pipeline run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Every entry (and everything it depends on) resolved
    AllResolved {
        run_id: Uuid,
        values: HashMap<StepId, Value>,
    },
    /// The first failure of the run
    FailedAt {
        run_id: Uuid,
        step: StepRef,
        error: PipelineError,
    },
    /// A step stopped the pipeline
    ShutdownRequested {
        run_id: Uuid,
        step: StepRef,
        reason: Option<String>,
    },
}

impl RunOutcome {
    pub fn run_id(&self) -> Uuid {
        match self {
            RunOutcome::AllResolved { run_id, .. }
            | RunOutcome::FailedAt { run_id, .. }
            | RunOutcome::ShutdownRequested { run_id, .. } => *run_id,
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        match self {
            RunOutcome::AllResolved { .. } => ExecutionStatus::Completed,
            RunOutcome::FailedAt { .. } => ExecutionStatus::Failed,
            RunOutcome::ShutdownRequested { .. } => ExecutionStatus::Shutdown,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::AllResolved { .. })
    }

    /// Value of a resolved step (only for successful runs)
    pub fn value(&self, step: StepId) -> Option<&Value> {
        match self {
            RunOutcome::AllResolved { values, .. } => values.get(&step),
            _ => None,
        }
    }

    /// The error of a failed run
    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            RunOutcome::FailedAt { error, .. } => Some(error),
            _ => None,
        }
    }
}
