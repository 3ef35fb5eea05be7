//! Pipeline error types

use crate::core::step::StepId;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A step identity paired with its label, used to name steps in errors and events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepRef {
    pub id: StepId,
    pub label: String,
}

impl StepRef {
    pub fn new(id: StepId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// Reference to a step that this pipeline never reserved
    pub fn unregistered(id: StepId) -> Self {
        Self::new(id, "<unregistered>")
    }
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.label, self.id)
    }
}

/// Errors raised while declaring or resolving a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("step {step} is declared more than once")]
    DuplicateStep { step: StepRef },

    #[error("{} references step {step}, which has no declaration", referenced_by.as_ref().map(|r| format!("step {}", r)).unwrap_or_else(|| "the run".to_string()))]
    UnknownStep {
        step: StepRef,
        referenced_by: Option<StepRef>,
    },

    #[error("dependency cycle detected at step {step}")]
    CyclicDependency { step: StepRef },

    #[error("step {step} failed: {message}")]
    StepExecution { step: StepRef, message: String },

    #[error("step {step} signalled completion more than once")]
    DoubleCompletion { step: StepRef },

    #[error("step {step} dropped its completion without signalling")]
    CompletionDropped { step: StepRef },

    #[error("step {step} did not complete within {}s", after.as_secs_f64())]
    StepTimedOut { step: StepRef, after: Duration },

    #[error("step {step} cannot move from {from} to {to}")]
    InvalidTransition {
        step: StepRef,
        from: &'static str,
        to: &'static str,
    },
}

impl PipelineError {
    /// The step this error is attributed to
    pub fn step(&self) -> &StepRef {
        match self {
            PipelineError::DuplicateStep { step }
            | PipelineError::UnknownStep { step, .. }
            | PipelineError::CyclicDependency { step }
            | PipelineError::StepExecution { step, .. }
            | PipelineError::DoubleCompletion { step }
            | PipelineError::CompletionDropped { step }
            | PipelineError::StepTimedOut { step, .. }
            | PipelineError::InvalidTransition { step, .. } => step,
        }
    }

    /// Structural errors are detected before any step runs
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PipelineError::DuplicateStep { .. } | PipelineError::UnknownStep { .. }
        )
    }
}
