//! npfe - scaffold front-end projects with a dependency-resolving step pipeline

pub mod cli;
pub mod core;
pub mod execution;
pub mod scaffold;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    step_fn, Completion, ExecutionStatus, Pipeline, PipelineError, RunOutcome, Slot, StepError,
    StepFn, StepId, Value,
};
pub use crate::execution::{EngineConfig, ExecutionEngine, ExecutionEvent};
pub use crate::scaffold::{Roadmap, ScaffoldConfig, ScaffoldOptions, Services};
