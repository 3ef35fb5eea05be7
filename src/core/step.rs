//! Step domain model

use crate::core::completion::Completion;
use crate::core::error::PipelineError;
use crate::services::ServiceError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Values threaded between steps: literal slots and step results alike
pub type Value = serde_json::Value;

/// Opaque handle identifying a step within the pipeline that issued it.
///
/// Handles are the only way to address a step; two handles are equal only
/// when they were issued by the same pipeline for the same reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId {
    pipeline: u64,
    index: usize,
}

impl StepId {
    pub(crate) fn new(pipeline: u64, index: usize) -> Self {
        Self { pipeline, index }
    }

    /// Handle that belongs to no pipeline
    #[cfg(test)]
    pub(crate) fn detached(index: usize) -> Self {
        Self::new(0, index)
    }

    pub(crate) fn pipeline(&self) -> u64 {
        self.pipeline
    }

    /// Position of the step in its pipeline's arena
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// One input position of a step
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Value fixed at declaration time
    Literal(Value),
    /// Result of another step, resolved before this one runs
    Step(StepId),
}

impl Slot {
    pub fn literal(value: impl Into<Value>) -> Self {
        Slot::Literal(value.into())
    }

    /// The referenced step, if this slot is a step reference
    pub fn step_ref(&self) -> Option<StepId> {
        match self {
            Slot::Step(id) => Some(*id),
            Slot::Literal(_) => None,
        }
    }
}

impl From<StepId> for Slot {
    fn from(id: StepId) -> Self {
        Slot::Step(id)
    }
}

/// Errors a step function may raise while it runs
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl StepError {
    pub fn msg(message: impl Into<String>) -> Self {
        StepError::Message(message.into())
    }
}

pub type StepFuture = Pin<Box<dyn Future<Output = Result<(), StepError>> + Send>>;

/// A step function: receives resolved arguments in declared order and a completion capability
pub type StepFn = Arc<dyn Fn(Vec<Value>, Completion) -> StepFuture + Send + Sync>;

/// Wrap an async closure as a [`StepFn`]
pub fn step_fn<F, Fut>(f: F) -> StepFn
where
    F: Fn(Vec<Value>, Completion) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), StepError>> + Send + 'static,
{
    Arc::new(move |args, done| Box::pin(f(args, done)))
}

/// A declared step: its dependency slots and the function to run
#[derive(Clone)]
pub struct Declaration {
    pub slots: Vec<Slot>,
    pub func: StepFn,
}

impl Declaration {
    pub fn new(slots: Vec<Slot>, func: StepFn) -> Self {
        Self { slots, func }
    }

    /// Steps referenced by this declaration, in slot order
    pub fn dependencies(&self) -> impl Iterator<Item = StepId> + '_ {
        self.slots.iter().filter_map(Slot::step_ref)
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

/// Read a string argument at `index`
pub fn arg_str(args: &[Value], index: usize) -> Result<&str, StepError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| StepError::msg(format!("argument {} is not a string", index)))
}
