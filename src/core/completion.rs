//! Completion capability handed to every step function

use crate::core::error::{PipelineError, StepRef};
use crate::core::step::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What a step reported through its completion
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// The step produced its value
    Resolved(Value),
    /// A background operation started by the step failed
    Failed(String),
    /// The step asked for the whole pipeline to stop
    Shutdown(Option<String>),
}

/// Single-use completion handle.
///
/// Clones share the same underlying channel, so a step may hand it to a
/// background task. Only the first signal is delivered; every later call
/// returns [`PipelineError::DoubleCompletion`].
#[derive(Debug, Clone)]
pub struct Completion {
    step: StepRef,
    sender: Arc<Mutex<Option<oneshot::Sender<Signal>>>>,
}

impl Completion {
    pub(crate) fn channel(step: StepRef) -> (Self, oneshot::Receiver<Signal>) {
        let (sender, receiver) = oneshot::channel();
        let completion = Self {
            step,
            sender: Arc::new(Mutex::new(Some(sender))),
        };
        (completion, receiver)
    }

    /// The step this completion belongs to
    pub fn step(&self) -> &StepRef {
        &self.step
    }

    /// Resolve the step with `value`
    pub fn complete(&self, value: impl Into<Value>) -> Result<(), PipelineError> {
        self.send(Signal::Resolved(value.into()))
    }

    /// Fail the step from a background operation
    pub fn fail(&self, message: impl Into<String>) -> Result<(), PipelineError> {
        self.send(Signal::Failed(message.into()))
    }

    /// Stop the whole pipeline; no further step is invoked
    pub fn shutdown(&self, reason: impl Into<String>) -> Result<(), PipelineError> {
        self.send(Signal::Shutdown(Some(reason.into())))
    }

    /// Whether a signal has already been sent
    pub fn is_done(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }

    fn send(&self, signal: Signal) -> Result<(), PipelineError> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match sender {
            Some(sender) => {
                debug!("Step {} signalled {:?}", self.step, signal);
                // The receiver is gone only when the engine already gave up on the step
                if sender.send(signal).is_err() {
                    debug!("Step {} signalled after the engine stopped waiting", self.step);
                }
                Ok(())
            }
            None => {
                warn!("Step {} signalled completion more than once", self.step);
                Err(PipelineError::DoubleCompletion {
                    step: self.step.clone(),
                })
            }
        }
    }
}
