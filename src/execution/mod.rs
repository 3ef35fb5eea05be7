//! Pipeline execution engine

pub mod engine;
pub mod executor;
pub mod records;

pub use engine::{EngineConfig, EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::{ExecutionResult, StepExecutor};
pub use records::RecordStore;
