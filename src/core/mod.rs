//! Core domain models for the step pipeline
//!
//! This module defines the step registry, dependency slots, the completion
//! capability handed to steps, and the per-run resolution state.

pub mod completion;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod step;

pub use completion::*;
pub use error::*;
pub use pipeline::*;
pub use state::*;
pub use step::*;
