//! Scenario-based tests for the step pipeline and the scaffold roadmap


mod async_completion;
mod cycles;
mod scaffold;
