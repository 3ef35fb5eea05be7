//! External collaborators invoked by steps
//!
//! The pipeline core treats these as opaque asynchronous operations. Each one
//! is a trait so steps can be exercised against in-memory doubles.

pub mod config_store;
pub mod prompt;
pub mod shell;

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use config_store::JsonConfigStore;
pub use prompt::{AutoConfirm, TerminalPrompt};
pub use shell::{CommandOutput, CommandSpec, SubprocessShell};

/// Error types for collaborator operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Reads and writes the JSON configuration document
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the document at `path`, writing the default there first if it is missing
    async fn load_or_init(&self, path: &Path) -> Result<Value, ServiceError>;
}

/// Runs commands on the host
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    /// Locate `program` on PATH
    async fn which(&self, program: &str) -> Option<PathBuf>;

    /// Run a command and capture its output
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ServiceError>;
}

/// Asks the user questions
#[async_trait]
pub trait PromptService: Send + Sync {
    /// Ask a yes/no question
    async fn confirm(&self, message: &str, default: bool) -> Result<bool, ServiceError>;

    /// Ask for free text
    async fn input(&self, message: &str, default: Option<&str>) -> Result<String, ServiceError>;
}
