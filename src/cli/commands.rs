//! CLI command definitions

use crate::scaffold::validate_project_name;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Create a new project from the template
#[derive(Debug, Args, Clone)]
pub struct NewCommand {
    /// Package name of the new project (also the directory name)
    #[arg(value_parser = parse_project_name)]
    pub name: String,

    /// Directory in which the project directory is created
    #[arg(short, long, default_value = ".")]
    pub directory: PathBuf,

    /// Template repository to clone instead of the configured one
    #[arg(short, long)]
    pub template: Option<String>,

    /// Answer yes to every question
    #[arg(short, long)]
    pub yes: bool,

    /// Fail a step that has not completed after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub step_timeout: Option<u64>,
}

impl NewCommand {
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout.map(Duration::from_secs)
    }
}

/// Show the configuration, creating the default file if needed
#[derive(Debug, Args, Clone)]
pub struct ConfigCommand {
    /// Only print where the config file lives
    #[arg(long)]
    pub path: bool,
}

/// Validate a project name argument
pub fn parse_project_name(s: &str) -> Result<String, String> {
    validate_project_name(s)?;
    Ok(s.to_string())
}
