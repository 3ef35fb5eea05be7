//! Shell executor - runs commands as subprocesses

use crate::services::{ServiceError, ShellExecutor};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// A command line interpreted by the platform shell
    pub fn shell(line: impl Into<String>) -> Self {
        if cfg!(windows) {
            Self::new("cmd").arg("/C").arg(line)
        } else {
            Self::new("sh").arg("-c").arg(line)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit status and captured output of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (-1 when the process was killed by a signal)
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Shell executor backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct SubprocessShell;

impl SubprocessShell {
    pub fn new() -> Self {
        Self
    }
}

/// Parse the system PATH environment variable into a list of directories.
fn system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

fn executable_in(dir: &Path, program: &str) -> Option<PathBuf> {
    let mut candidates = vec![dir.join(program)];
    if cfg!(windows) {
        candidates.push(dir.join(format!("{}.exe", program)));
        candidates.push(dir.join(format!("{}.cmd", program)));
    }
    candidates.into_iter().find(|path| path.is_file())
}

#[async_trait]
impl ShellExecutor for SubprocessShell {
    async fn which(&self, program: &str) -> Option<PathBuf> {
        let found = system_path()
            .iter()
            .find_map(|dir| executable_in(dir, program));
        debug!("which {} -> {:?}", program, found);
        found
    }

    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ServiceError> {
        debug!("Running `{}`", command);

        let mut process = Command::new(&command.program);
        process.args(&command.args).kill_on_drop(true);
        if let Some(cwd) = &command.cwd {
            process.current_dir(cwd);
        }

        let output = process
            .output()
            .await
            .map_err(|source| ServiceError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            warn!(
                "`{}` exited with code {}: {}",
                command,
                result.status,
                result.stderr.trim()
            );
        }

        Ok(result)
    }
}
