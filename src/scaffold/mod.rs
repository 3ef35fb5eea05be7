//! Project scaffolder built on the pipeline core
//!
//! Clones a template repository, renames its package and runs follow-up
//! commands. Every stage is a step of the [`Roadmap`]; collaborators are
//! injected through [`Services`].

pub mod config;
pub mod rename;
pub mod roadmap;
pub mod steps;

use crate::services::{
    AutoConfirm, ConfigStore, JsonConfigStore, PromptService, ShellExecutor, SubprocessShell,
    TerminalPrompt,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use config::{default_config_path, ScaffoldConfig};
pub use rename::RenameReport;
pub use roadmap::{Roadmap, RoadmapSteps};
pub use steps::{stop_is_error, GIT_MISSING};

/// Collaborators the scaffold steps call into
#[derive(Clone)]
pub struct Services {
    pub config: Arc<dyn ConfigStore>,
    pub shell: Arc<dyn ShellExecutor>,
    pub prompt: Arc<dyn PromptService>,
}

impl Services {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        shell: Arc<dyn ShellExecutor>,
        prompt: Arc<dyn PromptService>,
    ) -> Self {
        Self {
            config,
            shell,
            prompt,
        }
    }

    /// Host implementations; `assume_yes` answers every confirmation with yes
    pub fn system(assume_yes: bool) -> Self {
        let prompt: Arc<dyn PromptService> = if assume_yes {
            Arc::new(AutoConfirm::yes())
        } else {
            Arc::new(TerminalPrompt::new())
        };
        Self::new(
            Arc::new(JsonConfigStore::new(ScaffoldConfig::default().to_value())),
            Arc::new(SubprocessShell::new()),
            prompt,
        )
    }
}

/// What to scaffold and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldOptions {
    pub project_name: String,
    pub project_dir: PathBuf,
    pub config_path: PathBuf,
    /// Template URL taking precedence over the config's
    pub template: Option<String>,
}

impl ScaffoldOptions {
    /// Scaffold `project_name` into a directory of the same name under `parent`
    pub fn new(project_name: impl Into<String>, parent: &Path, config_path: impl Into<PathBuf>) -> Self {
        let project_name = project_name.into();
        Self {
            project_dir: parent.join(&project_name),
            project_name,
            config_path: config_path.into(),
            template: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

/// Check that `name` can be used as an npm package and directory name
pub fn validate_project_name(name: &str) -> Result<(), String> {
    let pattern = Regex::new(r"^[a-z0-9][a-z0-9._~-]*$").map_err(|e| e.to_string())?;

    if name.len() > 214 {
        return Err(format!("'{}' is longer than 214 characters", name));
    }
    if !pattern.is_match(name) {
        return Err(format!(
            "'{}' must be lowercase and may only contain letters, digits, '.', '_', '~' and '-'",
            name
        ));
    }
    Ok(())
}
