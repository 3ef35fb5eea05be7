//! Step functions of the scaffold roadmap
//!
//! Each constructor captures the collaborators it needs and returns a
//! [`StepFn`]. Arguments arrive in the order of the step's slots.

use crate::core::{arg_str, step_fn, StepError, StepFn, Value};
use crate::scaffold::config::ScaffoldConfig;
use crate::scaffold::rename;
use crate::services::{CommandSpec, ConfigStore, PromptService, ShellExecutor};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info, warn};

pub const POSTCRAFT: &str = "postcraft.txt";

/// Shutdown reason when git cannot be found
pub const GIT_MISSING: &str = "git is not found on PATH";

/// Whether a stop with `reason` means the scaffold could not run at all.
/// Declining to clear the destination is an orderly stop.
pub fn stop_is_error(reason: Option<&str>) -> bool {
    reason == Some(GIT_MISSING)
}

fn config_arg(args: &[Value], index: usize) -> Result<ScaffoldConfig, StepError> {
    let value = args
        .get(index)
        .ok_or_else(|| StepError::msg(format!("argument {} is missing", index)))?;
    Ok(ScaffoldConfig::from_value(value)?)
}

/// `[config_path]`: load the config document, creating the default when missing
pub fn get_config(store: Arc<dyn ConfigStore>) -> StepFn {
    step_fn(move |args, done| {
        let store = store.clone();
        async move {
            let path = PathBuf::from(arg_str(&args, 0)?);
            let raw = store.load_or_init(&path).await?;
            let config = ScaffoldConfig::from_value(&raw)?;
            done.complete(config.to_value())?;
            Ok(())
        }
    })
}

/// `[config, project_path]`: make sure git is available and the destination is free
pub fn preparations(shell: Arc<dyn ShellExecutor>, prompt: Arc<dyn PromptService>) -> StepFn {
    step_fn(move |args, done| {
        let shell = shell.clone();
        let prompt = prompt.clone();
        async move {
            let project_dir = PathBuf::from(arg_str(&args, 1)?);

            if shell.which("git").await.is_none() {
                error!("Error: git is not found");
                done.shutdown(GIT_MISSING)?;
                return Ok(());
            }

            info!("Project path: {}", project_dir.display());

            if fs::try_exists(&project_dir).await? {
                let question = format!(
                    "The directory {} already exists. Clear it?",
                    project_dir.display()
                );
                if !prompt.confirm(&question, false).await? {
                    done.shutdown(format!("{} already exists", project_dir.display()))?;
                    return Ok(());
                }

                if fs::metadata(&project_dir).await?.is_dir() {
                    fs::remove_dir_all(&project_dir).await?;
                } else {
                    fs::remove_file(&project_dir).await?;
                }
                info!("Cleared {}", project_dir.display());
            }

            done.complete(project_dir.to_string_lossy().into_owned())?;
            Ok(())
        }
    })
}

async fn clone_into(
    shell: &dyn ShellExecutor,
    template: &str,
    project_dir: &Path,
) -> Result<(), StepError> {
    let command = CommandSpec::new("git")
        .arg("clone")
        .arg("--depth")
        .arg("1")
        .arg(template)
        .arg(project_dir.to_string_lossy());

    info!("Cloning {}", template);
    let output = shell.run(&command).await?;
    if !output.success() {
        return Err(StepError::msg(format!(
            "`{}` exited with code {}: {}",
            command,
            output.status,
            output.stderr.trim()
        )));
    }

    let git_dir = project_dir.join(".git");
    if fs::try_exists(&git_dir).await? {
        fs::remove_dir_all(&git_dir).await?;
    }
    Ok(())
}

/// `[config, project_path, template_override]`: clone the template in the background.
/// Asks for the template URL when neither the override nor the config has one.
pub fn clone_template(shell: Arc<dyn ShellExecutor>, prompt: Arc<dyn PromptService>) -> StepFn {
    step_fn(move |args, done| {
        let shell = shell.clone();
        let prompt = prompt.clone();
        async move {
            let config = config_arg(&args, 0)?;
            let project_dir = PathBuf::from(arg_str(&args, 1)?);
            let template = match args.get(2).and_then(Value::as_str) {
                Some(template) => template.to_string(),
                None if config.template.trim().is_empty() => {
                    prompt.input("Template repository URL", None).await?
                }
                None => config.template,
            };
            let template = template.trim().to_string();
            if template.is_empty() {
                return Err(StepError::msg("no template repository given"));
            }

            // The step returns right away; the spawned task signals the result
            tokio::spawn(async move {
                let signalled = match clone_into(&*shell, &template, &project_dir).await {
                    Ok(()) => done.complete(project_dir.to_string_lossy().into_owned()),
                    Err(e) => done.fail(e.to_string()),
                };
                if let Err(e) = signalled {
                    warn!("{}", e);
                }
            });
            Ok(())
        }
    })
}

/// `[config, project_path, project_name]`: rewrite the template's package identity
pub fn rename_package() -> StepFn {
    step_fn(|args, done| async move {
        let config = config_arg(&args, 0)?;
        let root = PathBuf::from(arg_str(&args, 1)?);
        let name = arg_str(&args, 2)?.to_string();

        let walk_root = root.clone();
        let report = tokio::task::spawn_blocking(move || {
            rename::rename_project(&walk_root, &name, &config.replace_extensions)
        })
        .await
        .map_err(|e| StepError::msg(format!("rename task failed: {}", e)))??;

        done.complete(json!({
            "path": root.to_string_lossy(),
            "name": report.name,
            "previous": report.previous,
            "rewritten": report.rewritten.len(),
        }))?;
        Ok(())
    })
}

/// `[config, renamed]`: run the configured commands inside the project
pub fn follow_up(shell: Arc<dyn ShellExecutor>) -> StepFn {
    step_fn(move |args, done| {
        let shell = shell.clone();
        async move {
            let config = config_arg(&args, 0)?;
            let root = args
                .get(1)
                .and_then(|renamed| renamed.get("path"))
                .and_then(Value::as_str)
                .map(PathBuf::from)
                .ok_or_else(|| StepError::msg("renamed project has no path"))?;

            for line in &config.commands {
                info!("Running `{}` in {}", line, root.display());
                let output = shell
                    .run(&CommandSpec::shell(line.as_str()).current_dir(&root))
                    .await?;
                if !output.success() {
                    return Err(StepError::msg(format!(
                        "`{}` exited with code {}",
                        line, output.status
                    )));
                }
            }

            done.complete(config.commands)?;
            Ok(())
        }
    })
}

/// `[renamed, commands]`: collect the summary and the template's closing notes
pub fn report() -> StepFn {
    step_fn(|args, done| async move {
        let renamed = args
            .first()
            .cloned()
            .ok_or_else(|| StepError::msg("argument 0 is missing"))?;
        let commands = args.get(1).cloned().unwrap_or(Value::Null);
        let root = renamed
            .get("path")
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .ok_or_else(|| StepError::msg("renamed project has no path"))?;

        let notes_path = root.join(POSTCRAFT);
        let notes = match fs::read_to_string(&notes_path).await {
            Ok(notes) => {
                fs::remove_file(&notes_path).await?;
                Some(notes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        done.complete(json!({
            "path": renamed["path"],
            "name": renamed["name"],
            "commands": commands,
            "postcraft": notes,
        }))?;
        Ok(())
    })
}
