use anyhow::{Context, Result};
use npfe::cli::commands::{ConfigCommand, NewCommand};
use npfe::cli::output::*;
use npfe::cli::{Cli, Command};
use npfe::execution::{EngineConfig, ExecutionEngine, ExecutionEvent};
use npfe::scaffold::{stop_is_error, Roadmap, ScaffoldConfig, ScaffoldOptions, Services};
use npfe::services::{ConfigStore, JsonConfigStore};
use npfe::RunOutcome;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let config_path = cli.config_path();
    match &cli.command {
        Command::New(cmd) => create_project(cmd, config_path).await?,
        Command::Config(cmd) => show_config(cmd, config_path).await?,
    }

    Ok(())
}

async fn create_project(cmd: &NewCommand, config_path: PathBuf) -> Result<()> {
    let directory = std::path::absolute(&cmd.directory)
        .with_context(|| format!("Invalid directory {}", cmd.directory.display()))?;

    let mut options = ScaffoldOptions::new(&cmd.name, &directory, config_path);
    if let Some(template) = &cmd.template {
        options = options.with_template(template);
    }

    let roadmap = Roadmap::build(&options, &Services::system(cmd.yes));
    let steps = roadmap.steps;

    let mut config = EngineConfig::new();
    if let Some(timeout) = cmd.step_timeout() {
        config = config.with_step_timeout(timeout);
    }
    let mut engine = ExecutionEngine::with_config(roadmap.pipeline, config);

    // A spinner would draw over interactive prompts
    let spinner = cmd.yes.then(create_spinner);
    let progress = spinner.clone();
    engine.add_event_handler(move |event| {
        let line = format_execution_event(&event);
        match &progress {
            Some(bar) => {
                if let ExecutionEvent::StepStarted { step, .. } = &event {
                    bar.set_message(step.label.clone());
                }
                bar.println(line);
            }
            None => println!("{}", line),
        }
    });

    let outcome = engine.execute(&steps.entries()).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    match &outcome {
        RunOutcome::AllResolved { .. } => {
            if let Some(report) = outcome.value(steps.report) {
                println!(
                    "\n{} Created {} in {}",
                    CHECK,
                    style(report["name"].as_str().unwrap_or(&cmd.name)).bold(),
                    style(report["path"].as_str().unwrap_or_default()).cyan()
                );
                if let Some(notes) = report.get("postcraft").filter(|notes| !notes.is_null()) {
                    println!("\n{}", format_value(notes, 20));
                }
            }
            Ok(())
        }
        RunOutcome::ShutdownRequested { step, reason, .. } => {
            println!(
                "\n{} Stopped at {}{}",
                WARN,
                style(&step.label).yellow(),
                reason
                    .as_deref()
                    .map(|reason| format!(": {}", reason))
                    .unwrap_or_default()
            );
            // Declining to clear the directory is not a failure
            if stop_is_error(reason.as_deref()) {
                std::process::exit(1);
            }
            Ok(())
        }
        RunOutcome::FailedAt { step, error, .. } => {
            println!("\n{} {} {}", CROSS, style(&step.label).bold(), style("failed").red());
            error!("{}", error);
            std::process::exit(1);
        }
    }
}

async fn show_config(cmd: &ConfigCommand, config_path: PathBuf) -> Result<()> {
    if cmd.path {
        println!("{}", config_path.display());
        return Ok(());
    }

    let store = JsonConfigStore::new(ScaffoldConfig::default().to_value());
    let raw = store
        .load_or_init(&config_path)
        .await
        .context("Failed to load config")?;
    let config = ScaffoldConfig::from_value(&raw)
        .with_context(|| format!("Invalid config in {}", config_path.display()))?;

    println!("{} Config: {}", INFO, style(config_path.display()).dim());
    println!("  Template: {}", style(&config.template).cyan());
    println!("  Commands:");
    for command in &config.commands {
        println!("    {}", command);
    }
    println!("  Rewritten extensions: {}", config.replace_extensions.join(" "));

    Ok(())
}
