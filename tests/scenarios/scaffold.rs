//! Test: Scaffold Roadmap - the full project scaffold against in-memory collaborators

use crate::helpers::*;
use npfe::core::RunOutcome;
use npfe::execution::ExecutionEngine;
use npfe::core::PipelineError;
use npfe::scaffold::{stop_is_error, Roadmap, RoadmapSteps, ScaffoldOptions, Services};
use npfe::services::AutoConfirm;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;

struct Harness {
    config: Arc<MockConfigStore>,
    shell: Arc<MockShell>,
    prompt: Arc<MockPrompt>,
}

impl Harness {
    fn new(shell: MockShell, answer: bool) -> Self {
        Self::with(scaffold_config(), shell, MockPrompt::answering(answer))
    }

    fn with(config: Value, shell: MockShell, prompt: MockPrompt) -> Self {
        Self {
            config: Arc::new(MockConfigStore::new(config)),
            shell: Arc::new(shell),
            prompt: Arc::new(prompt),
        }
    }

    fn services(&self) -> Services {
        Services::new(self.config.clone(), self.shell.clone(), self.prompt.clone())
    }

    async fn run(&self, options: &ScaffoldOptions) -> (RunOutcome, RoadmapSteps) {
        let roadmap = Roadmap::build(options, &self.services());
        let steps = roadmap.steps;
        let mut engine = ExecutionEngine::new(roadmap.pipeline);
        (engine.execute(&steps.entries()).await, steps)
    }
}

fn options(parent: &Path) -> ScaffoldOptions {
    ScaffoldOptions::new("my-app", parent, parent.join("npfe").join("config.json"))
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_scaffold_creates_renamed_project() {
    let parent = tempfile::tempdir().unwrap();
    let options = options(parent.path());
    let harness = Harness::new(MockShell::new(), true);

    let (outcome, steps) = harness.run(&options).await;
    assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);

    let project = &options.project_dir;
    let manifest = read_json(&project.join("package.json"));
    assert_eq!(manifest["name"], "my-app");
    assert_eq!(manifest["version"], "1.0.0");
    assert_eq!(
        fs::read_to_string(project.join("index.js")).unwrap(),
        "import my-app from 'my-app';"
    );
    assert_eq!(
        fs::read_to_string(project.join("README.md")).unwrap(),
        "# my-app\n\nHello"
    );
    assert!(!project.join(".git").exists());
    assert!(!project.join("postcraft.txt").exists());

    let report = outcome.value(steps.report).unwrap();
    assert_eq!(report["name"], "my-app");
    assert_eq!(report["postcraft"], "Run npm start");
    assert_eq!(report["commands"], json!(["npm install"]));

    // The config document is threaded as a step value
    assert_eq!(
        outcome.value(steps.get_config).unwrap()["template"],
        "https://example.com/template.git"
    );
    assert_eq!(harness.config.requested(), vec![options.config_path.clone()]);

    let commands = harness.shell.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].program, "git");
    assert_eq!(
        commands[0].args[..4],
        ["clone", "--depth", "1", "https://example.com/template.git"]
    );
    assert_eq!(commands[1].args.last().map(String::as_str), Some("npm install"));
    assert_eq!(commands[1].cwd.as_deref(), Some(project.as_path()));
    assert_eq!(harness.prompt.asked(), 0);
}

#[tokio::test]
async fn test_missing_git_shuts_down() {
    let parent = tempfile::tempdir().unwrap();
    let options = options(parent.path());
    let harness = Harness::new(MockShell::without_git(), true);

    let (outcome, _) = harness.run(&options).await;

    assert_shutdown_at(&outcome, "preparations");
    assert!(harness.shell.commands().is_empty());
    assert!(!options.project_dir.exists());
    match &outcome {
        RunOutcome::ShutdownRequested { reason, .. } => assert!(stop_is_error(reason.as_deref())),
        other => panic!("expected a shutdown, got {:?}", other),
    }
}

#[tokio::test]
async fn test_existing_directory_kept_when_declined() {
    let parent = tempfile::tempdir().unwrap();
    let options = options(parent.path());
    fs::create_dir_all(&options.project_dir).unwrap();
    fs::write(options.project_dir.join("notes.txt"), "keep me").unwrap();

    let harness = Harness::new(MockShell::new(), false);
    let (outcome, _) = harness.run(&options).await;

    assert_shutdown_at(&outcome, "preparations");
    assert_eq!(harness.prompt.asked(), 1);
    // An orderly stop, not a failed scaffold
    match &outcome {
        RunOutcome::ShutdownRequested { reason, .. } => assert!(!stop_is_error(reason.as_deref())),
        other => panic!("expected a shutdown, got {:?}", other),
    }
    assert_eq!(
        fs::read_to_string(options.project_dir.join("notes.txt")).unwrap(),
        "keep me"
    );
    assert!(harness.shell.commands().is_empty());
}

#[tokio::test]
async fn test_existing_directory_cleared_when_confirmed() {
    let parent = tempfile::tempdir().unwrap();
    let options = options(parent.path());
    fs::create_dir_all(&options.project_dir).unwrap();
    fs::write(options.project_dir.join("notes.txt"), "stale").unwrap();

    let harness = Harness::new(MockShell::new(), true);
    let (outcome, _) = harness.run(&options).await;

    assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
    assert_eq!(harness.prompt.asked(), 1);
    assert!(!options.project_dir.join("notes.txt").exists());
    assert!(options.project_dir.join("package.json").exists());
}

#[tokio::test]
async fn test_failing_follow_up_command() {
    let parent = tempfile::tempdir().unwrap();
    let options = options(parent.path());
    let harness = Harness::new(MockShell::new().failing_on("npm install"), true);

    let (outcome, steps) = harness.run(&options).await;

    assert_failed_at(&outcome, "follow_up");
    assert!(outcome.value(steps.report).is_none());
    // The report step never ran, so the notes are still there
    assert!(options.project_dir.join("postcraft.txt").exists());
}

#[tokio::test]
async fn test_template_override() {
    let parent = tempfile::tempdir().unwrap();
    let options = options(parent.path()).with_template("https://example.com/other.git");
    let harness = Harness::new(MockShell::new(), true);

    let (outcome, _) = harness.run(&options).await;

    assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
    let clone = &harness.shell.commands()[0];
    assert!(clone.args.contains(&"https://example.com/other.git".to_string()));
}

#[tokio::test]
async fn test_template_asked_when_config_has_none() {
    let parent = tempfile::tempdir().unwrap();
    let options = options(parent.path());
    let harness = Harness::with(
        json!({ "template": "", "commands": [] }),
        MockShell::new(),
        MockPrompt::answering(true).with_input("https://example.com/asked.git"),
    );

    let (outcome, _) = harness.run(&options).await;

    assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
    assert_eq!(harness.prompt.inputs(), 1);
    let clone = &harness.shell.commands()[0];
    assert!(clone.args.contains(&"https://example.com/asked.git".to_string()));
}

#[tokio::test]
async fn test_override_skips_template_question() {
    let parent = tempfile::tempdir().unwrap();
    let options = options(parent.path()).with_template("https://example.com/other.git");
    let harness = Harness::with(
        json!({ "template": "", "commands": [] }),
        MockShell::new(),
        MockPrompt::answering(true).with_input("https://example.com/asked.git"),
    );

    let (outcome, _) = harness.run(&options).await;

    assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
    assert_eq!(harness.prompt.inputs(), 0);
    assert!(harness.shell.commands()[0]
        .args
        .contains(&"https://example.com/other.git".to_string()));
}

#[tokio::test]
async fn test_missing_template_fails_without_terminal() {
    let parent = tempfile::tempdir().unwrap();
    let options = options(parent.path());
    let config = Arc::new(MockConfigStore::new(json!({ "template": "", "commands": [] })));
    let shell = Arc::new(MockShell::new());
    let services = Services::new(config, shell.clone(), Arc::new(AutoConfirm::yes()));

    let roadmap = Roadmap::build(&options, &services);
    let steps = roadmap.steps;
    let mut engine = ExecutionEngine::new(roadmap.pipeline);
    let outcome = engine.execute(&steps.entries()).await;

    assert_failed_at(&outcome, "clone_template");
    assert!(matches!(
        outcome.error(),
        Some(PipelineError::StepExecution { message, .. }) if message.contains("non-interactive")
    ));
    assert!(shell.commands().is_empty());
}
