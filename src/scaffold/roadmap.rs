//! The scaffold roadmap: one flat list of step declarations

use crate::core::{Pipeline, Slot, StepId};
use crate::scaffold::{steps, ScaffoldOptions, Services};
use serde_json::Value;

/// Handles of the roadmap's steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadmapSteps {
    pub get_config: StepId,
    pub preparations: StepId,
    pub clone_template: StepId,
    pub rename_package: StepId,
    pub follow_up: StepId,
    pub report: StepId,
}

impl RoadmapSteps {
    /// Every step in declaration order; running them all as entries scaffolds the project
    pub fn entries(&self) -> Vec<StepId> {
        vec![
            self.get_config,
            self.preparations,
            self.clone_template,
            self.rename_package,
            self.follow_up,
            self.report,
        ]
    }
}

#[derive(Debug)]
pub struct Roadmap {
    pub pipeline: Pipeline,
    pub steps: RoadmapSteps,
}

impl Roadmap {
    pub fn build(options: &ScaffoldOptions, services: &Services) -> Self {
        let mut pipeline = Pipeline::new(format!("new {}", options.project_name));

        let config_path = options.config_path.to_string_lossy().into_owned();
        let project_dir = options.project_dir.to_string_lossy().into_owned();
        let template = options
            .template
            .clone()
            .map(Value::from)
            .unwrap_or(Value::Null);

        let get_config = pipeline.declare(
            "get_config",
            vec![Slot::literal(config_path)],
            steps::get_config(services.config.clone()),
        );
        let preparations = pipeline.declare(
            "preparations",
            vec![get_config.into(), Slot::literal(project_dir)],
            steps::preparations(services.shell.clone(), services.prompt.clone()),
        );
        let clone_template = pipeline.declare(
            "clone_template",
            vec![get_config.into(), preparations.into(), Slot::Literal(template)],
            steps::clone_template(services.shell.clone(), services.prompt.clone()),
        );
        let rename_package = pipeline.declare(
            "rename_package",
            vec![
                get_config.into(),
                clone_template.into(),
                Slot::literal(options.project_name.clone()),
            ],
            steps::rename_package(),
        );
        let follow_up = pipeline.declare(
            "follow_up",
            vec![get_config.into(), rename_package.into()],
            steps::follow_up(services.shell.clone()),
        );
        let report = pipeline.declare(
            "report",
            vec![rename_package.into(), follow_up.into()],
            steps::report(),
        );

        Self {
            pipeline,
            steps: RoadmapSteps {
                get_config,
                preparations,
                clone_template,
                rename_package,
                follow_up,
                report,
            },
        }
    }
}
