//! Scaffolder configuration document

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Configuration read from `~/npfe/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldConfig {
    /// Git URL of the template repository
    #[serde(default = "default_template")]
    pub template: String,

    /// Commands run inside the new project once it is renamed
    #[serde(default = "default_commands")]
    pub commands: Vec<String>,

    /// Extensions of files whose contents get the package name rewritten
    #[serde(default = "default_extensions")]
    pub replace_extensions: Vec<String>,
}

fn default_template() -> String {
    "https://github.com/stoyan/fail.git".to_string()
}

fn default_commands() -> Vec<String> {
    vec!["npm install".to_string()]
}

fn default_extensions() -> Vec<String> {
    [".html", ".css", ".js", ".json"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            commands: default_commands(),
            replace_extensions: default_extensions(),
        }
    }
}

impl ScaffoldConfig {
    /// Decode a loaded document, filling in defaults for missing fields
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn to_value(&self) -> Value {
        json!({
            "template": self.template,
            "commands": self.commands,
            "replace_extensions": self.replace_extensions,
        })
    }
}

/// Default location of the config file
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("npfe")
        .join("config.json")
}
