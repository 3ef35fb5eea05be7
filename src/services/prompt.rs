//! Interactive prompts

use crate::services::{PromptService, ServiceError};
use async_trait::async_trait;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use tracing::debug;

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

fn map_dialoguer_err(e: dialoguer::Error) -> ServiceError {
    ServiceError::Prompt(e.to_string())
}

fn map_join_err(e: tokio::task::JoinError) -> ServiceError {
    ServiceError::Internal(format!("prompt task failed: {}", e))
}

/// Prompts on the controlling terminal
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PromptService for TerminalPrompt {
    async fn confirm(&self, message: &str, default: bool) -> Result<bool, ServiceError> {
        let message = message.to_string();
        // dialoguer blocks on terminal input
        tokio::task::spawn_blocking(move || {
            Confirm::with_theme(&prompt_theme())
                .with_prompt(message)
                .default(default)
                .interact()
                .map_err(map_dialoguer_err)
        })
        .await
        .map_err(map_join_err)?
    }

    async fn input(&self, message: &str, default: Option<&str>) -> Result<String, ServiceError> {
        let message = message.to_string();
        let default = default.map(str::to_string);
        tokio::task::spawn_blocking(move || {
            let theme = prompt_theme();
            let input = Input::<String>::with_theme(&theme).with_prompt(message);
            let answer = match default {
                Some(default) => input.default(default).interact_text(),
                None => input.interact_text(),
            };
            answer.map_err(map_dialoguer_err)
        })
        .await
        .map_err(map_join_err)?
    }
}

/// Non-interactive prompt service: answers every question with a fixed choice
#[derive(Debug, Clone)]
pub struct AutoConfirm {
    answer: bool,
}

impl AutoConfirm {
    pub fn new(answer: bool) -> Self {
        Self { answer }
    }

    /// Answer yes to every confirmation
    pub fn yes() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl PromptService for AutoConfirm {
    async fn confirm(&self, message: &str, _default: bool) -> Result<bool, ServiceError> {
        debug!("Auto-answering '{}' with {}", message, self.answer);
        Ok(self.answer)
    }

    async fn input(&self, message: &str, default: Option<&str>) -> Result<String, ServiceError> {
        default.map(str::to_string).ok_or_else(|| {
            ServiceError::Prompt(format!("no default answer for '{}' in non-interactive mode", message))
        })
    }
}
