//! Command-line interface

pub mod commands;
pub mod output;

use crate::scaffold::default_config_path;
use clap::{Parser, Subcommand};
use commands::{ConfigCommand, NewCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Scaffold new front-end projects from a template repository
#[derive(Debug, Parser, Clone)]
#[command(name = "npfe")]
#[command(version = "0.1.0")]
#[command(about = "Scaffold a new front-end project from a template", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file (defaults to ~/npfe/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Create a new project
    New(NewCommand),

    /// Show the configuration
    Config(ConfigCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    /// The config file to use
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}
