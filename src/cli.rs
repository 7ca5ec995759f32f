//! CLI interface for commit-scribe.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod config;
pub mod editor;
pub mod generate;
pub mod menu;
pub mod template;

use crate::config::ConfigStore;

/// commit-scribe: conventional commit messages from staged changes.
#[derive(Parser)]
#[command(name = "commit-scribe")]
#[command(about = "Generates commit messages from staged changes using a cloud or local model", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories.
#[derive(Subcommand)]
pub enum Commands {
    /// Generates a commit message for the staged changes.
    Generate(generate::GenerateCommand),
    /// Inspects and edits the configuration.
    Config(config::ConfigCommand),
    /// Manages prompt templates.
    Template(template::TemplateCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        let store = self
            .config_path
            .map_or_else(ConfigStore::new, ConfigStore::with_path);

        match self.command {
            Commands::Generate(generate_cmd) => generate_cmd.execute(&store).await,
            Commands::Config(config_cmd) => config_cmd.execute(&store).await,
            Commands::Template(template_cmd) => template_cmd.execute(&store),
        }
    }
}
