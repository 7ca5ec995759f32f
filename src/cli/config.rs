//! Configuration-related CLI commands.

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use super::menu::run_menu;
use crate::ai::ModelCatalog;
use crate::config::{parse_assignment, ConfigStore};

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Prints the effective configuration with the API key masked.
    Show,
    /// Prints the path of the configuration file.
    Path,
    /// Sets one or more fields, e.g. `provider=cloud model=gpt-4o-mini`.
    Set(SetCommand),
    /// Lists the models available for the active provider.
    Models,
    /// Edits the configuration through an interactive menu.
    Edit,
}

/// Set command options.
#[derive(Parser)]
pub struct SetCommand {
    /// `KEY=VALUE` assignments. `templates` takes a JSON object.
    #[arg(required = true)]
    pub assignments: Vec<String>,
}

impl ConfigCommand {
    /// Executes the config command.
    pub async fn execute(self, store: &ConfigStore) -> Result<()> {
        match self.command {
            ConfigSubcommands::Show => {
                let config = store.load()?;
                let json = serde_json::to_string_pretty(&config.redacted())
                    .context("Failed to serialize configuration")?;
                println!("{json}");
            }
            ConfigSubcommands::Path => println!("{}", store.path().display()),
            ConfigSubcommands::Set(set_cmd) => set_cmd.execute(store)?,
            ConfigSubcommands::Models => {
                let config = store.load()?;
                for model in ModelCatalog::new().resolve_model_options(&config).await? {
                    println!("{model}");
                }
            }
            ConfigSubcommands::Edit => {
                let stdin = io::stdin();
                let mut input = stdin.lock();
                let mut output = io::stdout();
                run_menu(store, &ModelCatalog::new(), &mut input, &mut output).await?;
            }
        }
        Ok(())
    }
}

impl SetCommand {
    /// Executes the set command.
    pub fn execute(self, store: &ConfigStore) -> Result<()> {
        let entries = self
            .assignments
            .iter()
            .map(String::as_str)
            .map(parse_assignment)
            .collect::<Result<Vec<_>>>()?;
        store.set_fields(&entries)?;
        println!("Updated {}", store.path().display());
        Ok(())
    }
}
