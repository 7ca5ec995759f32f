//! Template management commands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use super::editor::{open_in_editor, resolve_editor};
use crate::config::{ConfigStore, DEFAULT_TEMPLATE_NAME};
use crate::generator::resolve_template;

/// Template operations.
#[derive(Parser)]
pub struct TemplateCommand {
    /// Template subcommand to execute.
    #[command(subcommand)]
    pub command: TemplateSubcommands,
}

/// Template subcommands.
#[derive(Subcommand)]
pub enum TemplateSubcommands {
    /// Lists registered templates and their files.
    List,
    /// Creates a template from the default content and opens it for editing.
    Add(AddCommand),
    /// Opens a registered template in the editor.
    Edit(NameArg),
    /// Unregisters a template. The file is left on disk.
    Remove(NameArg),
}

/// Add command options.
#[derive(Parser)]
pub struct AddCommand {
    /// Template name.
    pub name: String,

    /// Register the template without opening the editor.
    #[arg(long)]
    pub no_edit: bool,
}

/// A template name argument.
#[derive(Parser)]
pub struct NameArg {
    /// Template name.
    pub name: String,
}

impl TemplateCommand {
    /// Executes the template command.
    pub fn execute(self, store: &ConfigStore) -> Result<()> {
        let mut config = store.load()?;

        match self.command {
            TemplateSubcommands::List => {
                for (name, path) in &config.templates {
                    if path.exists() {
                        println!("{name}\t{}", path.display());
                    } else {
                        println!("{name}\t{}\t(missing)", path.display());
                    }
                }
            }
            TemplateSubcommands::Add(add) => {
                let path = store.add_template(&mut config, &add.name)?;
                println!("Created template '{}' at {}", add.name, path.display());
                if !add.no_edit {
                    open_in_editor(&resolve_editor(), &path)?;
                    after_edit(store)?;
                }
            }
            TemplateSubcommands::Edit(arg) => {
                if arg.name == DEFAULT_TEMPLATE_NAME {
                    store.ensure_default_template(&config)?;
                }
                let path = resolve_template(&config, Some(&arg.name))?;
                open_in_editor(&resolve_editor(), &path)?;
                after_edit(store)?;
            }
            TemplateSubcommands::Remove(arg) => {
                let path = store.remove_template(&mut config, &arg.name)?;
                println!("Removed template '{}' (file kept at {})", arg.name, path.display());
            }
        }

        Ok(())
    }
}

/// Post-edit callback. Drops registrations whose files disappeared while the
/// editor was open.
fn after_edit(store: &ConfigStore) -> Result<()> {
    let mut config = store.load()?;
    let removed = store.prune_and_persist(&mut config)?;
    debug!(removed = ?removed, "Post-edit prune");
    Ok(())
}
