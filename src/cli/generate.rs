//! Commit message generation command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::config::ConfigStore;
use crate::generator::CommitMessageGenerator;
use crate::git::get_staged_diff;

/// Generates a commit message from the staged changes.
#[derive(Parser)]
pub struct GenerateCommand {
    /// Template to render (defaults to the `default` template).
    #[arg(long, short = 't')]
    pub template: Option<String>,

    /// Working directory of the repository.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

impl GenerateCommand {
    /// Executes the generate command.
    pub async fn execute(self, store: &ConfigStore) -> Result<()> {
        let config = store.load()?;
        store.ensure_default_template(&config)?;

        let diff = get_staged_diff(&self.dir)?;
        debug!(diff_len = diff.len(), "Read staged diff");

        let message = CommitMessageGenerator::new(&config)
            .generate(&diff, self.template.as_deref())
            .await?;

        println!("{message}");
        Ok(())
    }
}
