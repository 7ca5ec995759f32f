//! Commit message generation: template resolution, rendering and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::ai::{AiProvider, CloudClient};
use crate::config::{Config, DEFAULT_TEMPLATE_NAME, DIFF_TOKEN};
use crate::error::ScribeError;

/// Looks up the template file for `name`, or the default template when no
/// name is given.
pub fn resolve_template(config: &Config, name: Option<&str>) -> Result<PathBuf> {
    let name = name.unwrap_or(DEFAULT_TEMPLATE_NAME);
    let path = config
        .templates
        .get(name)
        .ok_or_else(|| ScribeError::UnknownTemplate(name.to_string()))?;

    if !path.exists() {
        return Err(ScribeError::TemplateFileMissing {
            name: name.to_string(),
            path: path.clone(),
        }
        .into());
    }

    Ok(path.clone())
}

/// Substitutes the first `{{diff}}` in `template` with `diff`.
///
/// Later occurrences are left as-is, and a template without the token is
/// returned unchanged.
pub fn render_template(template: &str, diff: &str) -> String {
    template.replacen(DIFF_TOKEN, diff, 1)
}

/// Turns a staged diff into a commit message using the configured provider.
pub struct CommitMessageGenerator<'a> {
    config: &'a Config,
    cloud_base_url: String,
}

impl<'a> CommitMessageGenerator<'a> {
    /// Creates a generator; the cloud base URL comes from the environment.
    pub fn new(config: &'a Config) -> Self {
        Self::with_cloud_base_url(config, CloudClient::base_url_from_env())
    }

    /// Creates a generator against a custom cloud base URL.
    pub fn with_cloud_base_url(config: &'a Config, cloud_base_url: String) -> Self {
        Self {
            config,
            cloud_base_url,
        }
    }

    /// Resolves and renders the prompt for `diff`.
    pub fn render_prompt(&self, diff: &str, template_name: Option<&str>) -> Result<String> {
        let path = resolve_template(self.config, template_name)?;
        let template = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read template file: {path:?}"))?;

        if !template.contains(DIFF_TOKEN) {
            debug!(path = ?path, "Template has no diff placeholder");
        }

        Ok(render_template(&template, diff))
    }

    /// Runs the whole pipeline and returns the trimmed commit message.
    ///
    /// An empty diff fails with [`ScribeError::NoStagedChanges`] before any
    /// provider is contacted.
    pub async fn generate(&self, diff: &str, template_name: Option<&str>) -> Result<String> {
        if diff.trim().is_empty() {
            return Err(ScribeError::NoStagedChanges.into());
        }

        let prompt = self.render_prompt(diff, template_name)?;
        let provider = AiProvider::from_config(self.config, &self.cloud_base_url)?;

        info!(
            provider = provider.provider_name(),
            model = provider.model_id(),
            prompt_len = prompt.len(),
            "Generating commit message"
        );

        provider.complete(&prompt).await
    }
}
