//! Provider selection and dispatch.

use anyhow::Result;
use tracing::{debug, error, info};

use super::prompts::SYSTEM_PROMPT;
use super::{CloudClient, LocalClient, ProviderResponse};
use crate::config::{Config, Provider, DEFAULT_LOCAL_MODEL};
use crate::error::ScribeError;

/// Client for the provider selected in the configuration.
pub enum AiProvider {
    /// Cloud chat-completion API.
    Cloud {
        /// HTTP client.
        client: CloudClient,
        /// Model identifier.
        model: String,
    },
    /// Local model server.
    Local {
        /// HTTP client.
        client: LocalClient,
        /// Model identifier.
        model: String,
    },
}

impl AiProvider {
    /// Builds the provider named by `config.provider`.
    ///
    /// The cloud branch fails with [`ScribeError::MissingCredential`] or
    /// [`ScribeError::MissingModel`] before any client is created.
    pub fn from_config(config: &Config, cloud_base_url: &str) -> Result<Self> {
        match config.provider {
            Provider::Cloud => {
                if config.api_key.trim().is_empty() {
                    return Err(ScribeError::MissingCredential.into());
                }
                if config.model.trim().is_empty() {
                    return Err(ScribeError::MissingModel.into());
                }
                info!(model = %config.model, "Using cloud provider");
                Ok(Self::Cloud {
                    client: CloudClient::with_base_url(
                        config.api_key.clone(),
                        cloud_base_url.to_string(),
                    ),
                    model: config.model.clone(),
                })
            }
            Provider::Local => {
                let model = if config.local_model.trim().is_empty() {
                    DEFAULT_LOCAL_MODEL.to_string()
                } else {
                    config.local_model.clone()
                };
                info!(model = %model, endpoint = %config.local_endpoint, "Using local provider");
                Ok(Self::Local {
                    client: LocalClient::new(&config.local_endpoint),
                    model,
                })
            }
        }
    }

    /// Provider display name.
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Cloud { .. } => "cloud",
            Self::Local { .. } => "local",
        }
    }

    /// Model identifier in use.
    pub fn model_id(&self) -> &str {
        match self {
            Self::Cloud { model, .. } | Self::Local { model, .. } => model,
        }
    }

    /// Sends the rendered prompt and returns the trimmed reply text.
    ///
    /// Transport failures are logged and returned; an absent or blank reply is
    /// [`ScribeError::EmptyResponse`]. Nothing is retried.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let response: Result<ProviderResponse> = match self {
            Self::Cloud { client, model } => client.chat(model, SYSTEM_PROMPT, prompt).await,
            Self::Local { client, model } => client.chat(model, prompt).await,
        };

        let response = response.inspect_err(|e| {
            error!(provider = self.provider_name(), error = %e, "Provider request failed");
        })?;

        let text = response
            .into_text()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ScribeError::EmptyResponse {
                provider: self.provider_name().to_string(),
            })?;

        debug!(
            provider = self.provider_name(),
            response_len = text.len(),
            "Received commit message"
        );
        Ok(text)
    }
}
