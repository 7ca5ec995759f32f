//! Model listing for interactive selection.

use anyhow::Result;
use tracing::{debug, warn};

use super::{CloudClient, LocalClient};
use crate::config::{Config, Provider, DEFAULT_LOCAL_MODEL};
use crate::error::ScribeError;

/// Lists selectable model identifiers for either provider.
pub struct ModelCatalog {
    cloud_base_url: String,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            cloud_base_url: CloudClient::base_url_from_env(),
        }
    }
}

impl ModelCatalog {
    /// Creates a catalog using the configured cloud base URL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog against a custom cloud base URL.
    pub fn with_cloud_base_url(cloud_base_url: String) -> Self {
        Self { cloud_base_url }
    }

    /// Models reported by the cloud provider.
    ///
    /// Fails with [`ScribeError::MissingCredential`] before any request when
    /// `api_key` is empty; transport failures propagate.
    pub async fn list_cloud_models(&self, api_key: &str) -> Result<Vec<String>> {
        if api_key.trim().is_empty() {
            return Err(ScribeError::MissingCredential.into());
        }

        let client = CloudClient::with_base_url(api_key.to_string(), self.cloud_base_url.clone());
        let models = client.list_models().await?;
        debug!(count = models.len(), "Listed cloud models");
        Ok(models)
    }

    /// Models installed on the local endpoint.
    ///
    /// Best effort: any failure is logged and yields an empty list.
    pub async fn list_local_models(&self, endpoint: &str) -> Vec<String> {
        match LocalClient::new(endpoint).list_tags().await {
            Ok(models) => {
                debug!(endpoint = %endpoint, count = models.len(), "Listed local models");
                models
            }
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Could not list local models");
                Vec::new()
            }
        }
    }

    /// Options offered when choosing a model for the configured provider.
    ///
    /// The local branch never returns an empty list: it falls back to the
    /// configured local model, or [`DEFAULT_LOCAL_MODEL`].
    pub async fn resolve_model_options(&self, config: &Config) -> Result<Vec<String>> {
        match config.provider {
            Provider::Cloud => self.list_cloud_models(&config.api_key).await,
            Provider::Local => {
                let models = self.list_local_models(&config.local_endpoint).await;
                if !models.is_empty() {
                    return Ok(models);
                }

                let fallback = if config.local_model.trim().is_empty() {
                    DEFAULT_LOCAL_MODEL.to_string()
                } else {
                    config.local_model.clone()
                };
                debug!(model = %fallback, "Falling back to configured local model");
                Ok(vec![fallback])
            }
        }
    }
}
