//! Configuration persistence: defaults, shallow merge on load, validated writes.

pub mod templates;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::ScribeError;

pub use templates::{DEFAULT_TEMPLATE, DEFAULT_TEMPLATE_NAME, DIFF_TOKEN};

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "COMMIT_SCRIBE_CONFIG";

/// Default cloud model identifier.
pub const DEFAULT_CLOUD_MODEL: &str = "gpt-4o-mini";

/// Default local model-serving endpoint.
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:11434";

/// Default local model identifier.
pub const DEFAULT_LOCAL_MODEL: &str = "llama3.2";

/// Every key accepted by [`ConfigStore::set_fields`], as spelled in the JSON file.
pub const FIELD_NAMES: &[&str] = &[
    "provider",
    "apiKey",
    "model",
    "localEndpoint",
    "localModel",
    "templates",
];

/// Backend used to generate commit messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible cloud API.
    #[serde(alias = "openai")]
    Cloud,
    /// Locally hosted model-serving endpoint.
    #[default]
    #[serde(alias = "ollama")]
    Local,
}

impl Provider {
    /// Returns the other provider.
    pub fn toggled(self) -> Self {
        match self {
            Self::Cloud => Self::Local,
            Self::Local => Self::Cloud,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloud => write!(f, "cloud"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl FromStr for Provider {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cloud" | "openai" => Ok(Self::Cloud),
            "local" | "ollama" => Ok(Self::Local),
            other => Err(ScribeError::InvalidFieldValue {
                key: "provider".to_string(),
                reason: format!("expected 'cloud' or 'local', got '{other}'"),
            }),
        }
    }
}

/// Persisted configuration.
///
/// `templates` always holds a [`DEFAULT_TEMPLATE_NAME`] entry once the value has
/// passed through [`ConfigStore::load`] or [`ConfigStore::set_fields`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Selected backend.
    pub provider: Provider,
    /// Cloud API key; empty when unset.
    pub api_key: String,
    /// Cloud model identifier.
    pub model: String,
    /// Base URL of the local model-serving endpoint.
    pub local_endpoint: String,
    /// Local model identifier.
    pub local_model: String,
    /// Template name to template file path.
    pub templates: BTreeMap<String, PathBuf>,
}

impl Config {
    /// Model identifier for the active provider.
    pub fn active_model(&self) -> &str {
        match self.provider {
            Provider::Cloud => &self.model,
            Provider::Local => &self.local_model,
        }
    }

    /// Removes template entries whose files no longer exist and returns their
    /// names.
    ///
    /// The default entry is kept even when its file is missing; it is
    /// recreated by [`ConfigStore::ensure_default_template`].
    pub fn prune_missing_templates(&mut self) -> Vec<String> {
        let stale: Vec<String> = self
            .templates
            .iter()
            .filter(|(name, path)| name.as_str() != DEFAULT_TEMPLATE_NAME && !path.exists())
            .map(|(name, _)| name.clone())
            .collect();

        for name in &stale {
            if let Some(path) = self.templates.remove(name) {
                debug!(template = %name, path = ?path, "Pruned template with missing file");
            }
        }

        stale
    }

    /// Copy of the configuration with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let len = copy.api_key.chars().count();
        if len > 12 {
            let visible: String = copy.api_key.chars().take(4).collect();
            copy.api_key = format!("{visible}****");
        } else if len > 0 {
            copy.api_key = "****".to_string();
        }
        copy
    }
}

/// Loads and persists the configuration file.
pub struct ConfigStore {
    config_path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }
}

impl ConfigStore {
    /// Creates a store for the default location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store backed by a custom file.
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Default config path (`~/.commit-scribe/config.json`), unless
    /// `COMMIT_SCRIBE_CONFIG` is set.
    pub fn default_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".commit-scribe")
            .join("config.json")
    }

    /// Location of the configuration file.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Directory holding template files, next to the configuration file.
    pub fn templates_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map_or_else(|| PathBuf::from("templates"), |dir| dir.join("templates"))
    }

    /// Path of the built-in default template file.
    pub fn default_template_path(&self) -> PathBuf {
        self.templates_dir().join("default.txt")
    }

    /// Hardcoded defaults used when no file exists.
    pub fn defaults(&self) -> Config {
        let mut templates = BTreeMap::new();
        templates.insert(
            DEFAULT_TEMPLATE_NAME.to_string(),
            self.default_template_path(),
        );

        Config {
            provider: Provider::Local,
            api_key: String::new(),
            model: DEFAULT_CLOUD_MODEL.to_string(),
            local_endpoint: DEFAULT_LOCAL_ENDPOINT.to_string(),
            local_model: DEFAULT_LOCAL_MODEL.to_string(),
            templates,
        }
    }

    /// Loads the configuration, shallow-merging the file over the defaults.
    ///
    /// A missing file yields the defaults. A file that is not a JSON object,
    /// or whose fields have the wrong types, fails with
    /// [`ScribeError::ConfigCorrupt`].
    pub fn load(&self) -> Result<Config> {
        let defaults = self.defaults();

        if !self.config_path.exists() {
            debug!(path = ?self.config_path, "No configuration file, using defaults");
            return Ok(defaults);
        }

        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let loaded: Value =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        let Value::Object(loaded) = loaded else {
            return Err(self.corrupt("expected a JSON object at the top level".to_string()));
        };

        let mut merged = to_object(&defaults)?;
        for (key, value) in loaded {
            if !FIELD_NAMES.contains(&key.as_str()) {
                warn!(field = %key, "Ignoring unknown configuration field");
                continue;
            }
            if value.is_null() {
                debug!(field = %key, "Null configuration field, keeping default");
                continue;
            }
            merged.insert(key, value);
        }

        let mut config: Config = serde_json::from_value(Value::Object(merged))
            .map_err(|e| self.corrupt(e.to_string()))?;

        if !config.templates.contains_key(DEFAULT_TEMPLATE_NAME) {
            debug!("Loaded templates lack a default entry, restoring it");
            config.templates.insert(
                DEFAULT_TEMPLATE_NAME.to_string(),
                self.default_template_path(),
            );
        }

        debug!(path = ?self.config_path, provider = %config.provider, "Loaded configuration");
        Ok(config)
    }

    /// Writes the whole configuration object to disk.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {parent:?}"))?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        std::fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;

        info!(path = ?self.config_path, "Saved configuration");
        Ok(())
    }

    /// Applies `(field, value)` pairs to the stored configuration and persists it.
    ///
    /// Every key is checked before anything is touched, so an unknown key
    /// fails with [`ScribeError::InvalidField`] and leaves the file as it was.
    /// Values are then applied one at a time; a value of the wrong shape fails
    /// with [`ScribeError::InvalidFieldValue`], also without writing.
    pub fn set_fields(&self, entries: &[(String, Value)]) -> Result<Config> {
        if let Some((key, _)) = entries
            .iter()
            .find(|(key, _)| !FIELD_NAMES.contains(&key.as_str()))
        {
            return Err(ScribeError::InvalidField(key.clone()).into());
        }

        let mut object = to_object(&self.load()?)?;

        for (key, value) in entries {
            let value = normalize_field_value(key, value)?;
            object.insert(key.clone(), value);
            serde_json::from_value::<Config>(Value::Object(object.clone())).map_err(|e| {
                ScribeError::InvalidFieldValue {
                    key: key.clone(),
                    reason: e.to_string(),
                }
            })?;
            debug!(field = %key, "Applied configuration field");
        }

        let mut config: Config = serde_json::from_value(Value::Object(object))
            .context("Failed to rebuild configuration")?;
        if !config.templates.contains_key(DEFAULT_TEMPLATE_NAME) {
            config.templates.insert(
                DEFAULT_TEMPLATE_NAME.to_string(),
                self.default_template_path(),
            );
        }

        self.save(&config)?;
        Ok(config)
    }

    /// Prunes stale templates and persists the result if anything changed.
    pub fn prune_and_persist(&self, config: &mut Config) -> Result<Vec<String>> {
        let removed = config.prune_missing_templates();
        if !removed.is_empty() {
            info!(removed = ?removed, "Removed templates with missing files");
            self.save(config)?;
        }
        Ok(removed)
    }

    fn corrupt(&self, reason: String) -> anyhow::Error {
        ScribeError::ConfigCorrupt {
            path: self.config_path.clone(),
            reason,
        }
        .into()
    }
}

/// Turns a textual `key=value` assignment into a field entry.
///
/// `templates` takes a JSON object; every other field takes the raw string.
pub fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let (key, value) = assignment.split_once('=').ok_or_else(|| {
        anyhow::anyhow!("Expected KEY=VALUE, got '{assignment}'")
    })?;
    let key = key.trim().to_string();

    let value = if key == "templates" {
        serde_json::from_str(value).map_err(|e| ScribeError::InvalidFieldValue {
            key: key.clone(),
            reason: format!("expected a JSON object: {e}"),
        })?
    } else {
        Value::String(value.to_string())
    };

    Ok((key, value))
}

/// Checks a field value and returns it in the spelling stored on disk.
fn normalize_field_value(key: &str, value: &Value) -> Result<Value> {
    match key {
        "provider" => {
            let text = value.as_str().ok_or_else(|| ScribeError::InvalidFieldValue {
                key: key.to_string(),
                reason: "expected a string".to_string(),
            })?;
            let provider = text.parse::<Provider>()?;
            return Ok(Value::String(provider.to_string()));
        }
        "localEndpoint" => {
            let text = value.as_str().ok_or_else(|| ScribeError::InvalidFieldValue {
                key: key.to_string(),
                reason: "expected a string".to_string(),
            })?;
            url::Url::parse(text).map_err(|e| ScribeError::InvalidFieldValue {
                key: key.to_string(),
                reason: format!("not a valid URL: {e}"),
            })?;
        }
        _ => {}
    }
    Ok(value.clone())
}

fn to_object(config: &Config) -> Result<Map<String, Value>> {
    match serde_json::to_value(config).context("Failed to serialize configuration")? {
        Value::Object(object) => Ok(object),
        other => anyhow::bail!("Configuration serialized to a non-object value: {other}"),
    }
}
