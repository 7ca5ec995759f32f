//! Template files registered in the configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::{Config, ConfigStore};
use crate::error::ScribeError;

/// Name of the template that always exists.
pub const DEFAULT_TEMPLATE_NAME: &str = "default";

/// Placeholder replaced with the staged diff.
pub const DIFF_TOKEN: &str = "{{diff}}";

/// Content written for the default template on first use.
pub const DEFAULT_TEMPLATE: &str = "\
Write a commit message for the staged changes below.

Follow the Conventional Commits format: `<type>(<optional scope>): <description>`.
Use one of: feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert.
Keep the subject line under 72 characters and in the imperative mood.
Add a short body only when the change needs explanation.

{{diff}}
";

impl ConfigStore {
    /// Writes the built-in default template if the `default` entry points to a
    /// missing file. Returns the path of the default template.
    pub fn ensure_default_template(&self, config: &Config) -> Result<PathBuf> {
        let path = config
            .templates
            .get(DEFAULT_TEMPLATE_NAME)
            .cloned()
            .unwrap_or_else(|| self.default_template_path());

        if !path.exists() {
            write_template(&path, DEFAULT_TEMPLATE)?;
            info!(path = ?path, "Created default template");
        }

        Ok(path)
    }

    /// Registers a new template seeded with the default content and persists
    /// the configuration. Returns the template's path.
    pub fn add_template(&self, config: &mut Config, name: &str) -> Result<PathBuf> {
        validate_template_name(name)?;
        if config.templates.contains_key(name) {
            return Err(ScribeError::TemplateExists(name.to_string()).into());
        }

        let default_path = self.ensure_default_template(config)?;
        let path = self.templates_dir().join(format!("{name}.txt"));

        if !path.exists() {
            let seed = std::fs::read_to_string(&default_path)
                .with_context(|| format!("Failed to read default template: {default_path:?}"))?;
            write_template(&path, &seed)?;
        }

        config.templates.insert(name.to_string(), path.clone());
        self.save(config)?;

        info!(template = %name, path = ?path, "Registered template");
        Ok(path)
    }

    /// Unregisters a template and persists the configuration. The file itself
    /// stays on disk.
    pub fn remove_template(&self, config: &mut Config, name: &str) -> Result<PathBuf> {
        if name == DEFAULT_TEMPLATE_NAME {
            return Err(ScribeError::ProtectedTemplate(name.to_string()).into());
        }

        let path = config
            .templates
            .remove(name)
            .ok_or_else(|| ScribeError::UnknownTemplate(name.to_string()))?;
        self.save(config)?;

        info!(template = %name, "Unregistered template");
        Ok(path)
    }
}

/// Template names become file names inside the templates directory, so they
/// must be a single non-empty path component.
fn validate_template_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("template name must not be empty")
    } else if name.contains(['/', '\\']) || name.contains("..") {
        Some("template name must not contain path separators or '..'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ScribeError::InvalidFieldValue {
            key: "templates".to_string(),
            reason: format!("{reason}: '{name}'"),
        }
        .into()),
        None => Ok(()),
    }
}

fn write_template(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create template directory: {parent:?}"))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write template file: {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_template_contains_token() {
        assert!(DEFAULT_TEMPLATE.contains(DIFF_TOKEN));
    }

    #[test]
    fn ensure_default_template_creates_file_once() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::with_path(temp_dir.path().join("config.json"));
        let config = store.defaults();

        let path = store.ensure_default_template(&config).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_TEMPLATE);

        std::fs::write(&path, "custom {{diff}}").unwrap();
        store.ensure_default_template(&config).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "custom {{diff}}");
    }

    #[test]
    fn add_template_copies_default_and_persists() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::with_path(temp_dir.path().join("config.json"));
        let mut config = store.defaults();

        let path = store.add_template(&mut config, "short").unwrap();
        assert_eq!(path, store.templates_dir().join("short.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_TEMPLATE);
        assert_eq!(store.load().unwrap().templates.get("short"), Some(&path));

        let err = store.add_template(&mut config, "short").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScribeError>(),
            Some(ScribeError::TemplateExists(_))
        ));
    }

    #[test]
    fn add_template_rejects_names_outside_templates_dir() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::with_path(temp_dir.path().join("cfg").join("config.json"));
        let mut config = store.defaults();

        for name in ["../../escaped", "a/b", "a\\b", "..", "", "  "] {
            let err = store.add_template(&mut config, name).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<ScribeError>(),
                    Some(ScribeError::InvalidFieldValue { key, .. }) if key == "templates"
                ),
                "name {name:?} gave {err:#}"
            );
        }

        assert!(!temp_dir.path().join("escaped.txt").exists());
        assert!(!store.templates_dir().exists());
        assert_eq!(config.templates.len(), 1);
    }

    #[test]
    fn remove_template_protects_default() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::with_path(temp_dir.path().join("config.json"));
        let mut config = store.defaults();
        store.add_template(&mut config, "short").unwrap();

        let err = store
            .remove_template(&mut config, DEFAULT_TEMPLATE_NAME)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScribeError>(),
            Some(ScribeError::ProtectedTemplate(_))
        ));

        let err = store.remove_template(&mut config, "missing").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScribeError>(),
            Some(ScribeError::UnknownTemplate(_))
        ));

        let path = store.remove_template(&mut config, "short").unwrap();
        assert!(path.exists());
        assert!(!store.load().unwrap().templates.contains_key("short"));
    }
}
