//! Interactive configuration menu.
//!
//! The menu is a flat loop: every iteration shows the same action list, reads
//! one choice, applies it to a draft copy of the configuration and comes back
//! to the same dispatch point. Only `Apply` writes the draft to disk.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::debug;

use crate::ai::ModelCatalog;
use crate::config::{Config, ConfigStore, Provider};
use crate::error::ScribeError;

/// Selectable menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Toggle between cloud and local.
    SwitchProvider,
    /// Set the cloud API key.
    SetApiKey,
    /// Pick a model for the active provider.
    ChooseModel,
    /// Set the local endpoint URL.
    SetLocalEndpoint,
    /// Save the draft and leave.
    Apply,
    /// Discard the draft and leave.
    Cancel,
}

impl MenuAction {
    /// Entries in display order.
    pub const ALL: [Self; 6] = [
        Self::SwitchProvider,
        Self::SetApiKey,
        Self::ChooseModel,
        Self::SetLocalEndpoint,
        Self::Apply,
        Self::Cancel,
    ];

    /// Parses a 1-based index or a keyword.
    pub fn from_choice(choice: &str) -> Option<Self> {
        let choice = choice.trim().to_lowercase();
        if let Ok(index) = choice.parse::<usize>() {
            return index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied());
        }
        match choice.as_str() {
            "provider" => Some(Self::SwitchProvider),
            "key" | "apikey" => Some(Self::SetApiKey),
            "model" => Some(Self::ChooseModel),
            "endpoint" => Some(Self::SetLocalEndpoint),
            "apply" | "save" => Some(Self::Apply),
            "cancel" | "quit" | "q" => Some(Self::Cancel),
            _ => None,
        }
    }

    fn label(self, draft: &Config) -> String {
        match self {
            Self::SwitchProvider => format!(
                "Switch provider (now: {}, switch to {})",
                draft.provider,
                draft.provider.toggled()
            ),
            Self::SetApiKey => "Set cloud API key".to_string(),
            Self::ChooseModel => format!("Choose model (now: {})", draft.active_model()),
            Self::SetLocalEndpoint => {
                format!("Set local endpoint (now: {})", draft.local_endpoint)
            }
            Self::Apply => "Apply and exit".to_string(),
            Self::Cancel => "Cancel".to_string(),
        }
    }
}

/// Result of applying one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// Keep looping.
    Continue,
    /// Draft should be persisted; stop.
    Applied,
    /// Draft discarded; stop.
    Cancelled,
}

/// Applies `action` to `draft`. `value` carries the user's input for actions
/// that need one.
pub fn apply_action(
    draft: &mut Config,
    action: MenuAction,
    value: Option<&str>,
) -> Result<MenuOutcome> {
    let value = value.map(str::trim).unwrap_or_default();

    match action {
        MenuAction::SwitchProvider => {
            draft.provider = draft.provider.toggled();
        }
        MenuAction::SetApiKey => {
            draft.api_key = value.to_string();
        }
        MenuAction::ChooseModel => {
            if value.is_empty() {
                return Err(ScribeError::InvalidFieldValue {
                    key: "model".to_string(),
                    reason: "no model selected".to_string(),
                }
                .into());
            }
            match draft.provider {
                Provider::Cloud => draft.model = value.to_string(),
                Provider::Local => draft.local_model = value.to_string(),
            }
        }
        MenuAction::SetLocalEndpoint => {
            url::Url::parse(value).map_err(|e| ScribeError::InvalidFieldValue {
                key: "localEndpoint".to_string(),
                reason: format!("not a valid URL: {e}"),
            })?;
            draft.local_endpoint = value.to_string();
        }
        MenuAction::Apply => return Ok(MenuOutcome::Applied),
        MenuAction::Cancel => return Ok(MenuOutcome::Cancelled),
    }

    debug!(action = ?action, "Applied menu action to draft");
    Ok(MenuOutcome::Continue)
}

/// Runs the menu against `input`/`output` until the user applies or cancels.
/// End of input counts as cancel.
pub async fn run_menu<R: BufRead, W: Write>(
    store: &ConfigStore,
    catalog: &ModelCatalog,
    input: &mut R,
    output: &mut W,
) -> Result<MenuOutcome> {
    let mut config = store.load()?;
    let removed = store.prune_and_persist(&mut config)?;
    if !removed.is_empty() {
        writeln!(output, "Removed missing templates: {}", removed.join(", "))?;
    }

    let mut draft = config;

    loop {
        writeln!(output)?;
        for (index, action) in MenuAction::ALL.iter().enumerate() {
            writeln!(output, "  {}. {}", index + 1, action.label(&draft))?;
        }
        write!(output, "Choose an action: ")?;
        output.flush()?;

        let Some(choice) = read_line(input)? else {
            return Ok(MenuOutcome::Cancelled);
        };
        let Some(action) = MenuAction::from_choice(&choice) else {
            writeln!(output, "Invalid choice '{}'.", choice.trim())?;
            continue;
        };

        let value = match action {
            MenuAction::SetApiKey => prompt(input, output, "API key: ")?,
            MenuAction::SetLocalEndpoint => prompt(input, output, "Endpoint URL: ")?,
            MenuAction::ChooseModel => match catalog.resolve_model_options(&draft).await {
                Ok(options) => {
                    for (index, model) in options.iter().enumerate() {
                        writeln!(output, "  {}. {model}", index + 1)?;
                    }
                    prompt(input, output, "Model number: ")?.and_then(|selection| {
                        selection
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|n| n.checked_sub(1))
                            .and_then(|i| options.get(i).cloned())
                    })
                }
                Err(e) => {
                    writeln!(output, "Could not list models: {e}")?;
                    continue;
                }
            },
            _ => None,
        };

        match apply_action(&mut draft, action, value.as_deref()) {
            Ok(MenuOutcome::Continue) => {}
            Ok(MenuOutcome::Applied) => {
                store.save(&draft)?;
                writeln!(output, "Configuration saved to {}", store.path().display())?;
                return Ok(MenuOutcome::Applied);
            }
            Ok(MenuOutcome::Cancelled) => {
                writeln!(output, "No changes saved.")?;
                return Ok(MenuOutcome::Cancelled);
            }
            Err(e) => writeln!(output, "{e}")?,
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> Result<Option<String>> {
    write!(output, "{label}")?;
    output.flush()?;
    read_line(input)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use tempfile::tempdir;

    fn unreachable_catalog() -> ModelCatalog {
        ModelCatalog::with_cloud_base_url("http://127.0.0.1:1".to_string())
    }

    #[test]
    fn from_choice_accepts_index_and_keyword() {
        assert_eq!(MenuAction::from_choice("1"), Some(MenuAction::SwitchProvider));
        assert_eq!(MenuAction::from_choice(" 5\n"), Some(MenuAction::Apply));
        assert_eq!(MenuAction::from_choice("Model"), Some(MenuAction::ChooseModel));
        assert_eq!(MenuAction::from_choice("0"), None);
        assert_eq!(MenuAction::from_choice("7"), None);
        assert_eq!(MenuAction::from_choice("dance"), None);
    }

    #[test]
    fn apply_action_updates_draft() {
        let temp_dir = tempdir().unwrap();
        let mut draft = ConfigStore::with_path(temp_dir.path().join("c.json")).defaults();

        assert_eq!(
            apply_action(&mut draft, MenuAction::SwitchProvider, None).unwrap(),
            MenuOutcome::Continue
        );
        assert_eq!(draft.provider, Provider::Cloud);

        apply_action(&mut draft, MenuAction::SetApiKey, Some(" sk-abc \n")).unwrap();
        assert_eq!(draft.api_key, "sk-abc");

        apply_action(&mut draft, MenuAction::ChooseModel, Some("gpt-test")).unwrap();
        assert_eq!(draft.model, "gpt-test");

        assert!(apply_action(&mut draft, MenuAction::SetLocalEndpoint, Some("nope")).is_err());
        apply_action(&mut draft, MenuAction::SetLocalEndpoint, Some("http://box:11434")).unwrap();
        assert_eq!(draft.local_endpoint, "http://box:11434");

        assert_eq!(
            apply_action(&mut draft, MenuAction::Apply, None).unwrap(),
            MenuOutcome::Applied
        );
        assert_eq!(
            apply_action(&mut draft, MenuAction::Cancel, None).unwrap(),
            MenuOutcome::Cancelled
        );
    }

    #[tokio::test]
    async fn apply_persists_draft() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::with_path(temp_dir.path().join("config.json"));
        let mut input = Cursor::new("1\n2\nsk-menu\n5\n");
        let mut output = Vec::new();

        let outcome = run_menu(&store, &unreachable_catalog(), &mut input, &mut output)
            .await
            .unwrap();
        assert_eq!(outcome, MenuOutcome::Applied);

        let saved = store.load().unwrap();
        assert_eq!(saved.provider, Provider::Cloud);
        assert_eq!(saved.api_key, "sk-menu");
    }

    #[tokio::test]
    async fn cancel_discards_draft() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::with_path(temp_dir.path().join("config.json"));
        let mut input = Cursor::new("1\nbogus\n6\n");
        let mut output = Vec::new();

        let outcome = run_menu(&store, &unreachable_catalog(), &mut input, &mut output)
            .await
            .unwrap();
        assert_eq!(outcome, MenuOutcome::Cancelled);
        assert!(!store.path().exists());
        assert!(String::from_utf8(output).unwrap().contains("Invalid choice 'bogus'"));
    }

    #[tokio::test]
    async fn end_of_input_cancels() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::with_path(temp_dir.path().join("config.json"));
        let mut input = Cursor::new("1\n");
        let mut output = Vec::new();

        let outcome = run_menu(&store, &unreachable_catalog(), &mut input, &mut output)
            .await
            .unwrap();
        assert_eq!(outcome, MenuOutcome::Cancelled);
    }

    #[tokio::test]
    async fn choose_model_offers_local_fallback() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::with_path(temp_dir.path().join("config.json"));
        store
            .set_fields(&[
                (
                    "localEndpoint".to_string(),
                    serde_json::Value::String("http://127.0.0.1:1".to_string()),
                ),
                (
                    "localModel".to_string(),
                    serde_json::Value::String("mistral".to_string()),
                ),
            ])
            .unwrap();

        let mut input = Cursor::new("3\n1\n5\n");
        let mut output = Vec::new();
        run_menu(&store, &unreachable_catalog(), &mut input, &mut output)
            .await
            .unwrap();

        assert!(String::from_utf8(output).unwrap().contains("1. mistral"));
        assert_eq!(store.load().unwrap().local_model, "mistral");
    }

    #[tokio::test]
    async fn stale_templates_are_pruned_before_showing_menu() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::with_path(temp_dir.path().join("config.json"));
        store
            .set_fields(&[(
                "templates".to_string(),
                serde_json::json!({ "gone": temp_dir.path().join("gone.txt") }),
            )])
            .unwrap();

        let mut input = Cursor::new("6\n");
        let mut output = Vec::new();
        run_menu(&store, &unreachable_catalog(), &mut input, &mut output)
            .await
            .unwrap();

        assert!(String::from_utf8(output).unwrap().contains("Removed missing templates: gone"));
        assert!(!store.load().unwrap().templates.contains_key("gone"));
    }
}
