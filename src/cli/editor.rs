//! External editor invocation.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Environment variable naming the preferred editor.
pub const EDITOR_ENV: &str = "COMMIT_SCRIBE_EDITOR";

/// Editor used when no environment variable names one.
pub const FALLBACK_EDITOR: &str = "vi";

/// Picks the editor command from `COMMIT_SCRIBE_EDITOR`, `VISUAL`, then
/// `EDITOR`.
pub fn resolve_editor() -> String {
    [EDITOR_ENV, "VISUAL", "EDITOR"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Splits an editor command string into the executable and its arguments.
///
/// Handles editors specified with arguments, e.g. `"code --wait"` becomes
/// `("code", vec!["--wait"])`.
pub(crate) fn parse_editor_command(editor: &str) -> (&str, Vec<&str>) {
    let mut parts = editor.split_whitespace();
    let cmd = parts.next().unwrap_or(editor);
    let args: Vec<&str> = parts.collect();
    (cmd, args)
}

/// Opens `path` in `editor` and waits for it to exit.
///
/// A non-zero exit status is logged, not treated as an error; failing to start
/// the editor is an error.
pub fn open_in_editor(editor: &str, path: &Path) -> Result<()> {
    let (editor_cmd, args) = parse_editor_command(editor);
    info!(editor = %editor, path = ?path, "Opening editor");

    let status = Command::new(editor_cmd)
        .args(args)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to execute editor '{editor}'"))?;

    if !status.success() {
        warn!(editor = %editor, code = ?status.code(), "Editor exited with non-zero status");
    }

    Ok(())
}
