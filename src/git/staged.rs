//! Staged diff extraction.

use std::path::Path;

use anyhow::Result;
use git2::{DiffFormat, ErrorCode, Repository};
use tracing::{debug, error};

use crate::error::ScribeError;

/// Returns the textual diff between `HEAD` and the index, the equivalent of
/// `git diff --cached`, for the repository containing `dir`.
///
/// The result may be empty. Any failure to open the repository or compute the
/// diff is logged and returned as [`ScribeError::GitUnavailable`].
pub fn get_staged_diff(dir: &Path) -> Result<String> {
    staged_diff(dir).map_err(|e| {
        error!(dir = ?dir, error = %e, "Failed to read staged changes");
        ScribeError::GitUnavailable(e.message().to_string()).into()
    })
}

fn staged_diff(dir: &Path) -> std::result::Result<String, git2::Error> {
    let repo = Repository::discover(dir)?;

    // An unborn branch has no HEAD tree; everything in the index is new.
    let head_tree = match repo.head() {
        Ok(head) => Some(head.peel_to_tree()?),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
        Err(e) => return Err(e),
    };

    let index = repo.index()?;
    let diff = repo.diff_tree_to_index(head_tree.as_ref(), Some(&index), None)?;

    let mut diff_content = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let content = String::from_utf8_lossy(line.content());
        let prefix = match line.origin() {
            origin @ ('+' | '-' | ' ') => Some(origin),
            _ => None,
        };
        if let Some(prefix) = prefix {
            diff_content.push(prefix);
        }
        diff_content.push_str(&content);
        true
    })?;

    debug!(
        repo = ?repo.workdir(),
        bytes = diff_content.len(),
        "Collected staged diff"
    );
    Ok(diff_content)
}
