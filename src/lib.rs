//! # commit-scribe
//!
//! Generates conventional commit messages from the staged changes of a git
//! repository, using either a cloud chat-completion API or a locally hosted
//! model server.
//!
//! ## Quick Start
//!
//! ```no_run
//! use commit_scribe::{get_staged_diff, CommitMessageGenerator, ConfigStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = ConfigStore::new();
//! let config = store.load()?;
//! store.ensure_default_template(&config)?;
//!
//! let diff = get_staged_diff(std::path::Path::new("."))?;
//! let message = CommitMessageGenerator::new(&config).generate(&diff, None).await?;
//! println!("{message}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod git;

pub use crate::cli::Cli;
pub use crate::config::{Config, ConfigStore, Provider};
pub use crate::error::ScribeError;
pub use crate::generator::CommitMessageGenerator;
pub use crate::git::get_staged_diff;

/// The current version of commit-scribe.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
