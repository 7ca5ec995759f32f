//! Error taxonomy for configuration, diff extraction and generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by commit-scribe operations.
///
/// Functions return `anyhow::Result`; callers that need to branch on the kind
/// of failure use `err.downcast_ref::<ScribeError>()`.
#[derive(Error, Debug)]
pub enum ScribeError {
    /// The configuration file exists but does not hold a valid configuration.
    #[error("Configuration file {path:?} is corrupt: {reason}")]
    ConfigCorrupt {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A configuration key that is not a recognized field.
    #[error("Unknown configuration field '{0}'")]
    InvalidField(String),

    /// A recognized field was given a value of the wrong shape.
    #[error("Invalid value for configuration field '{key}': {reason}")]
    InvalidFieldValue {
        /// Field name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The cloud provider needs an API key and none is configured.
    #[error("No API key configured for the cloud provider. Run `commit-scribe config set apiKey=<key>`")]
    MissingCredential,

    /// The cloud provider needs a model and none is configured.
    #[error("No model configured for the cloud provider. Run `commit-scribe config set model=<id>`")]
    MissingModel,

    /// The version-control collaborator could not produce a diff.
    #[error("Unable to read staged changes: {0}")]
    GitUnavailable(String),

    /// Nothing is staged for commit.
    #[error("No staged changes found. Stage files with `git add` first")]
    NoStagedChanges,

    /// A template name that is not registered in the configuration.
    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),

    /// A registered template whose file is gone.
    #[error("Template '{name}' points to a missing file: {path:?}")]
    TemplateFileMissing {
        /// Template name.
        name: String,
        /// Path recorded in the configuration.
        path: PathBuf,
    },

    /// Attempt to register a template name twice.
    #[error("Template '{0}' already exists")]
    TemplateExists(String),

    /// Attempt to unregister the default template.
    #[error("Template '{0}' cannot be removed")]
    ProtectedTemplate(String),

    /// The provider answered without any message content.
    #[error("The {provider} provider returned an empty response")]
    EmptyResponse {
        /// Provider display name.
        provider: String,
    },

    /// Network or HTTP failure talking to a provider.
    #[error("Request to model provider failed: {0}")]
    Transport(String),
}
