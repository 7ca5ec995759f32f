//! Model provider clients.

pub mod catalog;
pub mod cloud;
pub mod local;
pub mod prompts;
pub mod provider;

use serde::{Deserialize, Serialize};

use crate::error::ScribeError;

pub use catalog::ModelCatalog;
pub use cloud::CloudClient;
pub use local::LocalClient;
pub use provider::AiProvider;

/// Chat message sent to either provider.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Message role (`system` or `user`).
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Builds a `system` message.
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    /// Builds a `user` message.
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Message object inside a provider reply.
#[derive(Deserialize, Debug, Default)]
pub struct ResponseMessage {
    /// Generated text, if any.
    #[serde(default)]
    pub content: Option<String>,
}

/// Raw provider reply, tagged by the shape it arrived in.
#[derive(Debug)]
pub enum ProviderResponse {
    /// `{ choices: [{ message: { content } }] }`
    Cloud(cloud::ChatCompletionResponse),
    /// `{ message: { content } }`
    Local(local::LocalChatResponse),
}

impl ProviderResponse {
    /// Normalizes either shape to the generated text, if present.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Cloud(response) => response.into_text(),
            Self::Local(response) => response.into_text(),
        }
    }
}

/// Longest response body excerpt kept in a transport error.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Builds the transport error for a non-success HTTP reply. The body is
/// folded onto one line and shortened.
pub(crate) fn http_failure(status: reqwest::StatusCode, body: &str) -> ScribeError {
    let folded = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let excerpt = if folded.chars().count() > MAX_ERROR_BODY_CHARS {
        let head: String = folded.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{head}...")
    } else {
        folded
    };

    if excerpt.is_empty() {
        ScribeError::Transport(format!("HTTP {status}"))
    } else {
        ScribeError::Transport(format!("HTTP {status}: {excerpt}"))
    }
}

/// Joins a base URL and a path without doubling the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
