//! Local model-serving endpoint client (Ollama-style API).

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{http_failure, join_url, ChatMessage, ProviderResponse, ResponseMessage};
use crate::error::ScribeError;

#[derive(Serialize, Debug)]
struct LocalChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// Chat reply from the local endpoint.
#[derive(Deserialize, Debug)]
pub struct LocalChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

impl LocalChatResponse {
    /// Content of the top-level message.
    pub fn into_text(self) -> Option<String> {
        self.message.and_then(|message| message.content)
    }
}

/// `models` entry: `name`, falling back to `model`.
#[derive(Deserialize, Debug)]
struct ModelTag {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

/// `tags` entry: `name`, falling back to `tag`.
#[derive(Deserialize, Debug)]
struct TagEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

/// Body of `GET /api/tags`.
#[derive(Deserialize, Debug, Default)]
pub struct TagsResponse {
    #[serde(default)]
    models: Option<Vec<ModelTag>>,
    #[serde(default)]
    tags: Option<Vec<TagEntry>>,
}

impl TagsResponse {
    /// Flattens either listing shape into model identifiers, dropping empty
    /// names. `models` wins when both are present.
    pub fn into_model_names(self) -> Vec<String> {
        let names: Vec<Option<String>> = if let Some(models) = self.models {
            models
                .into_iter()
                .map(|entry| non_empty(entry.name).or_else(|| non_empty(entry.model)))
                .collect()
        } else if let Some(tags) = self.tags {
            tags.into_iter()
                .map(|entry| non_empty(entry.name).or_else(|| non_empty(entry.tag)))
                .collect()
        } else {
            Vec::new()
        };

        names.into_iter().flatten().collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Client for a locally hosted model server.
pub struct LocalClient {
    client: Client,
    endpoint: String,
}

impl LocalClient {
    /// Creates a client for `endpoint`; a trailing slash is ignored.
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint base URL without trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends a single user message to `/api/chat`.
    pub async fn chat(&self, model: &str, user_prompt: &str) -> Result<ProviderResponse> {
        let request = LocalChatRequest {
            model,
            messages: vec![ChatMessage::user(user_prompt)],
            stream: false,
        };

        let url = join_url(&self.endpoint, "api/chat");
        info!(url = %url, model = %model, "Sending request to local provider");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScribeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(http_failure(status, &error_text).into());
        }

        let reply: LocalChatResponse = response
            .json()
            .await
            .map_err(|e| ScribeError::Transport(format!("invalid response body: {e}")))?;

        debug!(has_message = reply.message.is_some(), "Received local provider response");
        Ok(ProviderResponse::Local(reply))
    }

    /// Lists installed models from `/api/tags`. Errors propagate; callers that
    /// want best-effort behaviour go through [`super::ModelCatalog`].
    pub async fn list_tags(&self) -> Result<Vec<String>> {
        let url = join_url(&self.endpoint, "api/tags");
        debug!(url = %url, "Listing local models");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ScribeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(
                ScribeError::Transport(format!("HTTP {} from {url}", response.status())).into(),
            );
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ScribeError::Transport(format!("unexpected tags payload: {e}")))?;

        Ok(tags.into_model_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn names(body: &str) -> Vec<String> {
        serde_json::from_str::<TagsResponse>(body)
            .unwrap()
            .into_model_names()
    }

    #[test]
    fn models_array_uses_name_then_model() {
        assert_eq!(
            names(r#"{"models":[{"name":"a"},{"model":"b"}]}"#),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn tags_array_uses_name_then_tag() {
        assert_eq!(names(r#"{"tags":[{"tag":"c"}]}"#), vec!["c".to_string()]);
        assert_eq!(
            names(r#"{"tags":[{"name":"d","tag":"ignored"}]}"#),
            vec!["d".to_string()]
        );
    }

    #[test]
    fn empty_entries_are_dropped() {
        assert_eq!(
            names(r#"{"models":[{"name":""},{},{"name":"  ","model":"e"}]}"#),
            vec!["e".to_string()]
        );
    }

    #[test]
    fn missing_arrays_yield_nothing() {
        assert!(names("{}").is_empty());
        assert!(names(r#"{"other":[1]}"#).is_empty());
    }

    #[test]
    fn endpoint_trailing_slash_is_stripped() {
        let client = LocalClient::new("http://localhost:11434/");
        assert_eq!(client.endpoint(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn chat_sends_single_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-test",
                "stream": false,
                "messages": [{ "role": "user", "content": "prompt" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": { "role": "assistant", "content": "docs: z" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LocalClient::new(&server.uri());
        let response = client.chat("llama-test", "prompt").await.unwrap();
        assert_eq!(response.into_text(), Some("docs: z".to_string()));
    }

    #[tokio::test]
    async fn chat_maps_http_errors_to_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string("{\"error\":\"model 'nope' not found\"}\n"),
            )
            .mount(&server)
            .await;

        let client = LocalClient::new(&server.uri());
        let err = client.chat("nope", "prompt").await.unwrap_err();
        match err.downcast_ref::<ScribeError>() {
            Some(ScribeError::Transport(message)) => {
                assert!(message.contains("404"));
                assert!(message.contains("model 'nope' not found"));
                assert!(!message.contains('\n'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_tags_propagates_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = LocalClient::new(&server.uri());
        let err = client.list_tags().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScribeError>(),
            Some(ScribeError::Transport(_))
        ));
    }
}
