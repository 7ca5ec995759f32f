//! OpenAI-compatible cloud API client.

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{http_failure, join_url, ChatMessage, ProviderResponse, ResponseMessage};
use crate::error::ScribeError;

/// Default base URL of the cloud API.
pub const DEFAULT_CLOUD_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable overriding the cloud API base URL.
pub const CLOUD_BASE_URL_ENV: &str = "COMMIT_SCRIBE_CLOUD_URL";

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

/// One entry of `choices`.
#[derive(Deserialize, Debug)]
pub struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

/// Chat completion reply.
#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    /// Content of the first choice's message.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
    }
}

#[derive(Deserialize, Debug)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize, Debug)]
struct ModelEntry {
    id: String,
}

/// Cloud chat-completion client.
pub struct CloudClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CloudClient {
    /// Creates a client against [`DEFAULT_CLOUD_BASE_URL`].
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_CLOUD_BASE_URL.to_string())
    }

    /// Creates a client against a custom base URL.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    /// Base URL from `COMMIT_SCRIBE_CLOUD_URL`, or the default.
    pub fn base_url_from_env() -> String {
        std::env::var(CLOUD_BASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLOUD_BASE_URL.to_string())
    }

    /// Sends a system instruction plus one user message.
    pub async fn chat(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
        };

        let url = join_url(&self.base_url, "chat/completions");
        info!(url = %url, model = %model, "Sending request to cloud provider");
        debug!(
            system_prompt_len = system_prompt.len(),
            user_prompt_len = user_prompt.len(),
            "Built chat completion payload"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScribeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(http_failure(status, &error_text).into());
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ScribeError::Transport(format!("invalid response body: {e}")))?;

        debug!(
            choice_count = completion.choices.len(),
            "Received cloud provider response"
        );
        Ok(ProviderResponse::Cloud(completion))
    }

    /// Model identifiers reported by the model-list endpoint.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = join_url(&self.base_url, "models");
        debug!(url = %url, "Listing cloud models");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ScribeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(http_failure(status, &error_text).into());
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| ScribeError::Transport(format!("invalid model list: {e}")))?;

        Ok(list.data.into_iter().map(|entry| entry.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn into_text_takes_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"one"}},{"message":{"content":"two"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), Some("one".to_string()));
    }

    #[test]
    fn into_text_handles_missing_parts() {
        for body in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{}}]}"#,
        ] {
            let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
            assert_eq!(response.into_text(), None, "body: {body}");
        }
    }

    #[tokio::test]
    async fn chat_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-test",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "usr" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "fix: y" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CloudClient::with_base_url("sk-test".to_string(), server.uri());
        let response = client.chat("gpt-test", "sys", "usr").await.unwrap();
        assert_eq!(response.into_text(), Some("fix: y".to_string()));
    }

    #[tokio::test]
    async fn chat_maps_http_errors_to_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key\ntry again"))
            .mount(&server)
            .await;

        let client = CloudClient::with_base_url("sk-test".to_string(), server.uri());
        let err = client.chat("gpt-test", "sys", "usr").await.unwrap_err();
        match err.downcast_ref::<ScribeError>() {
            Some(ScribeError::Transport(message)) => {
                assert!(message.contains("401"));
                assert!(message.contains("bad key try again"));
                assert!(!message.contains('\n'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn base_url_env_overrides_default() {
        std::env::set_var(CLOUD_BASE_URL_ENV, "http://proxy.internal/v1");
        let overridden = CloudClient::base_url_from_env();
        std::env::set_var(CLOUD_BASE_URL_ENV, "   ");
        let blank = CloudClient::base_url_from_env();
        std::env::remove_var(CLOUD_BASE_URL_ENV);

        assert_eq!(overridden, "http://proxy.internal/v1");
        assert_eq!(blank, DEFAULT_CLOUD_BASE_URL);
    }

    #[tokio::test]
    async fn list_models_reads_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "id": "gpt-a" }, { "id": "gpt-b" }]
            })))
            .mount(&server)
            .await;

        let client = CloudClient::with_base_url("sk-test".to_string(), server.uri());
        assert_eq!(
            client.list_models().await.unwrap(),
            vec!["gpt-a".to_string(), "gpt-b".to_string()]
        );
    }
}
