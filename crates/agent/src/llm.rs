use std::time::Duration;

use async_trait::async_trait;
use receptionist_core::config::{LlmConfig, LlmProvider};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Transport(String),
    #[error("llm endpoint returned status {0}")]
    Status(u16),
    #[error("llm response could not be decoded: {0}")]
    Decode(String),
    #[error("llm response contained no text")]
    EmptyResponse,
    #[error("llm api key is missing for provider `{0}`")]
    MissingApiKey(&'static str),
}

/// A single-shot text completion. Implementations return the raw reply text;
/// interpreting it is the caller's job.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Clone, Debug)]
pub struct HttpLlmClient {
    client: Client,
    provider: LlmProvider,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    max_tokens: u32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.provider.requires_api_key()
            && config.api_key.as_ref().map_or(true, |key| key.expose_secret().trim().is_empty())
        {
            return Err(LlmError::MissingApiKey(config.provider.as_str()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            provider: config.provider,
            base_url: config.effective_base_url().to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> String {
        let path = match self.provider {
            LlmProvider::Anthropic => "/v1/messages",
            LlmProvider::OpenAi => "/v1/chat/completions",
            LlmProvider::Ollama => "/api/generate",
        };
        format!("{}{path}", self.base_url)
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        match self.provider {
            LlmProvider::Anthropic => json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "messages": [{ "role": "user", "content": prompt }],
            }),
            LlmProvider::OpenAi => json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "messages": [{ "role": "user", "content": prompt }],
            }),
            LlmProvider::Ollama => json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "options": { "num_predict": self.max_tokens },
            }),
        }
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .ok_or(LlmError::MissingApiKey(self.provider.as_str()))
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut request = self.client.post(self.endpoint()).json(&self.request_body(prompt));
        request = match self.provider {
            LlmProvider::Anthropic => request
                .header("x-api-key", self.api_key()?)
                .header("anthropic-version", ANTHROPIC_VERSION),
            LlmProvider::OpenAi => request.bearer_auth(self.api_key()?),
            LlmProvider::Ollama => request,
        };

        let response =
            request.send().await.map_err(|error| LlmError::Transport(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|error| LlmError::Transport(error.to_string()))?;
        let text = extract_reply(self.provider, &body)?;
        debug!(
            provider = self.provider.as_str(),
            reply_len = text.len(),
            "llm completion received"
        );
        Ok(text)
    }
}

#[derive(Deserialize)]
struct AnthropicReply {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiReply {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OllamaReply {
    #[serde(default)]
    response: Option<String>,
}

fn extract_reply(provider: LlmProvider, body: &str) -> Result<String, LlmError> {
    let decode = |error: serde_json::Error| LlmError::Decode(error.to_string());
    let text = match provider {
        LlmProvider::Anthropic => serde_json::from_str::<AnthropicReply>(body)
            .map_err(decode)?
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text),
        LlmProvider::OpenAi => serde_json::from_str::<OpenAiReply>(body)
            .map_err(decode)?
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content),
        LlmProvider::Ollama => serde_json::from_str::<OllamaReply>(body).map_err(decode)?.response,
    };

    text.filter(|value| !value.trim().is_empty()).ok_or(LlmError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use receptionist_core::config::{LlmConfig, LlmProvider};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{extract_reply, HttpLlmClient, LlmClient, LlmError};

    fn config(provider: LlmProvider, base_url: &str) -> LlmConfig {
        LlmConfig {
            provider,
            api_key: Some("test-key".to_string().into()),
            base_url: Some(base_url.to_string()),
            model: "test-model".to_string(),
            timeout_secs: 2,
            max_tokens: 150,
        }
    }

    #[test]
    fn missing_api_key_is_rejected_for_hosted_providers() {
        let mut config = config(LlmProvider::Anthropic, "http://localhost:1");
        config.api_key = None;

        let error = HttpLlmClient::from_config(&config).expect_err("key required");
        assert!(matches!(error, LlmError::MissingApiKey("anthropic")));

        config.provider = LlmProvider::Ollama;
        assert!(HttpLlmClient::from_config(&config).is_ok());
    }

    #[test]
    fn replies_are_extracted_per_provider() {
        let anthropic = r#"{"content":[{"type":"text","text":"claims"}]}"#;
        let openai = r#"{"choices":[{"message":{"role":"assistant","content":"onboarding"}}]}"#;
        let ollama = r#"{"response":"unknown","done":true}"#;

        assert_eq!(extract_reply(LlmProvider::Anthropic, anthropic).ok(), Some("claims".into()));
        assert_eq!(extract_reply(LlmProvider::OpenAi, openai).ok(), Some("onboarding".into()));
        assert_eq!(extract_reply(LlmProvider::Ollama, ollama).ok(), Some("unknown".into()));
    }

    #[test]
    fn empty_or_malformed_replies_are_errors() {
        assert!(matches!(
            extract_reply(LlmProvider::Anthropic, r#"{"content":[]}"#),
            Err(LlmError::EmptyResponse)
        ));
        assert!(matches!(
            extract_reply(LlmProvider::Ollama, r#"{"response":"  "}"#),
            Err(LlmError::EmptyResponse)
        ));
        assert!(matches!(extract_reply(LlmProvider::OpenAi, "not json"), Err(LlmError::Decode(_))));
    }

    #[tokio::test]
    async fn anthropic_request_carries_key_and_version_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({ "model": "test-model", "max_tokens": 150 })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "content": [{ "type": "text", "text": "claims" }] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpLlmClient::from_config(&config(LlmProvider::Anthropic, &server.uri()))
            .expect("client");
        let reply = client.complete("Caller said: \"accident\"").await.expect("completion");

        assert_eq!(reply, "claims");
    }

    #[tokio::test]
    async fn openai_request_uses_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "onboarding" } }]
            })))
            .mount(&server)
            .await;

        let client = HttpLlmClient::from_config(&config(LlmProvider::OpenAi, &server.uri()))
            .expect("client");

        assert_eq!(client.complete("prompt").await.expect("completion"), "onboarding");
    }

    #[tokio::test]
    async fn ollama_request_disables_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({ "stream": false })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "response": "unknown" })),
            )
            .mount(&server)
            .await;

        let mut config = config(LlmProvider::Ollama, &server.uri());
        config.api_key = None;
        let client = HttpLlmClient::from_config(&config).expect("client");

        assert_eq!(client.complete("prompt").await.expect("completion"), "unknown");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529))
            .mount(&server)
            .await;

        let client = HttpLlmClient::from_config(&config(LlmProvider::Anthropic, &server.uri()))
            .expect("client");
        let error = client.complete("prompt").await.expect_err("overloaded");

        assert!(matches!(error, LlmError::Status(529)));
    }
}
