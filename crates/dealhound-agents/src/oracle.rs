use std::time::Duration;

use async_trait::async_trait;
use dealhound_models::config::OracleConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AgentError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat completion request in the OpenAI wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub seed: u64,
    pub max_tokens: u32,
}

/// An opaque remote model that answers a chat request with short text.
/// Mockable for testing.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    fn model(&self) -> &str;

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleProvider {
    DeepSeek,
    OpenAi,
}

/// API keys for the oracle providers. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct OracleCredentials {
    pub deepseek_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

/// A resolved provider: where to send requests, with which model and key.
#[derive(Debug, Clone)]
pub struct OracleEndpoint {
    pub provider: OracleProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl OracleEndpoint {
    /// Pick a provider from the available credentials. DeepSeek wins when both keys are set.
    pub fn resolve(
        credentials: &OracleCredentials,
        config: &OracleConfig,
    ) -> Result<Self, AgentError> {
        let present = |key: &Option<String>| key.clone().filter(|k| !k.trim().is_empty());

        if let Some(api_key) = present(&credentials.deepseek_api_key) {
            return Ok(Self {
                provider: OracleProvider::DeepSeek,
                base_url: config.deepseek_base_url.clone(),
                model: config.deepseek_model.clone(),
                api_key,
            });
        }
        if let Some(api_key) = present(&credentials.openai_api_key) {
            return Ok(Self {
                provider: OracleProvider::OpenAi,
                base_url: config.openai_base_url.clone(),
                model: config.openai_model.clone(),
                api_key,
            });
        }

        Err(AgentError::Config(
            "No LLM API key found. Provide either OPENAI_API_KEY or DEEPSEEK_API_KEY".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Client for `/chat/completions` on OpenAI or any OpenAI-compatible provider.
pub struct OpenAiCompatibleOracle {
    client: reqwest::Client,
    endpoint: OracleEndpoint,
}

impl OpenAiCompatibleOracle {
    pub fn new(endpoint: OracleEndpoint, timeout: Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {e}")))?;

        info!(provider = ?endpoint.provider, model = %endpoint.model, "Scoring oracle ready");
        Ok(Self { client, endpoint })
    }

    pub fn provider(&self) -> OracleProvider {
        self.endpoint.provider
    }
}

#[async_trait]
impl ScoringOracle for OpenAiCompatibleOracle {
    fn model(&self) -> &str {
        &self.endpoint.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            seed = request.seed,
            max_tokens = request.max_tokens,
            "Calling scoring oracle"
        );

        let url = format!(
            "{}/chat/completions",
            self.endpoint.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.endpoint.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AgentError::Config(format!(
                "Oracle rejected credentials for {:?} (status {status})",
                self.endpoint.provider
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Scoring oracle call failed");
            return Err(AgentError::Oracle(format!("Status {status}: {body}")));
        }

        let parsed: ChatResponse = response.json().await?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Oracle("Response contained no choices".to_string()))?;

        Ok(reply.message.content.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn credentials(deepseek: Option<&str>, openai: Option<&str>) -> OracleCredentials {
        OracleCredentials {
            deepseek_api_key: deepseek.map(str::to_string),
            openai_api_key: openai.map(str::to_string),
        }
    }

    #[test]
    fn deepseek_preferred_when_both_present() {
        let endpoint =
            OracleEndpoint::resolve(&credentials(Some("ds"), Some("oa")), &OracleConfig::default())
                .unwrap();
        assert_eq!(endpoint.provider, OracleProvider::DeepSeek);
        assert_eq!(endpoint.model, "deepseek-chat");
        assert_eq!(endpoint.api_key, "ds");
    }

    #[test]
    fn openai_used_when_deepseek_missing_or_blank() {
        let endpoint =
            OracleEndpoint::resolve(&credentials(Some("  "), Some("oa")), &OracleConfig::default())
                .unwrap();
        assert_eq!(endpoint.provider, OracleProvider::OpenAi);
        assert_eq!(endpoint.model, "gpt-4o-mini");
    }

    #[test]
    fn missing_keys_is_a_configuration_error() {
        let err = OracleEndpoint::resolve(&credentials(None, None), &OracleConfig::default())
            .unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    fn endpoint_for(server: &MockServer) -> OracleEndpoint {
        OracleEndpoint {
            provider: OracleProvider::OpenAi,
            base_url: server.url("/v1"),
            model: "gpt-4o-mini".to_string(),
            api_key: "sk-test".to_string(),
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![
                ChatMessage::system("You estimate prices of items."),
                ChatMessage::user("How much does this cost?"),
                ChatMessage::assistant("Price is $"),
            ],
            seed: 42,
            max_tokens: 5,
        }
    }

    #[tokio::test]
    async fn sends_seed_and_token_budget() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(r#"{"seed": 42, "max_tokens": 5, "model": "gpt-4o-mini"}"#);
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"index": 0, "message": {"role": "assistant", "content": "349.99"}}]
                }));
            })
            .await;

        let oracle = OpenAiCompatibleOracle::new(endpoint_for(&server), Duration::from_secs(5))
            .unwrap();
        let reply = oracle.complete(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "349.99");
    }

    #[tokio::test]
    async fn unauthorized_is_a_configuration_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(401).body("invalid api key");
            })
            .await;

        let oracle = OpenAiCompatibleOracle::new(endpoint_for(&server), Duration::from_secs(5))
            .unwrap();
        let err = oracle.complete(&request()).await.unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[tokio::test]
    async fn server_error_is_an_oracle_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(500).body("overloaded");
            })
            .await;

        let oracle = OpenAiCompatibleOracle::new(endpoint_for(&server), Duration::from_secs(5))
            .unwrap();
        let err = oracle.complete(&request()).await.unwrap_err();
        assert!(matches!(err, AgentError::Oracle(ref msg) if msg.contains("overloaded")));
    }

    #[tokio::test]
    async fn null_content_is_an_empty_reply() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": null}}]
                }));
            })
            .await;

        let oracle = OpenAiCompatibleOracle::new(endpoint_for(&server), Duration::from_secs(5))
            .unwrap();
        assert_eq!(oracle.complete(&request()).await.unwrap(), "");
    }
}
