//! OpenAI-compatible chat completions client.
//!
//! Works against any endpoint speaking the `/chat/completions` dialect,
//! including Groq via its `openai/v1` base URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::LlmConfig;
use crate::llm::client::LlmClient;
use crate::llm::types::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

/// Sampling temperature used for every request
const TEMPERATURE: f64 = 0.7;

/// Configuration for the OpenAI-compatible client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn from_llm_config(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens.default,
            timeout: config.timeout(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Client for OpenAI-compatible APIs
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn from_env(api_key_env: &str, config: OpenAiConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(api_key_env).map_err(|_| LlmError::MissingApiKey {
            env_var: api_key_env.to_string(),
        })?;

        Self::with_api_key(api_key, config)
    }

    pub fn with_api_key(api_key: String, config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system.as_deref().filter(|s| !s.is_empty()) {
            messages.push(json!({"role": "system", "content": system}));
        }
        for message in &request.messages {
            messages.push(json!({"role": message.role.as_str(), "content": message.content}));
        }

        json!({
            "model": request.model.as_ref().unwrap_or(&self.config.model),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "temperature": TEMPERATURE,
            "messages": messages
        })
    }

    fn parse_response(body: Value) -> Result<CompletionResponse, LlmError> {
        let choice = body["choices"]
            .get(0)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        let content = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::InvalidResponse("choice has no message content".to_string()))?
            .to_string();

        let usage = body
            .get("usage")
            .map(|u| {
                Usage::new(
                    u["prompt_tokens"].as_u64().unwrap_or(0),
                    u["completion_tokens"].as_u64().unwrap_or(0),
                )
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            stop_reason: StopReason::from_api(choice["finish_reason"].as_str()),
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_request(&request);
        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(60),
            });
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Self::parse_response(response.json().await?)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use crate::llm::types::Message;

    fn groq_config() -> OpenAiConfig {
        let llm = LlmConfig {
            provider: Provider::Groq,
            model: "llama-3.1-8b-instant".to_string(),
            ..Default::default()
        };
        OpenAiConfig::from_llm_config(&llm)
    }

    #[test]
    fn test_endpoint_from_provider_default() {
        assert_eq!(
            groq_config().endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_request_puts_system_first() {
        let client = OpenAiClient::with_api_key("k".to_string(), groq_config()).unwrap();
        let request = CompletionRequest::new(Some("planner"))
            .with_messages(vec![Message::user("a"), Message::assistant("b")])
            .with_max_tokens(4096);

        let body = client.build_request(&request);
        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "a");
        assert_eq!(body["messages"][2]["role"], "assistant");
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "True"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 1}
        });
        let response = OpenAiClient::parse_response(body).unwrap();
        assert_eq!(response.content, "True");
        assert_eq!(response.usage, Usage::new(12, 1));
    }

    #[test]
    fn test_parse_response_without_choices() {
        let result = OpenAiClient::parse_response(json!({"choices": []}));
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }
}
