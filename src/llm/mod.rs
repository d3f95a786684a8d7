//! LLM client layer
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - Anthropic and OpenAI-compatible implementations
//! - A scriptable mock for tests

pub mod anthropic;
pub mod client;
pub mod mock;
pub mod openai;
pub mod types;

use std::sync::Arc;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{LlmClient, generate_text, try_generate_text};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use types::{CompletionRequest, CompletionResponse, LlmError, Message, Role, StopReason, Usage};

use crate::config::{LlmConfig, Provider};

/// Build the client for the configured provider
pub fn client_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let key_env = config.api_key_env();
    let client: Arc<dyn LlmClient> = match config.provider {
        Provider::Anthropic => Arc::new(AnthropicClient::from_env(
            key_env,
            AnthropicConfig::from_llm_config(config),
        )?),
        Provider::OpenAi | Provider::Groq => {
            Arc::new(OpenAiClient::from_env(key_env, OpenAiConfig::from_llm_config(config))?)
        }
    };
    log::info!("Using {:?} model {}", config.provider, client.model());
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let _role = Role::User;
        let _stop = StopReason::EndTurn;
    }

    #[test]
    fn test_client_from_config_requires_key() {
        let config = LlmConfig {
            api_key_env: Some("REFAGENT_TEST_NO_SUCH_KEY".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            client_from_config(&config),
            Err(LlmError::MissingApiKey { .. })
        ));
    }
}
