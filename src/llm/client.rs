//! Core LLM client trait and the text-only transport wrapper

use async_trait::async_trait;

use super::types::{CompletionRequest, CompletionResponse, LlmError, Message};

/// Stateless LLM client - each call carries its full message history
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when the request does not name one
    fn model(&self) -> &str;
}

/// Send one request and return the reply text.
///
/// Transport failures never propagate: they come back as a human-readable
/// `An error occurred: ...` string, which downstream gates treat like any
/// other unusable reply.
pub async fn generate_text(
    client: &dyn LlmClient,
    system: Option<&str>,
    messages: Vec<Message>,
    max_tokens: u32,
) -> String {
    match try_generate_text(client, system, messages, max_tokens).await {
        Ok(text) => text,
        Err(e) => {
            log::warn!("LLM call failed ({}): {}", client.model(), e);
            format!("An error occurred: {}", e)
        }
    }
}

/// Like [`generate_text`] but keeps the error for callers that have a better fallback.
pub async fn try_generate_text(
    client: &dyn LlmClient,
    system: Option<&str>,
    messages: Vec<Message>,
    max_tokens: u32,
) -> Result<String, LlmError> {
    let request = CompletionRequest::new(system)
        .with_messages(messages)
        .with_max_tokens(max_tokens);
    let response = client.complete(request).await?;
    log::debug!(
        "LLM reply: {} chars, {} tokens",
        response.content.len(),
        response.usage.total()
    );
    Ok(response.content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn test_generate_text_returns_trimmed_reply() {
        let client = MockLlmClient::scripted(["  true \n"]);
        let text = generate_text(&client, None, vec![Message::user("q")], 16).await;
        assert_eq!(text, "true");
    }

    #[tokio::test]
    async fn test_generate_text_turns_errors_into_text() {
        let client = MockLlmClient::failing("connection refused");
        let text = generate_text(&client, Some("sys"), vec![Message::user("q")], 16).await;
        assert!(text.starts_with("An error occurred:"));
        assert!(text.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_try_generate_text_keeps_error() {
        let client = MockLlmClient::failing("boom");
        let result = try_generate_text(&client, None, vec![Message::user("q")], 16).await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_request_carries_system_and_tokens() {
        let client = MockLlmClient::scripted(["ok"]);
        generate_text(&client, Some("be terse"), vec![Message::user("q")], 99).await;

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some("be terse"));
        assert_eq!(requests[0].max_tokens, Some(99));
    }
}
