//! Scriptable LLM client for tests and dry runs.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::client::LlmClient;
use super::types::{CompletionRequest, CompletionResponse, LlmError};

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<String>>),
    Responder(Responder),
    Failing(String),
}

/// LLM client that answers from a fixed script and records every request.
pub struct MockLlmClient {
    script: Script,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    /// Reply with each response in order; fails once the queue runs dry.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(Script::Queue(Mutex::new(
            responses.into_iter().map(Into::into).collect(),
        )))
    }

    /// Compute each reply from the request.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self::with_script(Script::Responder(Box::new(responder)))
    }

    /// Fail every call with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_script(Script::Failing(message.into()))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let content = match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .ok_or_else(|| LlmError::InvalidResponse("mock script exhausted".to_string()))?,
            Script::Responder(responder) => responder(&request)?,
            Script::Failing(message) => return Err(LlmError::InvalidResponse(message.clone())),
        };

        Ok(CompletionResponse::text(content))
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
