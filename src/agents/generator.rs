//! Candidate generation: one full-source rewrite per attempt.

use std::sync::Arc;

use super::conversation::Conversation;
use super::prompts::GENERATOR_PROMPT;
use crate::domain::Plan;
use crate::llm::{LlmClient, try_generate_text};
use crate::metrics::ClassMetrics;

/// Remove a surrounding three-backtick fence.
///
/// Only applies when the trimmed reply both starts and ends with a fence:
/// the opening line (fence plus language tag) and the closing line are
/// dropped, and a fence with no body yields an empty string. Any other reply
/// comes back unchanged.
pub fn strip_code_fence(reply: &str) -> String {
    let text = reply.trim();
    if !(text.starts_with("```") && text.ends_with("```")) {
        return reply.to_string();
    }

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 3 {
        return String::new();
    }
    lines[1..lines.len() - 1].join("\n")
}

/// Everything the generator is conditioned on besides the conversation
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub plan: &'a Plan,
    pub source: &'a str,
    pub metrics: Option<&'a ClassMetrics>,
    pub related: &'a [String],
}

impl GenerationRequest<'_> {
    pub fn query(&self) -> String {
        let metrics = self
            .metrics
            .map_or_else(|| "unavailable".to_string(), ToString::to_string);
        let related = if self.related.is_empty() {
            "none".to_string()
        } else {
            self.related.join(", ")
        };

        format!(
            "Follow these instructions:\n{}\n\n\
             Current metrics: {}\n\
             Dependent classes: {}\n\n\
             Improve the class below and its metrics. Assume it is functionally correct and keep the \
             behaviour of every externally visible method, with both syntax and semantics intact. \
             Keep all comments and annotations. Return the class in a code block without explanations.\n\n{}",
            self.plan.render(),
            metrics,
            related,
            self.source
        )
    }
}

pub struct Generator {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl Generator {
    pub fn new(client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    /// Produce the next candidate.
    ///
    /// The same query is sent every attempt; what changes between attempts is
    /// the feedback accumulated in `conversation`. Transport errors come back
    /// as error text, which then fails validation like any other bad candidate.
    pub async fn generate(&self, conversation: &mut Conversation, request: &GenerationRequest<'_>) -> String {
        conversation.push_user(request.query());

        match try_generate_text(
            self.client.as_ref(),
            Some(GENERATOR_PROMPT),
            conversation.messages().to_vec(),
            self.max_tokens,
        )
        .await
        {
            Ok(reply) => {
                conversation.push_assistant(reply.clone());
                strip_code_fence(&reply)
            }
            Err(e) => {
                log::warn!("Generator call failed: {}", e);
                format!("An error occurred: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanUnit;
    use crate::llm::{MockLlmClient, Role};

    fn plan() -> Plan {
        Plan {
            units: vec![PlanUnit::improve("start", "extract a helper")],
            raw: String::new(),
        }
    }

    #[test]
    fn test_strip_fence_with_language_tag() {
        let reply = "```java\nclass A {\n}\n```";
        assert_eq!(strip_code_fence(reply), "class A {\n}");
    }

    #[test]
    fn test_strip_fence_surrounding_whitespace() {
        assert_eq!(strip_code_fence("\n  ```\nclass A {}\n```  \n"), "class A {}");
    }

    #[test]
    fn test_strip_fence_too_short_is_empty() {
        assert_eq!(strip_code_fence("```java```"), "");
        assert_eq!(strip_code_fence("```\n```"), "");
    }

    #[test]
    fn test_unfenced_reply_is_verbatim() {
        assert_eq!(strip_code_fence("class A {}\n"), "class A {}\n");
        assert_eq!(
            strip_code_fence("Here it is:\n```java\nclass A {}\n```"),
            "Here it is:\n```java\nclass A {}\n```"
        );
    }

    #[test]
    fn test_query_mentions_everything() {
        let plan = plan();
        let related = vec!["Runner".to_string(), "VirtualMachineTest".to_string()];
        let request = GenerationRequest {
            plan: &plan,
            source: "class VirtualMachine {}",
            metrics: None,
            related: &related,
        };
        let query = request.query();
        assert!(query.contains("- start: extract a helper"));
        assert!(query.contains("Runner, VirtualMachineTest"));
        assert!(query.contains("Current metrics: unavailable"));
        assert!(query.ends_with("class VirtualMachine {}"));
    }

    #[tokio::test]
    async fn test_generate_strips_fence_and_records_turns() {
        let client = Arc::new(MockLlmClient::scripted(["```java\nclass B {}\n```"]));
        let generator = Generator::new(client.clone(), 512);
        let plan = plan();
        let request = GenerationRequest {
            plan: &plan,
            source: "class B { }",
            metrics: None,
            related: &[],
        };

        let mut conversation = Conversation::new();
        let candidate = generator.generate(&mut conversation, &request).await;

        assert_eq!(candidate, "class B {}");
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[1].role, Role::Assistant);
        assert_eq!(conversation.messages()[1].content, "```java\nclass B {}\n```");

        let requests = client.requests();
        assert_eq!(requests[0].system.as_deref(), Some(GENERATOR_PROMPT));
        assert_eq!(requests[0].max_tokens, Some(512));
    }

    #[tokio::test]
    async fn test_generate_sees_prior_feedback() {
        let client = Arc::new(MockLlmClient::scripted(["class B {}", "class C {}"]));
        let generator = Generator::new(client.clone(), 512);
        let plan = plan();
        let request = GenerationRequest {
            plan: &plan,
            source: "class B { }",
            metrics: None,
            related: &[],
        };

        let mut conversation = Conversation::new();
        generator.generate(&mut conversation, &request).await;
        conversation.push_feedback("fix the missing import");
        generator.generate(&mut conversation, &request).await;

        let requests = client.requests();
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].messages[2].content, "fix the missing import");
    }

    #[tokio::test]
    async fn test_generate_error_becomes_text() {
        let client = Arc::new(MockLlmClient::failing("timeout"));
        let generator = Generator::new(client, 512);
        let plan = plan();
        let request = GenerationRequest {
            plan: &plan,
            source: "",
            metrics: None,
            related: &[],
        };

        let mut conversation = Conversation::new();
        let candidate = generator.generate(&mut conversation, &request).await;
        assert!(candidate.starts_with("An error occurred:"));
        assert_eq!(conversation.len(), 1);
    }
}
