//! Acceptance judgement for candidates that compiled and passed their tests.

use std::sync::Arc;

use super::prompts::JUDGE_PROMPT;
use super::verdict::parse_affirmative;
use crate::domain::AcceptanceVerdict;
use crate::llm::{LlmClient, Message, generate_text};
use crate::metrics::ClassMetrics;

/// Binary improved/not-improved judge.
///
/// Conservative: anything but an exact affirmative reply, including a
/// transport error, is `NotImproved`.
pub struct AcceptanceJudge {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl AcceptanceJudge {
    pub fn new(client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    pub async fn judge(
        &self,
        original: &str,
        candidate: &str,
        before: Option<&ClassMetrics>,
        after: Option<&ClassMetrics>,
    ) -> AcceptanceVerdict {
        let query = judge_query(original, candidate, before, after);
        let reply = generate_text(
            self.client.as_ref(),
            Some(JUDGE_PROMPT),
            vec![Message::user(query)],
            self.max_tokens,
        )
        .await;

        let verdict = AcceptanceVerdict::from_affirmative(parse_affirmative(&reply));
        log::debug!("Judge reply {:?} -> {:?}", reply, verdict);
        verdict
    }
}

fn judge_query(original: &str, candidate: &str, before: Option<&ClassMetrics>, after: Option<&ClassMetrics>) -> String {
    let show = |m: Option<&ClassMetrics>| m.map_or_else(|| "unavailable".to_string(), ToString::to_string);
    format!(
        "Code before the change:\n{}\n\nMetrics before: {}\n\nCode after the change:\n{}\n\nMetrics after: {}\n\n\
         Has the code improved? Answer True or False without explanation.",
        original,
        show(before),
        candidate,
        show(after)
    )
}
