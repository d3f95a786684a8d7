//! Planning and the go/no-go decision gate.

use std::sync::Arc;

use super::generator::strip_code_fence;
use super::prompts::{DECISION_PROMPT, PLANNER_PROMPT};
use super::verdict::parse_affirmative;
use crate::domain::Plan;
use crate::llm::{LlmClient, Message, generate_text, try_generate_text};
use crate::metrics::ClassMetrics;

pub struct Planner {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl Planner {
    pub fn new(client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    /// Ask the model for a per-method plan.
    ///
    /// Never fails: a transport error or an unreadable reply gives an empty
    /// plan, which reads as no change for every unit.
    pub async fn plan(&self, source: &str, related: &[String], metrics: Option<&ClassMetrics>) -> Plan {
        let query = plan_query(source, related, metrics);
        match try_generate_text(
            self.client.as_ref(),
            Some(PLANNER_PROMPT),
            vec![Message::user(query)],
            self.max_tokens,
        )
        .await
        {
            Ok(reply) => {
                let plan = Plan::parse(&strip_code_fence(&reply));
                if plan.is_empty() {
                    log::warn!("Planner reply had no recognisable units");
                }
                plan
            }
            Err(e) => {
                log::warn!("Planner call failed, treating plan as no change: {}", e);
                Plan::empty(String::new())
            }
        }
    }

    /// Decision gate: does at least one unit need improvement?
    ///
    /// A plan with no `Improve` unit answers no without asking the model.
    /// Otherwise only an exact affirmative reply counts as yes.
    pub async fn needs_improvement(&self, plan: &Plan) -> bool {
        if !plan.needs_improvement() {
            log::debug!("Plan has no improvements, skipping decision call");
            return false;
        }

        let query = format!(
            "Answer True or False.\n\nGiven these per-method instructions, does at least one method need improvement?\n\n{}",
            if plan.raw.trim().is_empty() {
                plan.render()
            } else {
                plan.raw.clone()
            }
        );
        let reply = generate_text(
            self.client.as_ref(),
            Some(DECISION_PROMPT),
            vec![Message::user(query)],
            self.max_tokens,
        )
        .await;
        let decision = parse_affirmative(&reply);
        log::debug!("Decision gate reply {:?} -> {}", reply, decision);
        decision
    }
}

fn plan_query(source: &str, related: &[String], metrics: Option<&ClassMetrics>) -> String {
    let metrics = metrics.map_or_else(|| "unavailable".to_string(), ToString::to_string);
    let related = if related.is_empty() {
        "none".to_string()
    } else {
        related.join(", ")
    };
    format!(
        "Assess every method of this class:\n{}\n\nClass metrics: {}\nRelated classes: {}\n\n\
         Reply in this format, without explanations:\n{{\n    method1: (yes, improvement instruction),\n    method2: No\n}}",
        source, metrics, related
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanUnit;
    use crate::llm::MockLlmClient;

    fn planner(client: &Arc<MockLlmClient>) -> Planner {
        Planner::new(client.clone(), 4096)
    }

    #[tokio::test]
    async fn test_plan_parses_reply() {
        let client = Arc::new(MockLlmClient::scripted(["```\nstart: (yes, split it)\nstop: No\n```"]));
        let plan = planner(&client).plan("class A {}", &[], None).await;

        assert_eq!(
            plan.units,
            vec![PlanUnit::improve("start", "split it"), PlanUnit::no_change("stop")]
        );
        let request = &client.requests()[0];
        assert_eq!(request.system.as_deref(), Some(PLANNER_PROMPT));
        assert_eq!(request.max_tokens, Some(4096));
        assert!(request.messages[0].content.contains("class A {}"));
    }

    #[tokio::test]
    async fn test_single_line_reply_reaches_gate() {
        let client = Arc::new(MockLlmClient::scripted(["{start: (yes, split it), getName: No}", "true"]));
        let planner = planner(&client);
        let plan = planner.plan("class A {}", &[], None).await;

        assert_eq!(plan.units.len(), 2);
        assert!(planner.needs_improvement(&plan).await);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_plan_transport_error_is_empty() {
        let client = Arc::new(MockLlmClient::failing("down"));
        let plan = planner(&client).plan("class A {}", &[], None).await;
        assert!(plan.is_empty());
        assert!(!plan.needs_improvement());
    }

    #[tokio::test]
    async fn test_gate_skips_model_for_no_change_plan() {
        let client = Arc::new(MockLlmClient::scripted(["true"]));
        let plan = Plan {
            units: vec![PlanUnit::no_change("stop")],
            raw: "stop: No".to_string(),
        };
        assert!(!planner(&client).needs_improvement(&plan).await);
        assert!(!planner(&client).needs_improvement(&Plan::empty("")).await);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_gate_uses_strict_grammar() {
        let plan = Plan::parse("start: (yes, split it)");

        let client = Arc::new(MockLlmClient::scripted(["TRUE"]));
        assert!(planner(&client).needs_improvement(&plan).await);
        assert_eq!(client.requests()[0].system.as_deref(), Some(DECISION_PROMPT));

        let client = Arc::new(MockLlmClient::scripted(["Yes please"]));
        assert!(!planner(&client).needs_improvement(&plan).await);

        let client = Arc::new(MockLlmClient::failing("down"));
        assert!(!planner(&client).needs_improvement(&plan).await);
    }

    #[test]
    fn test_plan_query_includes_context() {
        let related = vec!["Runner".to_string()];
        let query = plan_query("class A {}", &related, Some(&ClassMetrics::default()));
        assert!(query.contains("Related classes: Runner"));
        assert!(query.contains("WMC=0"));
    }
}
