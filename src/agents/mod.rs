//! Model-backed roles of the retry loop
//!
//! - Planner: per-method plan and the decision gate
//! - Generator: candidate rewrites, conditioned on a per-target conversation
//! - FeedbackAggregator: one correction signal per failed attempt
//! - AcceptanceJudge: improved / not improved for passing candidates

pub mod conversation;
pub mod feedback;
pub mod generator;
pub mod judge;
pub mod planner;
pub mod prompts;
pub mod verdict;

use std::sync::Arc;

pub use conversation::Conversation;
pub use feedback::FeedbackAggregator;
pub use generator::{GenerationRequest, Generator, strip_code_fence};
pub use judge::AcceptanceJudge;
pub use planner::Planner;
pub use verdict::parse_affirmative;

use crate::config::TokenLimits;
use crate::llm::LlmClient;

/// Every role, sharing one client
pub struct Agents {
    pub planner: Planner,
    pub generator: Generator,
    pub feedback: FeedbackAggregator,
    pub judge: AcceptanceJudge,
}

impl Agents {
    pub fn new(client: Arc<dyn LlmClient>, limits: &TokenLimits) -> Self {
        Self {
            planner: Planner::new(client.clone(), limits.planner),
            generator: Generator::new(client.clone(), limits.generator),
            feedback: FeedbackAggregator::new(client.clone(), limits.compiler, limits.test),
            judge: AcceptanceJudge::new(client, limits.planner),
        }
    }
}
