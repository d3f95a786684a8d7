//! The bounded-retry improve/validate/commit loop.
//!
//! One target at a time: plan, decide, then up to `max_attempts` cycles of
//! generate, validate and either summarise failures or ask the judge. The
//! workspace artifact is restored to the captured source when the target
//! ends, whichever way it ends.

use std::fmt;
use std::path::Path;

use crate::agents::{Agents, Conversation, GenerationRequest};
use crate::config::{Config, RollbackPolicy};
use crate::domain::{AcceptanceVerdict, Attempt, Candidate, Plan, Target, TargetResult, ValidationOutcome};
use crate::error::Result;
use crate::metrics::{ClassMetrics, MetricsExtractor};
use crate::scope::DependencyScope;
use crate::select::CandidateSelector;
use crate::storage::ResultStore;
use crate::validation::CandidateValidator;
use crate::vcs::{self, Committer};
use crate::workspace::Workspace;

/// Where the loop is for the current target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Selecting,
    Planning,
    Deciding,
    Skip,
    Attempting,
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopPhase::Selecting => "selecting",
            LoopPhase::Planning => "planning",
            LoopPhase::Deciding => "deciding",
            LoopPhase::Skip => "skip",
            LoopPhase::Attempting => "attempting",
        };
        write!(f, "{}", name)
    }
}

/// What happens after one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Commit the candidate and stop
    Accept,
    /// Try again, restoring the original first when `rollback` is set
    Retry { rollback: bool },
}

/// Decide the next step from an attempt's validation and, for passing
/// candidates, the judge's verdict.
pub fn next_transition(
    outcome: &ValidationOutcome,
    verdict: Option<AcceptanceVerdict>,
    policy: RollbackPolicy,
) -> Transition {
    let rollback_others = policy == RollbackPolicy::EveryFailure;
    match (outcome, verdict) {
        (ValidationOutcome::CompileFailure { .. }, _) => Transition::Retry { rollback: true },
        (ValidationOutcome::Passed, Some(AcceptanceVerdict::Improved)) => Transition::Accept,
        (ValidationOutcome::Passed, _) | (ValidationOutcome::TestFailures { .. }, _) => Transition::Retry {
            rollback: rollback_others,
        },
    }
}

#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub max_attempts: u32,
    pub rollback_policy: RollbackPolicy,
    /// Commit message template; `{path}` becomes the artifact's relative path
    pub commit_message: String,
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry.max_attempts,
            rollback_policy: config.retry.rollback_policy,
            commit_message: config.git.commit_message.clone(),
        }
    }
}

/// How one target ended
#[derive(Debug, Clone)]
pub enum TargetOutcome {
    /// The decision gate said nothing needs improving
    Skipped,
    Finished {
        result: TargetResult,
        attempts: Vec<Attempt>,
    },
}

/// Totals for one run over a project
#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<TargetResult>,
    pub skipped: Vec<String>,
    /// Targets abandoned because of an error, with the error text
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn improved(&self) -> usize {
        self.results.iter().filter(|r| r.improved).count()
    }

    pub fn total(&self) -> usize {
        self.results.len() + self.skipped.len() + self.failed.len()
    }
}

pub struct RetryLoop {
    agents: Agents,
    validator: CandidateValidator,
    scope: Box<dyn DependencyScope>,
    metrics: Box<dyn MetricsExtractor>,
    committer: Box<dyn Committer>,
    store: ResultStore,
    settings: LoopSettings,
}

impl RetryLoop {
    pub fn new(
        agents: Agents,
        validator: CandidateValidator,
        scope: Box<dyn DependencyScope>,
        metrics: Box<dyn MetricsExtractor>,
        committer: Box<dyn Committer>,
        store: ResultStore,
        settings: LoopSettings,
    ) -> Self {
        Self {
            agents,
            validator,
            scope,
            metrics,
            committer,
            store,
            settings,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        self.validator.workspace()
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Select candidates from `project_dir` and process each one in order.
    ///
    /// A failing target is logged and recorded; the run carries on with the
    /// next one.
    pub async fn run(&self, selector: &CandidateSelector, project_dir: &Path) -> Result<RunSummary> {
        log::info!("Phase: {}", LoopPhase::Selecting);
        let candidates = selector.select(project_dir)?;
        Ok(self.run_candidates(&candidates).await)
    }

    pub async fn run_candidates(&self, candidates: &[Candidate]) -> RunSummary {
        let mut summary = RunSummary::default();

        for (i, candidate) in candidates.iter().enumerate() {
            log::info!("Target {}/{}: {}", i + 1, candidates.len(), candidate.name);
            match self.run_target(candidate).await {
                Ok(TargetOutcome::Skipped) => summary.skipped.push(candidate.name.clone()),
                Ok(TargetOutcome::Finished { result, .. }) => summary.results.push(result),
                Err(e) => {
                    log::error!("{}: target abandoned: {}", candidate.name, e);
                    summary.failed.push((candidate.name.clone(), e.to_string()));
                }
            }
        }

        log::info!(
            "Run finished: {} improved, {} finished, {} skipped, {} failed",
            summary.improved(),
            summary.results.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        summary
    }

    /// Process one candidate from source capture to result files.
    pub async fn run_target(&self, candidate: &Candidate) -> Result<TargetOutcome> {
        let source = self.workspace().read(&candidate.relative_path)?;
        let target = Target::new(candidate, source);

        let outcome = self.process(&target).await;
        let restored = self.workspace().restore(&target);
        let outcome = outcome?;
        restored?;

        if let TargetOutcome::Finished { result, attempts } = &outcome {
            let candidate_source = attempts
                .last()
                .map_or(target.original_source(), |a| a.candidate_source.as_str());
            self.store.save(&target, candidate_source, result)?;
        }
        Ok(outcome)
    }

    /// Build a plan for `target` without attempting anything
    pub async fn plan(&self, target: &Target) -> Result<(Plan, Vec<String>, Option<ClassMetrics>)> {
        let related = self.scope.related_identifiers(target)?;
        let before = self.measure(target.name(), target.original_source());
        let plan = self
            .agents
            .planner
            .plan(target.original_source(), &related, before.as_ref())
            .await;
        Ok((plan, related, before))
    }

    async fn process(&self, target: &Target) -> Result<TargetOutcome> {
        enter(target, LoopPhase::Planning);
        let (plan, related, before) = self.plan(target).await?;

        enter(target, LoopPhase::Deciding);
        if !self.agents.planner.needs_improvement(&plan).await {
            enter(target, LoopPhase::Skip);
            return Ok(TargetOutcome::Skipped);
        }

        enter(target, LoopPhase::Attempting);
        let mut result = TargetResult::new(target, &plan, before.clone());
        let mut conversation = Conversation::new();
        let mut attempts = Vec::new();
        let request = GenerationRequest {
            plan: &plan,
            source: target.original_source(),
            metrics: before.as_ref(),
            related: &related,
        };

        for index in 0..self.settings.max_attempts {
            let candidate = self.agents.generator.generate(&mut conversation, &request).await;
            let validation = self.validator.validate(target, &related, &candidate).await?;
            let mut attempt = Attempt::new(index, candidate, validation);
            result.record_attempt(&attempt);

            let verdict = if attempt.validation.is_passed() {
                let after = self.measure(target.name(), &attempt.candidate_source);
                let verdict = self
                    .agents
                    .judge
                    .judge(
                        target.original_source(),
                        &attempt.candidate_source,
                        before.as_ref(),
                        after.as_ref(),
                    )
                    .await;
                result.record_verdict(verdict, after);
                Some(verdict)
            } else {
                attempt.feedback = self
                    .agents
                    .feedback
                    .summarize(&attempt.validation, target.original_source(), &attempt.candidate_source)
                    .await;
                if let Some(feedback) = &attempt.feedback {
                    conversation.push_feedback(feedback.clone());
                }
                None
            };

            let transition = next_transition(&attempt.validation, verdict, self.settings.rollback_policy);
            log::info!(
                "{}: attempt {}/{} {} -> {:?}",
                target.name(),
                index + 1,
                self.settings.max_attempts,
                attempt.validation.label(),
                transition
            );
            attempts.push(attempt);

            match transition {
                Transition::Accept => {
                    let message = vcs::commit_message(&self.settings.commit_message, target.relative_path());
                    self.committer
                        .commit(self.workspace().root(), target.relative_path(), &message);
                    break;
                }
                Transition::Retry { rollback: true } => self.workspace().restore(target)?,
                Transition::Retry { rollback: false } => {}
            }
        }

        if !result.improved {
            log::info!(
                "{}: not improved after {} attempt(s)",
                target.name(),
                result.attempts_used
            );
        }
        result.finish();
        Ok(TargetOutcome::Finished { result, attempts })
    }

    fn measure(&self, name: &str, source: &str) -> Option<ClassMetrics> {
        match self.metrics.extract(source) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                log::warn!("{}: metrics unavailable: {}", name, e);
                None
            }
        }
    }
}

fn enter(target: &Target, phase: LoopPhase) {
    log::info!("{}: phase {}", target.name(), phase);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TestFailure;

    fn compile_failure() -> ValidationOutcome {
        ValidationOutcome::CompileFailure {
            log: "error".to_string(),
        }
    }

    fn test_failures() -> ValidationOutcome {
        ValidationOutcome::TestFailures {
            failures: vec![TestFailure::new("FooTest", "boom")],
        }
    }

    #[test]
    fn test_compile_failure_always_rolls_back() {
        for policy in [RollbackPolicy::CompileFailuresOnly, RollbackPolicy::EveryFailure] {
            assert_eq!(
                next_transition(&compile_failure(), None, policy),
                Transition::Retry { rollback: true }
            );
        }
    }

    #[test]
    fn test_default_policy_keeps_test_failures_and_rejections() {
        let policy = RollbackPolicy::CompileFailuresOnly;
        assert_eq!(
            next_transition(&test_failures(), None, policy),
            Transition::Retry { rollback: false }
        );
        assert_eq!(
            next_transition(&ValidationOutcome::Passed, Some(AcceptanceVerdict::NotImproved), policy),
            Transition::Retry { rollback: false }
        );
    }

    #[test]
    fn test_every_failure_policy_rolls_back_everything() {
        let policy = RollbackPolicy::EveryFailure;
        assert_eq!(
            next_transition(&test_failures(), None, policy),
            Transition::Retry { rollback: true }
        );
        assert_eq!(
            next_transition(&ValidationOutcome::Passed, Some(AcceptanceVerdict::NotImproved), policy),
            Transition::Retry { rollback: true }
        );
    }

    #[test]
    fn test_improved_is_accepted() {
        assert_eq!(
            next_transition(
                &ValidationOutcome::Passed,
                Some(AcceptanceVerdict::Improved),
                RollbackPolicy::default()
            ),
            Transition::Accept
        );
    }

    #[test]
    fn test_verdict_ignored_without_passing_validation() {
        assert_eq!(
            next_transition(&test_failures(), Some(AcceptanceVerdict::Improved), RollbackPolicy::default()),
            Transition::Retry { rollback: false }
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(LoopPhase::Attempting.to_string(), "attempting");
        assert_eq!(LoopPhase::Skip.to_string(), "skip");
    }

    #[test]
    fn test_settings_from_config() {
        let settings = LoopSettings::from_config(&Config::default());
        assert_eq!(settings.max_attempts, 20);
        assert_eq!(settings.rollback_policy, RollbackPolicy::CompileFailuresOnly);
        assert_eq!(settings.commit_message, "Refactor {path}");
    }
}
