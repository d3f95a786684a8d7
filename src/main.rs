use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use refagent::agents::Agents;
use refagent::config::{Config, SelectionMode};
use refagent::domain::Target;
use refagent::llm;
use refagent::metrics::HeuristicMetrics;
use refagent::runner::{LoopSettings, RetryLoop, RunSummary};
use refagent::scope::SourceScanScope;
use refagent::select::{CandidateSelector, ranker_for};
use refagent::storage::ResultStore;
use refagent::validation::{CandidateValidator, CommandBuildTool};
use refagent::vcs;
use refagent::workspace::Workspace;

fn setup_logging(default_level: &str) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("refagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("refagent.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Wire the production collaborators for one project
fn build_loop(config: &Config, project: &str) -> Result<RetryLoop> {
    let client = llm::client_from_config(&config.llm).context("Failed to create LLM client")?;
    let agents = Agents::new(client, &config.llm.max_tokens);

    let workspace = Workspace::prepare(&config.paths.project_dir(project), config.paths.workspace(project))?;
    let scope = SourceScanScope::new(workspace.root(), config.selection.extension.clone());
    let build = Arc::new(CommandBuildTool::new(config.build.clone()));
    let validator = CandidateValidator::new(build, workspace, config.scope.sentinel.clone());

    Ok(RetryLoop::new(
        agents,
        validator,
        Box::new(scope),
        Box::new(HeuristicMetrics),
        vcs::committer_for(&config.git),
        ResultStore::new(config.paths.results_dir.clone(), project),
        LoopSettings::from_config(config),
    ))
}

async fn handle_run_command(
    project: &str,
    max_attempts: Option<u32>,
    ranked: bool,
    top: Option<usize>,
    config: &Config,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(n) = max_attempts {
        config.retry.max_attempts = n;
    }
    if ranked {
        config.selection.mode = SelectionMode::Ranked;
    }
    if let Some(n) = top {
        config.selection.top_n = n;
    }
    config.validate()?;

    info!("Running on project {}", project);
    println!("{} {}", "Refactoring project:".cyan(), project);

    let retry_loop = build_loop(&config, project)?;
    let selector = CandidateSelector::from_config(&config.selection);
    let summary = retry_loop
        .run(&selector, &config.paths.project_dir(project))
        .await
        .context("Run failed")?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for result in &summary.results {
        let status = if result.improved {
            "improved".green()
        } else if result.tests_passed {
            "not improved".yellow()
        } else if result.compiled {
            "tests failing".red()
        } else {
            "not compiling".red()
        };
        println!(
            "  {:<32} {:<14} attempts={}",
            result.target, status, result.attempts_used
        );
    }
    for name in &summary.skipped {
        println!("  {:<32} {}", name, "skipped".dimmed());
    }
    for (name, error) in &summary.failed {
        println!("  {:<32} {} {}", name, "error".red().bold(), error);
    }
    println!(
        "{} {} improved, {} skipped, {} failed of {}",
        "Summary:".green().bold(),
        summary.improved(),
        summary.skipped.len(),
        summary.failed.len(),
        summary.total()
    );
}

fn handle_detect_command(project: &str, top: Option<usize>, config: &Config) -> Result<()> {
    let project_dir = config.paths.project_dir(project);
    if !project_dir.is_dir() {
        bail!("Project directory not found: {}", project_dir.display());
    }

    let ranker = ranker_for(&config.selection);
    let top_n = top.unwrap_or(config.selection.top_n);
    info!("Detecting god classes in {} with {}", project, ranker.name());

    let ranked = ranker.rank(&project_dir, top_n)?;
    println!("{} {} ({})", "God class candidates:".cyan(), project, ranker.name());
    for (i, class) in ranked.iter().enumerate() {
        println!(
            "  {:>2}. {:<32} score={:<6} {}",
            i + 1,
            class.name.bold(),
            class.score,
            class.relative_path.display()
        );
    }
    Ok(())
}

async fn handle_plan_command(project: &str, class: &str, config: &Config) -> Result<()> {
    let retry_loop = build_loop(config, project)?;

    let mut selection = config.selection.clone();
    selection.mode = SelectionMode::All;
    let candidates = CandidateSelector::from_config(&selection).select(&config.paths.project_dir(project))?;
    let Some(candidate) = candidates.into_iter().find(|c| c.name == class) else {
        bail!("Class {} not found in project {}", class, project);
    };

    let source = retry_loop.workspace().read(&candidate.relative_path)?;
    let target = Target::new(&candidate, source);
    let (plan, related, metrics) = retry_loop.plan(&target).await?;

    println!("{} {}", "Plan for".cyan(), target.name().bold());
    if let Some(metrics) = metrics {
        println!("  {} {}", "metrics:".dimmed(), metrics);
    }
    println!("  {} {}", "related:".dimmed(), related.join(", "));
    if plan.needs_improvement() {
        println!("{}", plan.render());
    } else {
        println!("  {}", "no changes suggested".yellow());
    }
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run {
            project,
            max_attempts,
            ranked,
            top,
        } => handle_run_command(project, *max_attempts, *ranked, *top, config).await,
        Commands::Detect { project, top } => handle_detect_command(project, *top, config),
        Commands::Plan { project, class } => handle_plan_command(project, class, config).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let level = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    setup_logging(level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
