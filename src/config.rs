use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub build: BuildConfig,
    pub selection: SelectionConfig,
    pub retry: RetryConfig,
    pub scope: ScopeConfig,
    pub paths: PathsConfig,
    pub git: GitConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Groq,
}

impl Provider {
    /// Environment variable holding the API key when `api_key_env` is unset
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com/v1/messages",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Groq => "https://api.groq.com/openai/v1",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
    pub max_tokens: TokenLimits,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Anthropic,
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: None,
            api_key_env: None,
            timeout_ms: 300000,
            max_tokens: TokenLimits::default(),
        }
    }
}

impl LlmConfig {
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_key_env())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Per-agent response token limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenLimits {
    pub default: u32,
    pub generator: u32,
    pub planner: u32,
    pub compiler: u32,
    pub test: u32,
}

impl Default for TokenLimits {
    fn default() -> Self {
        Self {
            default: 8192,
            generator: 8192,
            planner: 4096,
            compiler: 4096,
            test: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub compile_command: String,
    /// `{test}` is replaced with the test identifier
    pub test_command: String,
    /// `{test}` and `{method}` are replaced
    pub test_method_command: String,
    pub timeout_ms: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compile_command: "mvn -q compile".to_string(),
            test_command: "mvn -q test -Dtest={test}".to_string(),
            test_method_command: "mvn -q test -Dtest={test}#{method}".to_string(),
            timeout_ms: 600000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Every non-test source file
    All,
    /// Top-N classes from the ranking oracle
    Ranked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorTool {
    Heuristic,
    Pmd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub mode: SelectionMode,
    pub detector: DetectorTool,
    pub pmd_path: Option<PathBuf>,
    pub top_n: usize,
    pub extension: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::All,
            detector: DetectorTool::Heuristic,
            pmd_path: None,
            top_n: 5,
            extension: "java".to_string(),
        }
    }
}

/// What happens to the on-disk candidate when an attempt does not end in `Improved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Restore only after compile failures; test failures and rejected
    /// candidates stay on disk until the next attempt overwrites them.
    #[default]
    CompileFailuresOnly,
    /// Restore after every non-accepted attempt.
    EveryFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub rollback_policy: RollbackPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            rollback_policy: RollbackPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Related identifier that looks like a test but must never be run
    pub sentinel: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            sentinel: "TestCase".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub projects_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from("projects"),
            workspace_dir: PathBuf::from("workspace"),
            results_dir: PathBuf::from("results"),
        }
    }
}

impl PathsConfig {
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.projects_dir.join(project)
    }

    pub fn workspace(&self, project: &str) -> PathBuf {
        self.workspace_dir.join(project)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub enabled: bool,
    pub push: bool,
    /// `{path}` is replaced with the committed file's relative path
    pub commit_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            push: false,
            commit_message: "Refactor {path}".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            build: BuildConfig::default(),
            selection: SelectionConfig::default(),
            retry: RetryConfig::default(),
            scope: ScopeConfig::default(),
            paths: PathsConfig::default(),
            git: GitConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject values the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if self.selection.top_n == 0 {
            bail!("selection.top_n must be at least 1");
        }
        if self.selection.extension.trim().is_empty() {
            bail!("selection.extension must not be empty");
        }
        Ok(())
    }
}
