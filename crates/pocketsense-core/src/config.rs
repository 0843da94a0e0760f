//! Inference configuration
//!
//! ## Configuration Resolution
//!
//! Layers are applied in order, later ones winning key by key:
//! 1. Embedded defaults (`config/inference.toml`, compiled into binary)
//! 2. Override file: an explicit path, or
//!    `~/.local/share/pocketsense/config/inference.toml` when it exists
//! 3. Environment: `OLLAMA_HOST`, `OLLAMA_MODEL`, `AI_BACKEND`,
//!    `POCKETSENSE_PROMPTS_DIR`
//!
//! The result is validated once and then shared read-only.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::ai::GenerationOptions;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/inference.toml");

/// Which inference backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Ollama,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "ollama",
            BackendKind::Mock => "mock",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(BackendKind::Ollama),
            "mock" => Ok(BackendKind::Mock),
            other => Err(Error::Config(format!(
                "Unknown backend '{}' (expected 'ollama' or 'mock')",
                other
            ))),
        }
    }
}

/// Settings for single-shot categorization calls
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizeConfig {
    pub timeout: Duration,
    pub temperature: f64,
    /// Maximum number of cached description -> category entries
    pub cache_capacity: usize,
}

impl Default for CategorizeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            temperature: 0.1,
            cache_capacity: 1000,
        }
    }
}

impl CategorizeConfig {
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: Some(self.temperature),
            ..Default::default()
        }
    }
}

/// Settings for the insight retry loop
#[derive(Debug, Clone, PartialEq)]
pub struct InsightConfig {
    /// Per-attempt timeout, not cumulative
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub num_predict: u32,
    pub stop: Vec<String>,
    /// Number of most recent transactions shown to the model
    pub transaction_window: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            temperature: 0.2,
            top_p: 0.5,
            top_k: 20,
            num_predict: 200,
            stop: vec!["]\n".to_string(), "```".to_string()],
            transaction_window: 10,
        }
    }
}

impl InsightConfig {
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            top_k: Some(self.top_k),
            num_predict: Some(self.num_predict),
            stop: if self.stop.is_empty() {
                None
            } else {
                Some(self.stop.clone())
            },
        }
    }
}

/// Effective configuration for the inference pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    pub backend: BackendKind,
    /// Base URL of the Ollama server
    pub host: String,
    pub model: String,
    pub health_timeout: Duration,
    pub categorize: CategorizeConfig,
    pub insights: InsightConfig,
    /// Prompt override directory (None = default data dir location)
    pub prompts_dir: Option<PathBuf>,
    /// Override file that was applied, if any
    pub source: Option<PathBuf>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Ollama,
            host: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
            health_timeout: Duration::from_secs(5),
            categorize: CategorizeConfig::default(),
            insights: InsightConfig::default(),
            prompts_dir: None,
            source: None,
        }
    }
}

impl InferenceConfig {
    /// Load all layers: embedded defaults, override file, environment
    ///
    /// An explicit `override_path` must exist; the default location is only
    /// used when present.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        config.apply_toml(DEFAULT_CONFIG)?;

        let file = match override_path {
            Some(path) if !path.exists() => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        if let Some(path) = file {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            config.apply_toml(&content)?;
            config.source = Some(path);
        }

        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply a TOML document on top of the current values
    pub fn apply_toml(&mut self, content: &str) -> Result<()> {
        let raw: RawConfig = toml::from_str(content)?;

        if let Some(backend) = raw.backend {
            if let Some(kind) = backend.kind {
                self.backend = kind.parse()?;
            }
            if let Some(host) = backend.host {
                self.host = host;
            }
            if let Some(model) = backend.model {
                self.model = model;
            }
            if let Some(secs) = backend.health_timeout_secs {
                self.health_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(categorize) = raw.categorize {
            if let Some(secs) = categorize.timeout_secs {
                self.categorize.timeout = Duration::from_secs(secs);
            }
            if let Some(temperature) = categorize.temperature {
                self.categorize.temperature = temperature;
            }
            if let Some(capacity) = categorize.cache_capacity {
                self.categorize.cache_capacity = capacity;
            }
        }

        if let Some(insights) = raw.insights {
            let target = &mut self.insights;
            if let Some(secs) = insights.timeout_secs {
                target.timeout = Duration::from_secs(secs);
            }
            if let Some(attempts) = insights.max_attempts {
                target.max_attempts = attempts;
            }
            if let Some(millis) = insights.retry_delay_millis {
                target.retry_delay = Duration::from_millis(millis);
            }
            if let Some(temperature) = insights.temperature {
                target.temperature = temperature;
            }
            if let Some(top_p) = insights.top_p {
                target.top_p = top_p;
            }
            if let Some(top_k) = insights.top_k {
                target.top_k = top_k;
            }
            if let Some(num_predict) = insights.num_predict {
                target.num_predict = num_predict;
            }
            if let Some(stop) = insights.stop {
                target.stop = stop;
            }
            if let Some(window) = insights.transaction_window {
                target.transaction_window = window;
            }
        }

        if let Some(dir) = raw.prompts.and_then(|p| p.dir) {
            self.prompts_dir = Some(dir);
        }

        Ok(())
    }

    /// Apply environment overrides from any key lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = non_empty("OLLAMA_HOST") {
            self.host = host;
        }
        if let Some(model) = non_empty("OLLAMA_MODEL") {
            self.model = model;
        }
        if let Some(kind) = non_empty("AI_BACKEND") {
            self.backend = kind.parse()?;
        }
        if let Some(dir) = non_empty("POCKETSENSE_PROMPTS_DIR") {
            self.prompts_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.insights.max_attempts < 1 {
            return Err(Error::Config("insights.max_attempts must be at least 1".into()));
        }
        if self.categorize.cache_capacity < 1 {
            return Err(Error::Config(
                "categorize.cache_capacity must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("categorize.temperature", self.categorize.temperature),
            ("insights.temperature", self.insights.temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be between 0 and 2, got {}",
                    name, value
                )));
            }
        }
        if self.insights.transaction_window < 1 {
            return Err(Error::Config(
                "insights.transaction_window must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("backend.health_timeout_secs", self.health_timeout),
            ("categorize.timeout_secs", self.categorize.timeout),
            ("insights.timeout_secs", self.insights.timeout),
        ] {
            if value.is_zero() {
                return Err(Error::Config(format!("{} must be greater than 0", name)));
            }
        }
        if self.host.trim().is_empty() {
            return Err(Error::Config("backend.host must not be empty".into()));
        }
        Ok(())
    }

    /// Prompt override directory: configured, else the default data dir location
    pub fn effective_prompts_dir(&self) -> Option<PathBuf> {
        self.prompts_dir
            .clone()
            .or_else(crate::prompts::default_prompts_dir)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pocketsense").join("config").join("inference.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    backend: Option<RawBackend>,
    categorize: Option<RawCategorize>,
    insights: Option<RawInsights>,
    prompts: Option<RawPrompts>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBackend {
    kind: Option<String>,
    host: Option<String>,
    model: Option<String>,
    health_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCategorize {
    timeout_secs: Option<u64>,
    temperature: Option<f64>,
    cache_capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInsights {
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    retry_delay_millis: Option<u64>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    top_k: Option<u32>,
    num_predict: Option<u32>,
    stop: Option<Vec<String>>,
    transaction_window: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPrompts {
    dir: Option<PathBuf>,
}
