//! Insight pipeline: prompt -> backend -> validation, with retry
//!
//! Two operations:
//! - `categorize`: cache first, then one backend call with lenient parsing.
//!   No health check and no retry.
//! - `generate_insights`: up to `max_attempts` rounds of health check,
//!   generate, strict parse. A failed health check ends the run immediately;
//!   any other failure waits a fixed `retry_delay` and tries again.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::ai::parsing::{parse_insights, resolve_category, truncate};
use crate::ai::{BackendHealth, InferenceClient, InferenceError};
use crate::config::InferenceConfig;
use crate::error::{Error, Result};
use crate::models::{Category, FinancialSnapshot, Insight};
use crate::prompts::PromptLibrary;

/// Longest slice of raw model output echoed in warnings
const MAX_LOGGED_OUTPUT_CHARS: usize = 300;

/// Outcome of a successful insight run
#[derive(Debug, Clone, PartialEq)]
pub struct InsightRun {
    pub insights: Vec<Insight>,
    /// Attempt that produced the result (1-based)
    pub attempts: u32,
    /// Number of inter-attempt delays taken
    pub retries: u32,
}

/// Why one insight attempt did not produce a result
#[derive(Debug)]
enum AttemptFailure {
    Timeout,
    Connection(String),
    Rejected { status: u16, body: String },
    Invalid(String),
}

impl AttemptFailure {
    fn from_inference(err: InferenceError) -> Self {
        match err {
            InferenceError::Timeout => AttemptFailure::Timeout,
            InferenceError::Unavailable(message) => AttemptFailure::Connection(message),
            InferenceError::Rejected { status, body } => AttemptFailure::Rejected { status, body },
            InferenceError::MalformedBody(reason) => AttemptFailure::Invalid(reason),
        }
    }

    fn into_error(self, attempts: u32) -> Error {
        match self {
            AttemptFailure::Timeout => Error::TimeoutExceeded { attempts },
            AttemptFailure::Connection(message) => Error::ConnectionFailed { attempts, message },
            AttemptFailure::Rejected { status, body } => Error::BackendRejected {
                status,
                body,
                attempts,
            },
            AttemptFailure::Invalid(reason) => Error::InvalidInsightFormat { attempts, reason },
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Timeout => write!(f, "timed out"),
            AttemptFailure::Connection(message) => write!(f, "connection failed: {}", message),
            AttemptFailure::Rejected { status, .. } => write!(f, "backend returned HTTP {}", status),
            AttemptFailure::Invalid(reason) => write!(f, "invalid output: {}", reason),
        }
    }
}

/// Composition root: prompts, inference client and validator under one policy
#[derive(Clone)]
pub struct InsightPipeline {
    client: InferenceClient,
    prompts: Arc<PromptLibrary>,
    config: Arc<InferenceConfig>,
}

impl InsightPipeline {
    pub fn new(client: InferenceClient, prompts: PromptLibrary, config: InferenceConfig) -> Self {
        Self {
            client,
            prompts: Arc::new(prompts),
            config: Arc::new(config),
        }
    }

    /// Build backend, cache and prompt library from a loaded configuration
    pub fn from_config(config: InferenceConfig) -> Result<Self> {
        let prompts = PromptLibrary::load(config.effective_prompts_dir().as_deref())?;
        let client = InferenceClient::from_config(&config);
        info!(
            backend = %config.backend,
            host = %client.host(),
            model = %client.model(),
            "Inference pipeline ready"
        );
        Ok(Self::new(client, prompts, config))
    }

    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    pub async fn health(&self) -> BackendHealth {
        self.client.health_check().await
    }

    /// Categorize a single transaction description
    ///
    /// Content problems default to `Other`; only an unreachable, slow or
    /// rejecting backend is an error.
    pub async fn categorize(&self, description: &str) -> Result<Category> {
        if let Some(category) = self.client.cached_category(description) {
            debug!(%category, "Category cache hit");
            return Ok(category);
        }

        let settings = &self.config.categorize;
        let prompt = self.prompts.categorization(description);
        info!(description, "Categorizing transaction");

        match self
            .client
            .generate(&prompt, &settings.generation_options(), settings.timeout)
            .await
        {
            Ok(text) => {
                debug!(raw = %text, "Categorization output");
                let category = resolve_category(&text);
                self.client.remember_category(description, category);
                Ok(category)
            }
            Err(InferenceError::MalformedBody(reason)) => {
                warn!(%reason, "Unreadable categorization response, defaulting to Other");
                Ok(Category::Other)
            }
            Err(InferenceError::Timeout) => {
                error!(timeout = ?settings.timeout, "Categorization timed out");
                Err(Error::TimeoutExceeded { attempts: 1 })
            }
            Err(InferenceError::Unavailable(message)) => {
                error!(%message, "Categorization backend unreachable");
                Err(Error::ConnectionFailed {
                    attempts: 1,
                    message,
                })
            }
            Err(InferenceError::Rejected { status, body }) => {
                error!(status, %body, "Categorization rejected by backend");
                Err(Error::BackendRejected {
                    status,
                    body,
                    attempts: 1,
                })
            }
        }
    }

    /// Generate validated insights for a snapshot
    pub async fn generate_insights(&self, snapshot: &FinancialSnapshot) -> Result<Vec<Insight>> {
        self.generate_insights_detailed(snapshot)
            .await
            .map(|run| run.insights)
    }

    /// Like `generate_insights`, also reporting attempts and retries used
    pub async fn generate_insights_detailed(
        &self,
        snapshot: &FinancialSnapshot,
    ) -> Result<InsightRun> {
        let settings = &self.config.insights;
        let max_attempts = settings.max_attempts.max(1);
        let prompt = self.prompts.insights(snapshot, settings.transaction_window);
        let options = settings.generation_options();

        let mut attempt = 0;
        let mut retries = 0;
        loop {
            attempt += 1;

            if !self.client.health_check().await.is_ready() {
                error!(host = %self.client.host(), "Inference service is not available");
                return Err(Error::ServiceUnavailable);
            }

            info!(
                attempt,
                max_attempts,
                timeout = ?settings.timeout,
                "Generating insights"
            );

            let failure = match self
                .client
                .generate(&prompt, &options, settings.timeout)
                .await
            {
                Ok(text) => {
                    debug!(raw = %text, "Insight output");
                    match parse_insights(&text) {
                        Ok(insights) => {
                            info!(attempt, count = insights.len(), "Insights generated");
                            return Ok(InsightRun {
                                insights,
                                attempts: attempt,
                                retries,
                            });
                        }
                        Err(reason) => {
                            warn!(
                                raw = %truncate(&text, MAX_LOGGED_OUTPUT_CHARS),
                                "Model output rejected"
                            );
                            AttemptFailure::Invalid(reason.to_string())
                        }
                    }
                }
                Err(err) => AttemptFailure::from_inference(err),
            };

            if attempt >= max_attempts {
                let err = failure.into_error(attempt);
                error!(attempts = attempt, "Insight generation failed: {}", err);
                return Err(err);
            }

            warn!(
                attempt,
                max_attempts,
                delay = ?settings.retry_delay,
                "Insight attempt failed ({}), retrying",
                failure
            );
            retries += 1;
            tokio::time::sleep(settings.retry_delay).await;
        }
    }
}
