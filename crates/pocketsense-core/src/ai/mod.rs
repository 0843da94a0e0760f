//! Pluggable inference backend abstraction
//!
//! # Architecture
//!
//! - `InferenceBackend` trait: health probe plus one raw text-generation call
//! - `Backend` enum: concrete wrapper providing Clone + compile-time dispatch
//! - `InferenceClient`: a `Backend` plus the shared categorization cache
//!
//! Backends only move text. Deciding what the text means (a category, an
//! insight list) happens in `parsing`, and retry policy lives in the pipeline.
//!
//! # Configuration
//!
//! - `AI_BACKEND`: `ollama` (default) or `mock`
//! - `OLLAMA_HOST`: Ollama server URL (default: http://localhost:11434)
//! - `OLLAMA_MODEL`: model name (default: mistral)

mod cache;
mod mock;
mod ollama;
pub mod parsing;
pub mod types;

pub use cache::CategoryCache;
pub use mock::{MockBackend, MockReply, SAMPLE_INSIGHTS};
#[cfg(any(test, feature = "test-utils"))]
pub(crate) use mock::canned_reply;
pub use ollama::OllamaBackend;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{BackendKind, InferenceConfig};
use crate::models::Category;
use crate::prompts::PromptPair;

/// Failure of a single backend call
///
/// Closed set: the pipeline maps each variant to exactly one handling branch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// Transport failure (connection refused, reset, DNS, ...)
    #[error("backend unreachable: {0}")]
    Unavailable(String),

    #[error("backend call timed out")]
    Timeout,

    /// Backend answered with a non-success HTTP status
    #[error("backend returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// HTTP exchange succeeded but the envelope could not be read
    #[error("malformed backend response: {0}")]
    MalformedBody(String),
}

/// Trait defining the interface for all inference backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Probe liveness; never fails, any problem reads as `Unavailable`
    async fn health_check(&self) -> BackendHealth;

    /// Run one non-streaming completion and return the raw model text
    async fn generate(
        &self,
        prompt: &PromptPair,
        options: &GenerationOptions,
        timeout: Duration,
    ) -> Result<String, InferenceError>;

    /// Get the model name (for logging and /health)
    fn model(&self) -> &str;

    /// Get the host URL (for logging and /health)
    fn host(&self) -> &str;
}

/// Concrete backend enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum Backend {
    /// Ollama HTTP API
    Ollama(OllamaBackend),
    /// Scripted backend for tests and offline development
    Mock(MockBackend),
}

impl Backend {
    pub fn from_config(config: &InferenceConfig) -> Self {
        match config.backend {
            BackendKind::Ollama => Backend::Ollama(OllamaBackend::new(
                &config.host,
                &config.model,
                config.health_timeout,
            )),
            BackendKind::Mock => Backend::Mock(MockBackend::new()),
        }
    }

    /// Create an Ollama backend with the default health timeout
    pub fn ollama(host: &str, model: &str) -> Self {
        Backend::Ollama(OllamaBackend::new(host, model, Duration::from_secs(5)))
    }

    pub fn mock() -> Self {
        Backend::Mock(MockBackend::new())
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Ollama(_) => BackendKind::Ollama,
            Backend::Mock(_) => BackendKind::Mock,
        }
    }
}

// Implement InferenceBackend for Backend by delegating to the inner backend
#[async_trait]
impl InferenceBackend for Backend {
    async fn health_check(&self) -> BackendHealth {
        match self {
            Backend::Ollama(b) => b.health_check().await,
            Backend::Mock(b) => b.health_check().await,
        }
    }

    async fn generate(
        &self,
        prompt: &PromptPair,
        options: &GenerationOptions,
        timeout: Duration,
    ) -> Result<String, InferenceError> {
        match self {
            Backend::Ollama(b) => b.generate(prompt, options, timeout).await,
            Backend::Mock(b) => b.generate(prompt, options, timeout).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            Backend::Ollama(b) => b.model(),
            Backend::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            Backend::Ollama(b) => b.host(),
            Backend::Mock(b) => b.host(),
        }
    }
}

/// A backend plus the process-wide categorization cache
///
/// Clones share the same cache.
#[derive(Clone)]
pub struct InferenceClient {
    backend: Backend,
    categories: Arc<CategoryCache>,
}

impl InferenceClient {
    pub fn new(backend: Backend, cache_capacity: usize) -> Self {
        Self {
            backend,
            categories: Arc::new(CategoryCache::new(cache_capacity)),
        }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(
            Backend::from_config(config),
            config.categorize.cache_capacity,
        )
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn cache(&self) -> &CategoryCache {
        &self.categories
    }

    pub fn cached_category(&self, description: &str) -> Option<Category> {
        self.categories.get(description)
    }

    pub fn remember_category(&self, description: &str, category: Category) {
        self.categories.insert(description, category);
    }

    pub async fn health_check(&self) -> BackendHealth {
        self.backend.health_check().await
    }

    pub async fn generate(
        &self,
        prompt: &PromptPair,
        options: &GenerationOptions,
        timeout: Duration,
    ) -> Result<String, InferenceError> {
        self.backend.generate(prompt, options, timeout).await
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    pub fn host(&self) -> &str {
        self.backend.host()
    }
}
