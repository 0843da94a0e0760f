//! PocketSense Core Library
//!
//! LLM-backed analysis for the PocketSense finance tracker:
//! - Category lexicon (closed label set and keyword fragments)
//! - Prompt library with embedded defaults and file overrides
//! - Pluggable inference backends (Ollama, mock) with a categorization cache
//! - Strict validation of model output into typed insights
//! - Insight pipeline with health-checked, fixed-delay retry
//! - Layered configuration (embedded TOML, override file, environment)

pub mod ai;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod models;
pub mod pipeline;
pub mod prompts;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    Backend, BackendHealth, CategoryCache, GenerationOptions, InferenceBackend, InferenceClient,
    InferenceError, MockBackend, MockReply, OllamaBackend,
};
pub use config::{BackendKind, CategorizeConfig, InferenceConfig, InsightConfig};
pub use error::{Error, Result};
pub use models::{
    BudgetPeriod, BudgetSummary, Category, FinancialSnapshot, Insight, InsightKind,
    TransactionKind, TransactionSummary,
};
pub use pipeline::{InsightPipeline, InsightRun};
pub use prompts::{
    build_categorization_prompt, build_insight_prompt, Prompt, PromptId, PromptInfo,
    PromptLibrary, PromptPair,
};
