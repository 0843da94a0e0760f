//! Mock backend for testing
//!
//! Replies come from a scripted queue; once the queue is empty the backend
//! falls back to a canned answer, so it also works for offline development
//! (`AI_BACKEND=mock`). Clones share state, which lets a test keep a handle
//! while the pipeline owns another.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::types::{BackendHealth, GenerationOptions};
use super::{InferenceBackend, InferenceError};
use crate::lexicon;
use crate::models::Category;
use crate::prompts::PromptPair;

/// Canned insight list returned when no reply is scripted
pub const SAMPLE_INSIGHTS: &str = r#"[
  {"type": "tip", "title": "Cook at home", "description": "Food is your largest expense category this month.", "action": "Plan three home-cooked dinners next week.", "confidence": 0.8},
  {"type": "achievement", "title": "Transportation on track", "description": "You stayed under your transportation budget.", "confidence": 0.7},
  {"type": "prediction", "title": "Utilities due", "description": "Your recurring internet bill is likely to post soon.", "confidence": 0.6}
]"#;

/// Number of recent prompts kept for inspection
pub const PROMPT_HISTORY: usize = 16;

/// A scripted reply for one `generate` call
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text as the model output
    Text(String),
    /// Fail the call with this error
    Fail(InferenceError),
    /// Sleep, then apply the inner reply (subject to the call's timeout)
    Delay(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }
}

#[derive(Default)]
struct MockState {
    unhealthy: AtomicBool,
    replies: Mutex<VecDeque<MockReply>>,
    health_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    /// Most recent prompts, oldest first, at most `PROMPT_HISTORY`
    prompts: Mutex<VecDeque<PromptPair>>,
}

/// Mock inference backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        let backend = Self::new();
        backend.set_healthy(false);
        backend
    }

    /// Create a healthy backend that answers with these replies in order
    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let backend = Self::new();
        for reply in replies {
            backend.push_reply(reply);
        }
        backend
    }

    pub fn push_reply(&self, reply: MockReply) {
        lock(&self.state.replies).push_back(reply);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push_reply(MockReply::Text(text.into()));
    }

    pub fn push_error(&self, error: InferenceError) {
        self.push_reply(MockReply::Fail(error));
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn health_calls(&self) -> usize {
        self.state.health_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.state.generate_calls.load(Ordering::SeqCst)
    }

    /// Prompt sent with the most recent `generate` call
    pub fn last_prompt(&self) -> Option<PromptPair> {
        lock(&self.state.prompts).back().cloned()
    }

    /// The last `PROMPT_HISTORY` prompts, oldest first
    pub fn prompts(&self) -> Vec<PromptPair> {
        lock(&self.state.prompts).iter().cloned().collect()
    }
}

/// Canned model output for a prompt when nothing is scripted
///
/// Insight prompts ask for JSON; everything else is treated as a
/// categorization and answered from the lexicon.
pub(crate) fn canned_reply(prompt: &PromptPair) -> String {
    if prompt.system.contains("JSON") {
        return SAMPLE_INSIGHTS.to_string();
    }
    let description = quoted(&prompt.user).unwrap_or(&prompt.user);
    lexicon::guess(description)
        .unwrap_or(Category::Other)
        .to_string()
}

/// Text between the first and last single quote, if any
fn quoted(text: &str) -> Option<&str> {
    let start = text.find('\'')?;
    let end = text.rfind('\'')?;
    (end > start).then(|| &text[start + 1..end])
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn play(reply: MockReply, timeout: Duration) -> Result<String, InferenceError> {
    let mut reply = reply;
    let mut waited = Duration::ZERO;
    loop {
        match reply {
            MockReply::Text(text) => return Ok(text),
            MockReply::Fail(error) => return Err(error),
            MockReply::Delay(delay, inner) => {
                waited += delay;
                if waited > timeout {
                    tokio::time::sleep(timeout.saturating_sub(waited - delay)).await;
                    return Err(InferenceError::Timeout);
                }
                tokio::time::sleep(delay).await;
                reply = *inner;
            }
        }
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn health_check(&self) -> BackendHealth {
        self.state.health_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.unhealthy.load(Ordering::SeqCst) {
            BackendHealth::Unavailable
        } else {
            BackendHealth::Ready
        }
    }

    async fn generate(
        &self,
        prompt: &PromptPair,
        _options: &GenerationOptions,
        timeout: Duration,
    ) -> Result<String, InferenceError> {
        self.state.generate_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut prompts = lock(&self.state.prompts);
            if prompts.len() == PROMPT_HISTORY {
                prompts.pop_front();
            }
            prompts.push_back(prompt.clone());
        }

        let scripted = lock(&self.state.replies).pop_front();
        match scripted {
            Some(reply) => play(reply, timeout).await,
            None => Ok(canned_reply(prompt)),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
