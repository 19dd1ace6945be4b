/*!
 * Scripted mock provider for exercising the fallback flow in tests.
 *
 * Outcomes are queued up front and consumed one per call, so a test can
 * script an exact failure sequence (say, a content filter followed by a
 * valid reply) and then assert on how many calls were made and whether
 * each call carried the page image.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::translation::prompts::TranslationPayload;

/// One scripted call outcome
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this raw reply text
    Reply(String),
    /// Fail with a transport-level error
    Transport(String),
    /// Fail with an API-envelope content filter
    ContentFiltered(String),
}

/// What the mock observed about one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenPayload {
    /// Whether the payload carried an image
    pub had_image: bool,
    /// Whether the prompt contained the strict schema reminder
    pub was_strict: bool,
    /// Full prompt text
    pub prompt: String,
}

/// Scripted provider for tests
#[derive(Debug, Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<MockOutcome>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<SeenPayload>>,
}

impl MockProvider {
    /// Provider with an empty script; every call fails as exhausted
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider preloaded with a call script
    pub fn scripted(outcomes: impl IntoIterator<Item = MockOutcome>) -> Arc<Self> {
        let provider = Self::new();
        provider.script.lock().extend(outcomes);
        Arc::new(provider)
    }

    /// Number of calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// What each call looked like, in order
    pub fn seen_payloads(&self) -> Vec<SeenPayload> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate(&self, payload: &TranslationPayload) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(SeenPayload {
            had_image: payload.image.is_some(),
            was_strict: payload
                .prompt
                .contains(crate::translation::prompts::SCHEMA_REMINDER),
            prompt: payload.prompt.clone(),
        });

        let outcome = self
            .script
            .lock()
            .pop_front()
            .ok_or_else(|| ProviderError::RequestFailed("mock script exhausted".to_string()))?;

        match outcome {
            MockOutcome::Reply(text) => Ok(text),
            MockOutcome::Transport(message) => Err(ProviderError::ConnectionError(message)),
            MockOutcome::ContentFiltered(message) => Err(ProviderError::ContentFiltered(message)),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
