/*!
 * Provider implementations for the translation API boundary.
 *
 * This module contains the client implementations the fallback flow can
 * drive:
 * - Gemini: Google Generative Language API with structured output
 * - Mock: scripted provider for exercising the flow in tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::translation::prompts::TranslationPayload;

/// Common trait for all translation providers.
///
/// Implementations take a fully built payload and return the raw reply text;
/// classifying that text is the parser's job, so a provider returns `Ok`
/// even for an empty body. Only transport and API-envelope failures surface
/// as `ProviderError`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send one payload and return the raw reply text
    async fn generate(&self, payload: &TranslationPayload) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

pub mod gemini;
pub mod mock;

pub use gemini::Gemini;
pub use mock::{MockOutcome, MockProvider};
