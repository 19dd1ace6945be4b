/*!
 * Translation orchestration for comic pages.
 *
 * This module contains the core of the crate, split into several submodules:
 *
 * - `request`: Immutable per-page translation request
 * - `prompts`: Prompt and payload construction for both call modes
 * - `parser`: Response validation and OCR confusable repair
 * - `flow`: Multi-stage fallback state machine
 * - `cache`: Content-addressed per-page result cache
 * - `reorder`: Geometric reading-order sorting
 */

// Re-export main types for easier usage
pub use self::cache::{CacheKey, CacheStore};
pub use self::flow::{FailureKind, FallbackAttempt, FlowOutcome, TranslationFlow};
pub use self::parser::ResponseParser;
pub use self::prompts::{PromptBuilder, PromptMode, TranslationPayload};
pub use self::request::{HistoryEntry, TranslationRequest};
pub use self::reorder::reorder;

// Submodules
pub mod cache;
pub mod flow;
pub mod parser;
pub mod prompts;
pub mod reorder;
pub mod request;
