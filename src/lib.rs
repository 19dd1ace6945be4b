/*!
 * # Bubblefish
 *
 * A Rust library for translating comic pages with AI.
 *
 * ## Features
 *
 * - Multi-stage fallback translation flow (image context, text only,
 *   untranslated carry-over) that always terminates with a result
 * - Structured-output translation via the Gemini API
 * - Shared terminology dictionary with gender annotations and
 *   transactional merges
 * - Content-addressed per-page result cache doubling as the human
 *   proofreading surface
 * - Geometric reading-order sorting for vertical and horizontal layouts
 * - OCR confusable repair when matching dictionary terms
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `page`: Text fragments and per-page translation documents
 * - `terminology`: Shared terminology dictionary
 * - `translation`: Per-page orchestration:
 *   - `translation::flow`: Fallback state machine
 *   - `translation::prompts`: Prompt and payload construction
 *   - `translation::parser`: Response validation and confusable repair
 *   - `translation::cache`: Content-addressed result cache
 *   - `translation::reorder`: Reading-order sorting
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for translation APIs
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod language_utils;
pub mod page;
pub mod providers;
pub mod terminology;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{AppController, PageOutcome};
pub use page::{
    BoundingBox, BubbleType, FallbackStage, PageTranslation, TextDirection, TextFragment,
    TranslatedText,
};
pub use terminology::{Gender, MergeOutcome, TermConflict, TermEntry, TerminologyStore};
