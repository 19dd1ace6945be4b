/*!
 * Per-page translation request.
 *
 * A request bundles everything one translation attempt needs: the page's
 * fragments in reading order, the terminology subset that applies to them,
 * prior-page context, and optionally the page image. It is immutable once
 * built; the fallback flow reuses the same request across every attempt and
 * stage, so retries can never diverge from the original input.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::page::TextFragment;
use crate::terminology::TermEntry;

/// One previously translated line, carried as context into the next page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Source text
    pub original: String,
    /// Translated text
    pub translated: String,
}

impl HistoryEntry {
    /// Create a history entry
    pub fn new(original: impl Into<String>, translated: impl Into<String>) -> Self {
        Self { original: original.into(), translated: translated.into() }
    }
}

/// Immutable input for one page's translation, shared by all attempts
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    fragments: Vec<TextFragment>,
    terminology: BTreeMap<String, TermEntry>,
    history: Vec<HistoryEntry>,
    image: Option<Vec<u8>>,
}

impl TranslationRequest {
    /// Build a request from reading-ordered fragments
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self {
            fragments,
            terminology: BTreeMap::new(),
            history: Vec::new(),
            image: None,
        }
    }

    /// Attach the terminology subset relevant to this page
    pub fn with_terminology(mut self, terminology: BTreeMap<String, TermEntry>) -> Self {
        self.terminology = terminology;
        self
    }

    /// Attach prior-page translation history
    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }

    /// Attach the page image for the image-context stage
    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    /// Fragments in reading order; response ordinals must match these
    pub fn fragments(&self) -> &[TextFragment] {
        &self.fragments
    }

    /// Number of fragments, which every valid response must match
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Terminology entries applicable to this page
    pub fn terminology(&self) -> &BTreeMap<String, TermEntry> {
        &self.terminology
    }

    /// Prior-page context lines
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Page image bytes, if the caller provided one
    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }
}
