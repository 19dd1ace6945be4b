/*!
 * Page data model: detected text fragments and per-page translation documents.
 *
 * The types in this module form the boundary contract with the external
 * detector/OCR stage (input side) and the renderer (output side). The
 * `PageTranslation` document is serialized verbatim to disk by the cache
 * and is the surface a human proofreader edits, so its on-disk shape is a
 * versioned public contract: unknown fields are ignored on read and
 * optional fields fall back to defaults, allowing hand-edited files to be
 * re-read as authoritative input without re-invoking translation.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::terminology::TermEntry;

/// Current on-disk schema version for page translation documents
pub const PAGE_SCHEMA_VERSION: u32 = 1;

/// Default estimated font size in pixels, used for degraded results and
/// as the fallback when a hand-edited document drops the field
pub const DEFAULT_FONT_SIZE: u32 = 16;

/// Axis-aligned bounding box of a detected text region, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Box width
    pub width: u32,
    /// Box height
    pub height: u32,
}

impl BoundingBox {
    /// Create a bounding box from top-left corner and size
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Horizontal center of the box
    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }

    /// Vertical center of the box
    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.0
    }

    /// Right edge of the box
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Bottom edge of the box
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// Text layout direction inside a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    /// Left-to-right rows
    #[default]
    Horizontal,
    /// Top-to-bottom columns, read right-to-left
    Vertical,
}

/// Background classification of the speech bubble a fragment sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleType {
    /// Plain white background with clear edges
    #[default]
    PureWhite,
    /// Gradient, shadow or texture behind the text
    Textured,
    /// Transparent or semi-transparent bubble
    Transparent,
}

/// One detected text region on a page, as produced by the detector/OCR stage.
///
/// Consumed read-only by the translation flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Bounding geometry on the page
    pub bbox: BoundingBox,

    /// Extracted source text
    pub text: String,

    /// Inferred layout direction
    #[serde(default)]
    pub direction: TextDirection,

    /// Inferred bubble background type
    #[serde(default)]
    pub bubble_type: BubbleType,
}

impl TextFragment {
    /// Create a fragment with default direction and bubble hints
    pub fn new(bbox: BoundingBox, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
            direction: TextDirection::default(),
            bubble_type: BubbleType::default(),
        }
    }

    /// Set the layout direction hint
    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the bubble type hint
    pub fn with_bubble_type(mut self, bubble_type: BubbleType) -> Self {
        self.bubble_type = bubble_type;
        self
    }
}

/// One translated entry, parallel to a request fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedText {
    /// Source text, possibly OCR-corrected by the model
    pub original: String,

    /// Target-language text; equals `original` in a degraded result
    pub translated: String,

    /// Layout direction for rendering
    #[serde(default)]
    pub text_direction: TextDirection,

    /// Bubble background type for rendering
    #[serde(default)]
    pub bubble_type: BubbleType,

    /// Estimated source font size in pixels
    #[serde(default = "default_font_size")]
    pub estimated_font_size: u32,
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

impl TranslatedText {
    /// Build the degraded entry for a fragment: translated text equals the
    /// source text, rendering hints carried over from the fragment.
    pub fn untranslated(fragment: &TextFragment) -> Self {
        Self {
            original: fragment.text.clone(),
            translated: fragment.text.clone(),
            text_direction: fragment.direction,
            bubble_type: fragment.bubble_type,
            estimated_font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// The escalation stage that produced a page translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStage {
    /// Full multimodal call: page image plus text
    ImageContext,
    /// Text-only call, used after the image-bearing call was rejected
    TextOnly,
    /// Terminal synthesis: source text carried over untranslated
    OriginalText,
}

impl std::fmt::Display for FallbackStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ImageContext => "image_context",
            Self::TextOnly => "text_only",
            Self::OriginalText => "original_text",
        };
        write!(f, "{}", name)
    }
}

/// Complete translation result for one page.
///
/// Unit of cache persistence and the human proofreading surface. The entry
/// count always equals the fragment count of the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTranslation {
    /// On-disk schema version
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Which fallback stage produced this result
    pub stage: FallbackStage,

    /// False for degraded results that need human attention
    pub success: bool,

    /// Translated entries, in reading order, one per request fragment
    pub translated_texts: Vec<TranslatedText>,

    /// Terminology discovered on this page, to be merged into the dictionary
    #[serde(default)]
    pub new_terminology: BTreeMap<String, TermEntry>,
}

fn default_schema_version() -> u32 {
    PAGE_SCHEMA_VERSION
}

impl PageTranslation {
    /// Synthesize the terminal fallback result for a set of fragments.
    ///
    /// Never fails and never drops a fragment, guaranteeing the pipeline
    /// terminates with some result for every page.
    pub fn degraded(fragments: &[TextFragment]) -> Self {
        Self {
            schema_version: PAGE_SCHEMA_VERSION,
            stage: FallbackStage::OriginalText,
            success: false,
            translated_texts: fragments.iter().map(TranslatedText::untranslated).collect(),
            new_terminology: BTreeMap::new(),
        }
    }

    /// Whether this result came from the terminal fallback stage.
    /// Degraded results are always eligible for retranslation.
    pub fn is_degraded(&self) -> bool {
        self.stage == FallbackStage::OriginalText
    }
}
