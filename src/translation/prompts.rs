/*!
 * Prompt and payload construction for the translation API.
 *
 * Two modes mirror the fallback stages that call the API: `ImageContext`
 * sends the page image alongside the fragments so the model can use visual
 * cues (character appearance, bubble backgrounds, actual glyphs) for OCR
 * correction and pronoun disambiguation; `TextOnly` drops the image and
 * instructs the model to infer layout from text alone. Both inject the
 * terminology subset, reading-order fragment list, prior-page history and
 * an explicit response schema; a strict variant appends a schema reminder
 * for in-state re-prompts after a malformed response.
 */

use anyhow::Result;
use serde_json::{Value, json};

use crate::language_utils::get_language_name;
use crate::translation::request::TranslationRequest;

/// Most recent history entries included in a prompt
const HISTORY_LIMIT: usize = 10;

/// Marker line prefixing the strict re-prompt reminder
pub(crate) const SCHEMA_REMINDER: &str = "SCHEMA REMINDER:";

/// Which call variant a payload is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Page image included; model performs OCR correction and visual analysis
    ImageContext,
    /// Text only; layout and bubble hints inferred from the text
    TextOnly,
}

/// The instruction payload consumed by a translation provider
#[derive(Debug, Clone)]
pub struct TranslationPayload {
    /// Full prompt text
    pub prompt: String,
    /// Page image bytes, present only in `ImageContext` mode
    pub image: Option<Vec<u8>>,
    /// JSON schema the structured response must conform to
    pub response_schema: Value,
}

/// Assembles translation payloads for a fixed language pair
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    source_name: String,
    target_name: String,
}

impl PromptBuilder {
    /// Create a builder for a language pair given as ISO codes
    pub fn new(source_language: &str, target_language: &str) -> Result<Self> {
        Ok(Self {
            source_name: get_language_name(source_language)?,
            target_name: get_language_name(target_language)?,
        })
    }

    /// Build the payload for one attempt
    pub fn build(&self, request: &TranslationRequest, mode: PromptMode) -> TranslationPayload {
        self.build_inner(request, mode, false)
    }

    /// Build the payload for a strict re-prompt after a malformed response
    pub fn build_strict(&self, request: &TranslationRequest, mode: PromptMode) -> TranslationPayload {
        self.build_inner(request, mode, true)
    }

    fn build_inner(&self, request: &TranslationRequest, mode: PromptMode, strict: bool) -> TranslationPayload {
        let mut prompt = String::new();
        let count = request.fragment_count();

        match mode {
            PromptMode::ImageContext => {
                prompt.push_str(&format!(
                    "You are a professional {src} comic translator and OCR correction expert. \
                     Analyze the provided OCR text, correct any recognition errors, then translate \
                     the corrected {src} into {dst}.\n\n\
                     IMPORTANT: also analyze the attached comic page image for OCR correction and \
                     visual features.\n\n",
                    src = self.source_name,
                    dst = self.target_name,
                ));
                prompt.push_str(
                    "Image analysis requirements:\n\
                     1. OCR correction: compare the provided OCR text against the actual text in the \
                     image, fix confusable-character mistakes (e.g. katakana ロ vs kanji 口, 力 vs 刀, \
                     long vowel ー vs 一), missing or extra characters, and handwriting misreads. Put \
                     the corrected source text in the \"original\" field, not the raw OCR output.\n\
                     2. Observe each region's actual layout: \"horizontal\" for left-to-right rows, \
                     \"vertical\" for top-to-bottom columns.\n\
                     3. Bubble background: \"pure_white\" for clean white bubbles, \"textured\" for \
                     gradients/shadows/texture, \"transparent\" for see-through bubbles.\n\
                     4. Estimate the original font size in pixels (typically 8-40), judged from the \
                     text's size relative to its bubble.\n\n",
                );
            }
            PromptMode::TextOnly => {
                prompt.push_str(&format!(
                    "You are a professional {src} comic translator. Translate the provided {src} \
                     text into {dst}.\n\n\
                     NOTE: no image is provided, so OCR correction is not possible. Infer layout and \
                     bubble type from the text content and common comic conventions: dialogue is \
                     usually horizontal in a pure_white bubble, narration is often vertical or \
                     textured, dialogue font sizes are typically 12-20 pixels.\n\n",
                    src = self.source_name,
                    dst = self.target_name,
                ));
            }
        }

        prompt.push_str(
            "STRICT RULE: never drop a text segment. Produce exactly one output entry per input \
             text, in the same order, even when an input looks garbled.\n\n\
             Translation principles:\n\
             - Keep the dialogue natural and fluent, preserving each character's tone.\n\
             - Terminology from the dictionary below must be reused verbatim.\n\
             - Stay consistent with the surrounding context.\n\n\
             Honorific rules:\n\
             - Check the terminology dictionary before translating a name.\n\
             - A dictionary entry annotated (男性) is male: render honorifics accordingly \
             (e.g. 「キクルさん」 → 「奇庫魯先生」 style for male).\n\
             - An entry annotated (女性) is female: render honorifics accordingly.\n\
             - For a character not in the dictionary, judge the gender from context, translate the \
             honorific correctly, and record the name in new_terminology with a (男性) or (女性) \
             annotation appended to the translation.\n\n",
        );

        prompt.push_str("Texts to process, in reading order:\n");
        let texts: Vec<&str> = request.fragments().iter().map(|f| f.text.as_str()).collect();
        prompt.push_str(&serde_json::to_string_pretty(&texts).unwrap_or_default());
        prompt.push('\n');

        if !request.terminology().is_empty() {
            prompt.push_str("\nTerminology dictionary (translations must be reused verbatim):\n");
            for (term, entry) in request.terminology() {
                prompt.push_str(&format!("「{}」 → 「{}」\n", term, entry.annotated()));
            }
        }

        let history = request.history();
        if !history.is_empty() {
            prompt.push_str("\nPreviously translated context:\n");
            let start = history.len().saturating_sub(HISTORY_LIMIT);
            for (i, entry) in history[start..].iter().enumerate() {
                prompt.push_str(&format!(
                    "{}. 「{}」 → 「{}」\n",
                    i + 1,
                    entry.original,
                    entry.translated
                ));
            }
        }

        prompt.push_str(&format!(
            "\nHARD CONSTRAINT: the output must contain exactly {count} translation entries.\n\
             Respond with a single JSON object matching the response schema: a \"translations\" \
             array where each item has \"original\", \"translated\", \"text_direction\" \
             (horizontal|vertical), \"bubble_type\" (pure_white|textured|transparent) and \
             \"estimated_font_size\" (integer pixels), plus a \"new_terminology\" array of \
             {{\"source\", \"target\"}} pairs for newly discovered proper nouns.\n",
        ));

        if strict {
            prompt.push_str(&format!(
                "\n{} your previous reply did not decode against the schema. Respond with raw \
                 JSON only: no markdown fences, no commentary, exactly {} entries in \
                 \"translations\", every field present on every entry.\n",
                SCHEMA_REMINDER, count
            ));
        }

        let image = match mode {
            PromptMode::ImageContext => request.image().map(|bytes| bytes.to_vec()),
            PromptMode::TextOnly => None,
        };

        TranslationPayload {
            prompt,
            image,
            response_schema: response_schema(),
        }
    }
}

/// JSON schema for the structured translation response
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "translations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "original": { "type": "string" },
                        "translated": { "type": "string" },
                        "text_direction": {
                            "type": "string",
                            "enum": ["horizontal", "vertical"]
                        },
                        "bubble_type": {
                            "type": "string",
                            "enum": ["pure_white", "textured", "transparent"]
                        },
                        "estimated_font_size": { "type": "integer" }
                    },
                    "required": [
                        "original", "translated", "text_direction",
                        "bubble_type", "estimated_font_size"
                    ]
                }
            },
            "new_terminology": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "source": { "type": "string" },
                        "target": { "type": "string" }
                    },
                    "required": ["source", "target"]
                }
            }
        },
        "required": ["translations", "new_terminology"]
    })
}
