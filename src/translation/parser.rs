/*!
 * Response decoding and validation, plus OCR confusable repair.
 *
 * The parser is the single place where a raw provider reply is classified:
 * empty body, policy-block notice, undecodable schema, entry count mismatch,
 * or a valid page translation. The fallback flow keys its retry decisions on
 * the `ParseError` variant, so classification must happen exactly once and
 * here.
 *
 * The confusable repair pass compensates for single-character OCR misreads
 * (katakana ロ read as kanji 口 and the like) when matching dictionary terms
 * against detected page text.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::errors::ParseError;
use crate::page::{
    BubbleType, FallbackStage, PAGE_SCHEMA_VERSION, PageTranslation, TextDirection, TranslatedText,
};
use crate::terminology::TermEntry;

/// Character pairs OCR engines commonly swap in Japanese comic lettering
const CONFUSABLE_PAIRS: &[(char, char)] = &[
    ('ロ', '口'),
    ('力', '刀'),
    ('ー', '一'),
    ('ニ', '二'),
    ('エ', '工'),
    ('タ', '夕'),
    ('ソ', 'ン'),
    ('シ', 'ツ'),
    ('未', '末'),
    ('土', '士'),
];

static CONFUSABLE_MAP: Lazy<HashMap<char, Vec<char>>> = Lazy::new(|| {
    let mut map: HashMap<char, Vec<char>> = HashMap::new();
    for &(a, b) in CONFUSABLE_PAIRS {
        map.entry(a).or_default().push(b);
        map.entry(b).or_default().push(a);
    }
    map
});

/// First JSON object embedded in a reply that carries prose around it
static JSON_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON object regex"));

/// Phrases that mark a refusal notice instead of translation content.
/// Checked only after JSON decoding has already failed.
const FILTER_MARKERS: &[&str] = &[
    "i cannot",
    "i can't",
    "i'm unable",
    "i am unable",
    "unable to translate",
    "cannot assist",
    "content policy",
    "safety policy",
    "blocked by safety",
    "申し訳ありません",
];

#[derive(Debug, Deserialize)]
struct RawResponse {
    translations: Vec<RawTranslation>,
    #[serde(default)]
    new_terminology: Vec<RawTerm>,
}

#[derive(Debug, Deserialize)]
struct RawTranslation {
    original: String,
    translated: String,
    #[serde(default, alias = "direction")]
    text_direction: TextDirection,
    #[serde(default)]
    bubble_type: BubbleType,
    #[serde(default = "default_font_size")]
    estimated_font_size: u32,
}

fn default_font_size() -> u32 {
    crate::page::DEFAULT_FONT_SIZE
}

#[derive(Debug, Deserialize)]
struct RawTerm {
    #[serde(alias = "japanese")]
    source: String,
    #[serde(alias = "chinese")]
    target: String,
}

/// Decodes raw provider replies into validated page translations
pub struct ResponseParser;

impl ResponseParser {
    /// Decode and validate a raw reply.
    ///
    /// `expected` is the fragment count of the request; a reply with any
    /// other number of entries is rejected so downstream consumers can rely
    /// on positional correspondence with the request fragments.
    pub fn parse(
        raw: &str,
        expected: usize,
        stage: FallbackStage,
    ) -> Result<PageTranslation, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyResponse);
        }

        let body = strip_code_fences(trimmed);

        let decoded = match serde_json::from_str::<RawResponse>(body) {
            Ok(decoded) => decoded,
            Err(first_err) => match JSON_OBJECT_RE
                .find(body)
                .and_then(|m| serde_json::from_str::<RawResponse>(m.as_str()).ok())
            {
                Some(decoded) => {
                    debug!("Recovered JSON object from a reply with surrounding prose");
                    decoded
                }
                None => {
                    if let Some(marker) = filter_marker(body) {
                        warn!("Reply is a refusal notice (matched {:?})", marker);
                        return Err(ParseError::ContentFiltered(truncate(body, 200)));
                    }
                    return Err(ParseError::SchemaError(first_err.to_string()));
                }
            },
        };

        if decoded.translations.len() != expected {
            return Err(ParseError::CountMismatch {
                expected,
                actual: decoded.translations.len(),
            });
        }

        let translated_texts = decoded
            .translations
            .into_iter()
            .map(|t| TranslatedText {
                original: t.original,
                translated: t.translated,
                text_direction: t.text_direction,
                bubble_type: t.bubble_type,
                estimated_font_size: t.estimated_font_size,
            })
            .collect();

        let new_terminology = decoded
            .new_terminology
            .into_iter()
            .map(|t| (t.source, TermEntry::from_annotated(&t.target)))
            .collect();

        Ok(PageTranslation {
            schema_version: PAGE_SCHEMA_VERSION,
            stage,
            success: true,
            translated_texts,
            new_terminology,
        })
    }
}

/// Strip a markdown code fence wrapper (```json ... ```), if present
fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence line
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn filter_marker(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    FILTER_MARKERS
        .iter()
        .find(|marker| lowered.contains(**marker))
        .copied()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// All single-substitution OCR confusable variants of a term, the term
/// itself excluded. Bounded at one substitution because OCR misreads are
/// overwhelmingly isolated characters.
pub fn confusable_variants(term: &str) -> Vec<String> {
    let chars: Vec<char> = term.chars().collect();
    let mut variants = Vec::new();

    for (i, c) in chars.iter().enumerate() {
        let Some(alternates) = CONFUSABLE_MAP.get(c) else {
            continue;
        };
        for &alt in alternates {
            let mut variant = chars.clone();
            variant[i] = alt;
            variants.push(variant.into_iter().collect());
        }
    }

    variants
}

/// Look up a detected term in a dictionary snapshot, repairing a single OCR
/// confusable if the verbatim form is absent. Returns the canonical
/// dictionary key alongside the entry.
pub fn lookup_with_repair<'a>(
    terms: &'a BTreeMap<String, TermEntry>,
    detected: &str,
) -> Option<(&'a str, &'a TermEntry)> {
    if let Some((term, entry)) = terms.get_key_value(detected) {
        return Some((term.as_str(), entry));
    }

    for variant in confusable_variants(detected) {
        if let Some((term, entry)) = terms.get_key_value(&variant) {
            debug!("Repaired OCR confusable: {} -> {}", detected, term);
            return Some((term.as_str(), entry));
        }
    }

    None
}

/// Dictionary terms appearing in any of the texts, verbatim or through a
/// single-character confusable variant. Keys are the canonical dictionary
/// terms even when the page text carries the misread form.
pub fn subset_with_repair<'a, I>(
    terms: &BTreeMap<String, TermEntry>,
    texts: I,
) -> BTreeMap<String, TermEntry>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let mut subset = BTreeMap::new();

    for (term, entry) in terms {
        let mut forms = vec![term.clone()];
        forms.extend(confusable_variants(term));

        let present = texts
            .clone()
            .into_iter()
            .any(|text| forms.iter().any(|form| text.contains(form.as_str())));
        if present {
            subset.insert(term.clone(), entry.clone());
        }
    }

    subset
}
