use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Translation prompts address languages by name ("Japanese", "Traditional
/// Chinese"), while configuration and dictionary keys use ISO codes. This
/// module bridges the two, including the Chinese script subtags that matter
/// for comic translation targets.

/// Strip an optional region/script subtag: `zh-tw` -> (`zh`, Some(`tw`))
fn split_subtag(code: &str) -> (String, Option<String>) {
    let normalized = code.trim().to_lowercase();
    match normalized.split_once('-') {
        Some((base, subtag)) => (base.to_string(), Some(subtag.to_string())),
        None => (normalized, None),
    }
}

/// Normalize a language code to ISO 639-3, ignoring any region subtag
pub fn normalize_to_part3(code: &str) -> Result<String> {
    let (base, _) = split_subtag(code);

    if base.len() == 2 {
        if let Some(lang) = Language::from_639_1(&base) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if base.len() == 3 && Language::from_639_3(&base).is_some() {
        return Ok(base);
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Check if two language codes represent the same language, including the
/// region subtag when both carry one (`zh-tw` != `zh-cn`, but `zh` == `zho`)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let (base1, sub1) = split_subtag(code1);
    let (base2, sub2) = split_subtag(code2);

    let matches_base = match (normalize_to_part3(&base1), normalize_to_part3(&base2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };

    match (sub1, sub2) {
        (Some(a), Some(b)) => matches_base && a == b,
        _ => matches_base,
    }
}

/// Get the English display name for a language code, used when addressing
/// the model in prompts. Chinese script subtags are resolved explicitly.
pub fn get_language_name(code: &str) -> Result<String> {
    let (base, subtag) = split_subtag(code);

    if base == "zh" || base == "zho" {
        return Ok(match subtag.as_deref() {
            Some("tw") | Some("hk") | Some("hant") => "Traditional Chinese".to_string(),
            Some("cn") | Some("sg") | Some("hans") => "Simplified Chinese".to_string(),
            _ => "Chinese".to_string(),
        });
    }

    let part3 = normalize_to_part3(&base)?;
    let lang = Language::from_639_3(&part3)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", part3))?;

    Ok(lang.to_name().to_string())
}
