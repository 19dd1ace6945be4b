/*!
 * Application controller: per-page orchestration around the fallback flow.
 *
 * For each page the controller checks the cache, establishes reading order,
 * selects the applicable terminology subset (with OCR confusable repair),
 * runs the fallback flow, merges newly discovered terms, and persists the
 * result. A cached non-degraded result short-circuits the whole pipeline
 * unless the caller forces retranslation; a degraded cache entry never
 * satisfies a non-forced request since it marks a known-incomplete page.
 */

use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::page::{PageTranslation, TextFragment};
use crate::providers::Provider;
use crate::terminology::TerminologyStore;
use crate::translation::parser::subset_with_repair;
use crate::translation::prompts::PromptBuilder;
use crate::translation::request::{HistoryEntry, TranslationRequest};
use crate::translation::reorder::reorder;
use crate::translation::{CacheKey, CacheStore, FallbackAttempt, TranslationFlow};

/// Rolling cross-page context carried into subsequent prompts
const HISTORY_CAPACITY: usize = 50;

/// Result of orchestrating one page
#[derive(Debug)]
pub struct PageOutcome {
    /// The page translation document, as cached
    pub translation: PageTranslation,
    /// Whether the document came from the cache without any API call
    pub from_cache: bool,
    /// Attempt trail, empty for cache hits
    pub attempts: Vec<FallbackAttempt>,
}

/// Orchestrates pages against a provider, the terminology dictionary and
/// the result cache
pub struct AppController<P> {
    terminology: TerminologyStore,
    cache: CacheStore,
    flow: TranslationFlow<P>,
    history: Mutex<Vec<HistoryEntry>>,
}

impl<P: Provider> AppController<P> {
    /// Build a controller from configuration and a provider
    pub fn new(config: &Config, provider: Arc<P>) -> Result<Self, AppError> {
        let builder = PromptBuilder::new(&config.source_language, &config.target_language)?;
        let terminology = TerminologyStore::load(
            &config.terminology_path,
            base_code(&config.source_language),
            base_code(&config.target_language),
        );

        Ok(Self {
            terminology,
            cache: CacheStore::new(&config.cache_dir),
            flow: TranslationFlow::new(provider, builder),
            history: Mutex::new(Vec::new()),
        })
    }

    /// Shared terminology dictionary
    pub fn terminology(&self) -> &TerminologyStore {
        &self.terminology
    }

    /// Translate one page.
    ///
    /// `force` bypasses the cache read; the fresh result still overwrites
    /// the cache entry afterwards.
    pub async fn translate_page(
        &self,
        image: &[u8],
        fragments: Vec<TextFragment>,
        force: bool,
    ) -> Result<PageOutcome, AppError> {
        let key = CacheKey::for_image(image);

        if !force {
            if let Some(cached) = self.cache.get(&key) {
                if cached.is_degraded() {
                    info!("Cached result for {} is degraded, retranslating", key);
                } else {
                    info!("Using cached translation for {}", key);
                    return Ok(PageOutcome {
                        translation: cached,
                        from_cache: true,
                        attempts: Vec::new(),
                    });
                }
            }
        }

        let ordered = reorder(fragments);
        let terms = subset_with_repair(
            &self.terminology.all_terms(),
            ordered.iter().map(|f| f.text.as_str()),
        );
        info!(
            "Translating page {} ({} fragments, {} terminology entries)",
            key,
            ordered.len(),
            terms.len()
        );

        let request = TranslationRequest::new(ordered)
            .with_terminology(terms)
            .with_history(self.history.lock().clone())
            .with_image(image.to_vec());

        let outcome = self.flow.translate_page(&request).await;

        // Merge and history updates only after the flow reached a terminal
        // state, so an aborted page leaves the dictionary untouched.
        if !outcome.result.new_terminology.is_empty() {
            let merged = self
                .terminology
                .merge(outcome.result.new_terminology.clone())?;
            info!(
                "Terminology merge: {} added, {} updated, {} conflicts",
                merged.added,
                merged.updated,
                merged.conflicts.len()
            );
            for conflict in &merged.conflicts {
                warn!(
                    "Terminology conflict for {}: kept {}, rejected {}",
                    conflict.term,
                    conflict.existing.annotated(),
                    conflict.incoming.annotated()
                );
            }
        }

        if outcome.result.success {
            self.push_history(&outcome.result);
        }

        self.cache.put(&key, &outcome.result)?;

        Ok(PageOutcome {
            translation: outcome.result,
            from_cache: false,
            attempts: outcome.attempts,
        })
    }

    fn push_history(&self, result: &PageTranslation) {
        let mut history = self.history.lock();
        for entry in &result.translated_texts {
            history.push(HistoryEntry::new(&entry.original, &entry.translated));
        }
        let overflow = history.len().saturating_sub(HISTORY_CAPACITY);
        if overflow > 0 {
            history.drain(..overflow);
        }
    }
}

fn base_code(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}
