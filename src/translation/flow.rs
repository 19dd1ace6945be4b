/*!
 * Multi-stage fallback flow for one page.
 *
 * The flow is an explicit state machine over the escalation stages
 * `ImageContext -> TextOnly -> OriginalText`. Every escalation decision is
 * keyed on a named `FailureKind`, so each path is testable without a real
 * provider:
 *
 * - a transport failure is retried once in-state, then escalates;
 * - a content filter escalates immediately, in-state retries cannot succeed;
 * - an empty reply escalates immediately;
 * - a schema or count failure gets one strict re-prompt in-state, then
 *   escalates.
 *
 * `OriginalText` never calls the provider: it synthesizes a degraded result
 * with the source text carried over, so the flow terminates with a result
 * for every page. Attempts are recorded with stage, failure kind and
 * timestamp for observability.
 */

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::errors::{ParseError, ProviderError};
use crate::page::{FallbackStage, PAGE_SCHEMA_VERSION, PageTranslation};
use crate::providers::Provider;
use crate::translation::parser::ResponseParser;
use crate::translation::prompts::{PromptBuilder, PromptMode};
use crate::translation::request::TranslationRequest;

/// Classified failure of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network or API-layer failure, worth one in-state retry
    Transport,
    /// Safety/policy block, from the envelope or the reply text
    ContentFiltered,
    /// Empty reply body
    EmptyResponse,
    /// Reply not decodable into the translation schema
    SchemaError,
    /// Reply entry count differs from the fragment count
    CountMismatch,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::ContentFiltered => "content_filtered",
            Self::EmptyResponse => "empty_response",
            Self::SchemaError => "schema_error",
            Self::CountMismatch => "count_mismatch",
        };
        write!(f, "{}", name)
    }
}

impl From<&ProviderError> for FailureKind {
    fn from(error: &ProviderError) -> Self {
        if error.is_content_filtered() {
            Self::ContentFiltered
        } else {
            Self::Transport
        }
    }
}

impl From<&ParseError> for FailureKind {
    fn from(error: &ParseError) -> Self {
        match error {
            ParseError::EmptyResponse => Self::EmptyResponse,
            ParseError::SchemaError(_) => Self::SchemaError,
            ParseError::CountMismatch { .. } => Self::CountMismatch,
            ParseError::ContentFiltered(_) => Self::ContentFiltered,
        }
    }
}

/// Record of one attempt, kept for observability within a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackAttempt {
    /// Stage the attempt ran in
    pub stage: FallbackStage,
    /// Failure kind, `None` when the attempt produced the final result
    pub failure: Option<FailureKind>,
    /// When the attempt finished
    pub timestamp: DateTime<Utc>,
}

impl FallbackAttempt {
    fn new(stage: FallbackStage, failure: Option<FailureKind>) -> Self {
        Self { stage, failure, timestamp: Utc::now() }
    }
}

/// Final result of one page's flow plus its attempt trail
#[derive(Debug)]
pub struct FlowOutcome {
    /// The page translation, degraded when every API stage failed
    pub result: PageTranslation,
    /// Every attempt made, in order
    pub attempts: Vec<FallbackAttempt>,
}

/// What the stage loop decided after one attempt
enum StageVerdict {
    Done(PageTranslation),
    RetrySameStage { strict: bool },
    Escalate,
}

/// Drives one page through the fallback stages against a provider
pub struct TranslationFlow<P> {
    provider: Arc<P>,
    builder: PromptBuilder,
}

impl<P: Provider> TranslationFlow<P> {
    /// Create a flow bound to a provider and a prompt builder
    pub fn new(provider: Arc<P>, builder: PromptBuilder) -> Self {
        Self { provider, builder }
    }

    /// Translate one page, escalating through the stages as needed.
    ///
    /// Always returns a result whose entry count equals the request's
    /// fragment count. A request without an image starts at `TextOnly`.
    pub async fn translate_page(&self, request: &TranslationRequest) -> FlowOutcome {
        let mut attempts = Vec::new();

        if request.fragment_count() == 0 {
            debug!("Page has no text fragments, nothing to translate");
            return FlowOutcome {
                result: PageTranslation {
                    schema_version: PAGE_SCHEMA_VERSION,
                    stage: initial_stage(request),
                    success: true,
                    translated_texts: Vec::new(),
                    new_terminology: Default::default(),
                },
                attempts,
            };
        }

        let stages: &[(FallbackStage, PromptMode)] = if request.image().is_some() {
            &[
                (FallbackStage::ImageContext, PromptMode::ImageContext),
                (FallbackStage::TextOnly, PromptMode::TextOnly),
            ]
        } else {
            &[(FallbackStage::TextOnly, PromptMode::TextOnly)]
        };

        for &(stage, mode) in stages {
            if let Some(result) = self.run_stage(request, stage, mode, &mut attempts).await {
                info!("Page translated at stage {}", stage);
                return FlowOutcome { result, attempts };
            }
            debug!("Escalating past stage {}", stage);
        }

        warn!(
            "All API stages failed after {} attempts, keeping source text untranslated",
            attempts.len()
        );
        attempts.push(FallbackAttempt::new(FallbackStage::OriginalText, None));
        FlowOutcome {
            result: PageTranslation::degraded(request.fragments()),
            attempts,
        }
    }

    /// Run one API stage to completion. `Some` carries the final result,
    /// `None` means the stage gave up and the flow escalates.
    async fn run_stage(
        &self,
        request: &TranslationRequest,
        stage: FallbackStage,
        mode: PromptMode,
        attempts: &mut Vec<FallbackAttempt>,
    ) -> Option<PageTranslation> {
        let mut retried = false;
        let mut reprompted = false;
        let mut strict = false;

        loop {
            let verdict = self.attempt(request, stage, mode, strict, attempts).await;
            match verdict {
                StageVerdict::Done(result) => return Some(result),
                StageVerdict::Escalate => return None,
                StageVerdict::RetrySameStage { strict: wants_strict } => {
                    if wants_strict {
                        if reprompted {
                            return None;
                        }
                        reprompted = true;
                        strict = true;
                        info!("Re-prompting stage {} with a strict schema reminder", stage);
                    } else {
                        if retried {
                            return None;
                        }
                        retried = true;
                        info!("Retrying stage {} after a transport failure", stage);
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &TranslationRequest,
        stage: FallbackStage,
        mode: PromptMode,
        strict: bool,
        attempts: &mut Vec<FallbackAttempt>,
    ) -> StageVerdict {
        let payload = if strict {
            self.builder.build_strict(request, mode)
        } else {
            self.builder.build(request, mode)
        };

        match self.provider.generate(&payload).await {
            Err(error) => {
                let kind = FailureKind::from(&error);
                warn!("Stage {} provider failure ({}): {}", stage, kind, error);
                attempts.push(FallbackAttempt::new(stage, Some(kind)));

                match kind {
                    FailureKind::ContentFiltered => StageVerdict::Escalate,
                    _ => StageVerdict::RetrySameStage { strict: false },
                }
            }
            Ok(raw) => match ResponseParser::parse(&raw, request.fragment_count(), stage) {
                Ok(result) => {
                    attempts.push(FallbackAttempt::new(stage, None));
                    StageVerdict::Done(result)
                }
                Err(error) => {
                    let kind = FailureKind::from(&error);
                    warn!("Stage {} reply rejected ({}): {}", stage, kind, error);
                    attempts.push(FallbackAttempt::new(stage, Some(kind)));

                    match kind {
                        FailureKind::SchemaError | FailureKind::CountMismatch => {
                            StageVerdict::RetrySameStage { strict: true }
                        }
                        _ => StageVerdict::Escalate,
                    }
                }
            },
        }
    }
}

fn initial_stage(request: &TranslationRequest) -> FallbackStage {
    if request.image().is_some() {
        FallbackStage::ImageContext
    } else {
        FallbackStage::TextOnly
    }
}
