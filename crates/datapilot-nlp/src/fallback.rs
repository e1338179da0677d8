//! LLM fallback decision.
//!
//! The rule engine never calls an LLM itself. It only flags results that are
//! too weak or too ambiguous; [`resolve_with_fallback`] is the host-side glue
//! that consults an [`LlmIntentClassifier`] for those.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::catalog::{IntentCategory, IntentDescriptor};
use crate::engine::IntentEngine;
use crate::error::{NlpError, Result};
use crate::intent::{CandidateIntent, IntentResult, MatchMethod};

pub const DEFAULT_LLM_FALLBACK_THRESHOLD: f64 = 0.7;
/// Top-two candidates closer than this are considered ambiguous.
pub const AMBIGUITY_MARGIN: f64 = 0.1;

/// Runtime-tunable fallback threshold.
#[derive(Debug)]
pub struct FallbackPolicy {
    threshold: AtomicU64,
}

impl FallbackPolicy {
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Self {
            threshold: AtomicU64::new(threshold.to_bits()),
        })
    }

    pub fn threshold(&self) -> f64 {
        f64::from_bits(self.threshold.load(Ordering::Relaxed))
    }

    /// Rejects values outside [0, 1]; the previous threshold is kept on error.
    pub fn set_threshold(&self, threshold: f64) -> Result<()> {
        validate_threshold(threshold)?;
        self.threshold.store(threshold.to_bits(), Ordering::Relaxed);
        info!("LLM fallback threshold set to {}", threshold);
        Ok(())
    }

    pub fn needs_llm_fallback(&self, confidence: f64) -> bool {
        confidence < self.threshold()
    }

    pub fn requires_fallback(&self, result: &IntentResult) -> bool {
        requires_fallback(result.intent, result.confidence, &result.candidates, self.threshold())
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            threshold: AtomicU64::new(DEFAULT_LLM_FALLBACK_THRESHOLD.to_bits()),
        }
    }
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(NlpError::InvalidThreshold(threshold))
    }
}

/// Fallback is forced for `Unknown`, low confidence, or an ambiguous top two.
pub fn requires_fallback(
    intent: IntentCategory,
    confidence: f64,
    candidates: &[CandidateIntent],
    threshold: f64,
) -> bool {
    intent == IntentCategory::Unknown
        || confidence < threshold
        || is_ambiguous(candidates, threshold)
}

/// True when the two best candidates near the threshold are within the margin.
///
/// `candidates` must already be ranked best first.
pub fn is_ambiguous(candidates: &[CandidateIntent], threshold: f64) -> bool {
    let floor = threshold - AMBIGUITY_MARGIN;
    let mut strong = candidates.iter().filter(|c| c.confidence >= floor);
    match (strong.next(), strong.next()) {
        (Some(first), Some(second)) => first.confidence - second.confidence < AMBIGUITY_MARGIN,
        _ => false,
    }
}

/// Answer from the external classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmVerdict {
    pub intent_code: String,
    pub confidence: f64,
}

/// Higher-capability classifier consulted when the rule engine defers.
#[async_trait]
pub trait LlmIntentClassifier: Send + Sync {
    async fn classify(&self, query: &str, catalog: &[IntentDescriptor]) -> Result<LlmVerdict>;
}

impl IntentResult {
    /// The result re-targeted to the verdict's intent, if the verdict names a
    /// known intent with a valid confidence higher than this result's.
    pub fn superseded_by(&self, verdict: &LlmVerdict) -> Option<IntentResult> {
        let intent = IntentCategory::from_code(&verdict.intent_code)?;
        if intent == IntentCategory::Unknown
            || !(0.0..=1.0).contains(&verdict.confidence)
            || verdict.confidence <= self.confidence
        {
            return None;
        }

        let mut result = self.clone();
        result.intent = intent;
        result.confidence = verdict.confidence;
        result.matched_keywords = Vec::new();
        result.match_method = MatchMethod::Llm;
        result.needs_llm_fallback = false;
        Some(result)
    }
}

/// Classifies `query` and, only if the engine defers, asks `llm` to decide.
///
/// Collaborator failures are logged and the rule-based result is kept.
pub async fn resolve_with_fallback(
    engine: &IntentEngine,
    llm: &dyn LlmIntentClassifier,
    query: &str,
) -> IntentResult {
    let result = engine.classify(query);
    if !result.needs_llm_fallback {
        return result;
    }

    let verdict = match llm.classify(query, &engine.catalog()).await {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!("LLM fallback failed, keeping rule-based result: {}", e);
            return result;
        }
    };

    match result.superseded_by(&verdict) {
        Some(mut superseded) => {
            debug!(
                "LLM verdict {} ({:.2}) supersedes {} ({:.2})",
                superseded.intent, superseded.confidence, result.intent, result.confidence
            );
            superseded.parameters = engine.extract_parameters(query, superseded.intent);
            superseded
        }
        None => result,
    }
}
