//! Intent engine implementation.
//!
//! This module provides the engine that orchestrates normalization, intent
//! classification, temporal/dimension/entity/parameter extraction and the
//! LLM fallback decision for a single query.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use datapilot_core::EngineConfig;

use crate::catalog::{self, IntentCategory, IntentDescriptor};
use crate::dimension::{Dimension, DimensionParser};
use crate::entity::{EntityExtractor, EntityKind};
use crate::error::Result;
use crate::fallback::FallbackPolicy;
use crate::intent::{IntentClassifier, IntentResult};
use crate::normalize::normalize;
use crate::params::{ParameterExtractor, Parameters};
use crate::registry::{LoadReport, PatternRegistry, SharedRegistry};
use crate::stats::{IntentStatistics, StatisticsSnapshot};
use crate::temporal::{Clock, DateRange, SystemClock, TemporalParser};
use crate::QueryContext;

/// Rule-based intent engine.
///
/// Classification is synchronous and lock-free apart from taking a registry
/// snapshot, so one engine can be shared across threads behind an `Arc`.
#[derive(Debug)]
pub struct IntentEngine {
    registry: SharedRegistry,
    classifier: IntentClassifier,
    temporal_parser: TemporalParser,
    dimension_parser: DimensionParser,
    entity_extractor: EntityExtractor,
    parameter_extractor: ParameterExtractor,
    fallback: FallbackPolicy,
    statistics: IntentStatistics,
    clock: Arc<dyn Clock>,
}

impl IntentEngine {
    /// Creates an engine with the built-in patterns and the default threshold.
    pub fn new() -> Self {
        info!("Initializing intent engine");
        Self::with_registry(PatternRegistry::defaults(), FallbackPolicy::default())
    }

    /// Creates an engine from configuration.
    ///
    /// An invalid threshold is an error. A pattern file that cannot be loaded
    /// is logged and the built-in patterns are used instead.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let fallback = FallbackPolicy::new(config.llm_fallback_threshold)?;

        let registry = match &config.pattern_file {
            Some(path) => match PatternRegistry::from_path(path) {
                Ok((registry, _report)) => registry,
                Err(e) => {
                    warn!(
                        path = %path,
                        error = %e,
                        "Failed to load intent patterns, continuing with built-in defaults"
                    );
                    PatternRegistry::defaults()
                }
            },
            None => PatternRegistry::defaults(),
        };

        info!(
            threshold = config.llm_fallback_threshold,
            intents = registry.len(),
            "Initializing intent engine from configuration"
        );
        Ok(Self::with_registry(registry, fallback))
    }

    fn with_registry(registry: PatternRegistry, fallback: FallbackPolicy) -> Self {
        Self {
            registry: SharedRegistry::new(registry),
            classifier: IntentClassifier::new(),
            temporal_parser: TemporalParser::new(),
            dimension_parser: DimensionParser::new(),
            entity_extractor: EntityExtractor::new(),
            parameter_extractor: ParameterExtractor::new(),
            fallback,
            statistics: IntentStatistics::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used for relative dates.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Classifies a query with no context and no default time range.
    pub fn classify(&self, query: &str) -> IntentResult {
        self.classify_with(query, None, None)
    }

    /// Classifies a query.
    ///
    /// # Arguments
    ///
    /// * `query` - Raw user query
    /// * `_context` - Caller session data, accepted for interface stability
    /// * `default_range` - Time range used when the query names none
    #[instrument(skip(self, _context, default_range), fields(query_chars = query.chars().count()))]
    pub fn classify_with(
        &self,
        query: &str,
        _context: Option<&QueryContext>,
        default_range: Option<DateRange>,
    ) -> IntentResult {
        let started = Instant::now();
        let today = self.clock.today();
        let threshold = self.fallback.threshold();

        let normalized = normalize(query);
        let mut result = if normalized.is_empty() {
            debug!("Empty query, returning UNKNOWN");
            let mut result = IntentResult::unknown(query);
            result.time_range = default_range;
            result
        } else {
            let registry = self.registry.snapshot();
            let candidates = self.classifier.classify(&registry, &normalized);
            let mut result = IntentResult::from_candidates(query, candidates);

            result.time_range = self
                .temporal_parser
                .parse(&normalized, today, default_range);
            result.dimension = self.dimension_parser.parse(&normalized);
            result.entities = self.entity_extractor.extract_all(&normalized);
            result.parameters = self.parameter_extractor.extract(&normalized, result.intent);
            result
        };

        result.needs_llm_fallback = crate::fallback::requires_fallback(
            result.intent,
            result.confidence,
            &result.candidates,
            threshold,
        );
        result.processing_time_us = started.elapsed().as_micros() as u64;

        self.statistics.record(&result);

        debug!(
            intent = %result.intent,
            confidence = result.confidence,
            method = result.match_method.as_str(),
            needs_llm_fallback = result.needs_llm_fallback,
            "Classified query"
        );
        result
    }

    /// Resolves the first temporal expression in `query` against today.
    pub fn parse_time_range(&self, query: &str, default: Option<DateRange>) -> Option<DateRange> {
        self.temporal_parser
            .parse(&normalize(query), self.clock.today(), default)
    }

    pub fn parse_dimension(&self, query: &str) -> Option<Dimension> {
        self.dimension_parser.parse(&normalize(query))
    }

    pub fn parse_all_dimensions(&self, query: &str) -> Vec<Dimension> {
        self.dimension_parser.parse_all(&normalize(query))
    }

    pub fn parse_entities(&self, query: &str, kind: EntityKind) -> Vec<String> {
        self.entity_extractor.extract(&normalize(query), kind)
    }

    pub fn extract_entities(&self, query: &str) -> Vec<String> {
        self.entity_extractor.extract_all(&normalize(query))
    }

    pub fn extract_parameters(&self, query: &str, intent: IntentCategory) -> Parameters {
        self.parameter_extractor.extract(&normalize(query), intent)
    }

    /// `confidence < threshold`; the query itself does not take part.
    pub fn needs_llm_fallback(&self, _query: &str, confidence: f64) -> bool {
        self.fallback.needs_llm_fallback(confidence)
    }

    /// Full fallback decision including the ambiguity check.
    pub fn requires_fallback(&self, result: &IntentResult) -> bool {
        self.fallback.requires_fallback(result)
    }

    pub fn llm_fallback_threshold(&self) -> f64 {
        self.fallback.threshold()
    }

    /// Sets the threshold; out-of-range values are rejected and the old one kept.
    pub fn set_llm_fallback_threshold(&self, threshold: f64) -> Result<()> {
        self.fallback.set_threshold(threshold)
    }

    /// Rebuilds the registry from the defaults plus `path` and swaps it in.
    ///
    /// On error the current registry stays in place.
    pub fn reload_patterns(&self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let (registry, report) = PatternRegistry::from_path(path)?;
        self.registry.replace(registry);
        info!(
            merged = report.merged.len(),
            rejected = report.rejected.len(),
            "Intent patterns reloaded"
        );
        Ok(report)
    }

    pub fn registry_snapshot(&self) -> Arc<PatternRegistry> {
        self.registry.snapshot()
    }

    /// Intent catalog offered to the LLM collaborator.
    pub fn catalog(&self) -> Vec<IntentDescriptor> {
        catalog::catalog()
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        self.statistics.snapshot()
    }

    pub fn reset_statistics(&self) {
        self.statistics.reset();
        debug!("Intent statistics reset");
    }
}

impl Default for IntentEngine {
    fn default() -> Self {
        Self::new()
    }
}
