//! Intent classification module.
//!
//! Keyword evidence and full-match pattern evidence are combined into at most
//! one candidate per intent, then ranked by confidence. Ties keep registry order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::catalog::IntentCategory;
use crate::dimension::Dimension;
use crate::registry::{PatternEntry, PatternRegistry};
use crate::temporal::DateRange;

/// Keyword count at which the base score saturates.
const KEYWORD_SATURATION: usize = 5;
const MAX_COVERAGE_BONUS: f64 = 0.3;
/// Keywords at least this many characters long earn the exact-match bonus.
const EXACT_MATCH_MIN_CHARS: usize = 4;
const EXACT_MATCH_BONUS: f64 = 0.1;
/// Added to a keyword candidate whose intent also has a matching pattern.
const PATTERN_BOOST: f64 = 0.2;
/// Confidence of a candidate backed only by a pattern.
const PATTERN_ONLY_CONFIDENCE: f64 = 0.75;

/// Which evidence produced a candidate or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMethod {
    Keyword,
    Pattern,
    /// Decided by the external LLM classifier.
    Llm,
    /// Nothing matched.
    None,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "KEYWORD",
            Self::Pattern => "PATTERN",
            Self::Llm => "LLM",
            Self::None => "NONE",
        }
    }
}

/// An (intent, confidence) pairing considered before final selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateIntent {
    pub intent: IntentCategory,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    /// Matched keywords in registry order
    pub matched_keywords: Vec<String>,
    pub method: MatchMethod,
}

/// Full outcome of classifying one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: IntentCategory,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    /// The query exactly as received
    pub query: String,
    pub matched_keywords: Vec<String>,
    pub match_method: MatchMethod,
    /// Ranked candidates, best first
    pub candidates: Vec<CandidateIntent>,
    pub needs_llm_fallback: bool,
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub time_range: Option<DateRange>,
    pub dimension: Option<Dimension>,
    pub entities: Vec<String>,
    pub processing_time_us: u64,
}

impl IntentResult {
    /// Result for a query nothing matched.
    pub fn unknown(query: impl Into<String>) -> Self {
        Self {
            intent: IntentCategory::Unknown,
            confidence: 0.0,
            query: query.into(),
            matched_keywords: Vec::new(),
            match_method: MatchMethod::None,
            candidates: Vec::new(),
            needs_llm_fallback: true,
            parameters: BTreeMap::new(),
            time_range: None,
            dimension: None,
            entities: Vec::new(),
            processing_time_us: 0,
        }
    }

    /// Builds the rule-based selection from ranked candidates.
    ///
    /// Extraction fields and the fallback flag are filled in by the engine.
    pub fn from_candidates(query: impl Into<String>, candidates: Vec<CandidateIntent>) -> Self {
        let Some(best) = candidates.first() else {
            return Self::unknown(query);
        };

        let match_method = if best.matched_keywords.is_empty() {
            MatchMethod::Pattern
        } else {
            MatchMethod::Keyword
        };

        Self {
            intent: best.intent,
            confidence: best.confidence,
            matched_keywords: best.matched_keywords.clone(),
            match_method,
            ..Self::unknown(query)
        }
        .with_candidates(candidates)
    }

    fn with_candidates(mut self, candidates: Vec<CandidateIntent>) -> Self {
        self.candidates = candidates;
        self
    }
}

/// Rule-based intent classifier over a [`PatternRegistry`] snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Produces ranked candidates for an already-normalized query.
    pub fn classify(&self, registry: &PatternRegistry, normalized: &str) -> Vec<CandidateIntent> {
        trace!("Classifying normalized query: {}", normalized);

        let query_chars = normalized.chars().count();
        if query_chars == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<CandidateIntent> = registry
            .entries()
            .filter_map(|(intent, entry)| Self::score_intent(intent, entry, normalized, query_chars))
            .collect();

        // Vec::sort_by is stable, so equal scores keep registry order.
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            "Classified into {} candidate(s), best: {:?}",
            candidates.len(),
            candidates.first().map(|c| (c.intent, c.confidence))
        );

        candidates
    }

    fn score_intent(
        intent: IntentCategory,
        entry: &PatternEntry,
        normalized: &str,
        query_chars: usize,
    ) -> Option<CandidateIntent> {
        let matched: Vec<String> = entry
            .keywords
            .iter()
            .filter(|keyword| normalized.contains(keyword.as_str()))
            .cloned()
            .collect();

        let mut candidate = if matched.is_empty() {
            None
        } else {
            let confidence = keyword_confidence(&matched, entry.keywords.len(), query_chars);
            Some(CandidateIntent {
                intent,
                confidence,
                matched_keywords: matched,
                method: MatchMethod::Keyword,
            })
        };

        // Only the first fully matching pattern counts.
        if let Some(pattern) = entry.patterns.iter().find(|p| p.matches_fully(normalized)) {
            trace!("Pattern matched for {}: {}", intent, pattern.source());
            candidate = Some(match candidate {
                Some(mut existing) => {
                    existing.confidence = (existing.confidence + PATTERN_BOOST).min(1.0);
                    existing
                }
                None => CandidateIntent {
                    intent,
                    confidence: PATTERN_ONLY_CONFIDENCE,
                    matched_keywords: Vec::new(),
                    method: MatchMethod::Pattern,
                },
            });
        }

        candidate
    }
}

/// Keyword confidence for an intent with at least one matched keyword.
pub fn keyword_confidence(matched: &[String], total_keywords: usize, query_chars: usize) -> f64 {
    if matched.is_empty() || total_keywords == 0 || query_chars == 0 {
        return 0.0;
    }

    let denominator = total_keywords.min(KEYWORD_SATURATION) as f64;
    let base_score = (matched.len() as f64 / denominator).min(1.0);

    let matched_chars: usize = matched.iter().map(|k| k.chars().count()).sum();
    let coverage_bonus = (matched_chars as f64 / query_chars as f64).min(MAX_COVERAGE_BONUS);

    let exact_match_bonus = if matched
        .iter()
        .any(|k| k.chars().count() >= EXACT_MATCH_MIN_CHARS)
    {
        EXACT_MATCH_BONUS
    } else {
        0.0
    };

    (base_score + coverage_bonus + exact_match_bonus).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn classify(query: &str) -> Vec<CandidateIntent> {
        IntentClassifier::new().classify(&PatternRegistry::defaults(), &normalize(query))
    }

    fn registry_from(json: &str) -> PatternRegistry {
        let mut registry = PatternRegistry::empty();
        let report = registry.merge_document(serde_json::from_str(json).unwrap());
        assert!(report.rejected.is_empty(), "{:?}", report.rejected);
        registry
    }

    #[test]
    fn test_keyword_confidence_formula() {
        let matched = vec!["库存".to_string()];
        // base 1/5, coverage 2/5 capped at 0.3, no exact bonus
        assert!((keyword_confidence(&matched, 6, 5) - 0.5).abs() < 1e-9);

        let matched = vec!["销售排名".to_string()];
        // base 1/2, coverage 4/20, exact bonus
        assert!((keyword_confidence(&matched, 2, 20) - 0.8).abs() < 1e-9);

        let many: Vec<String> = (0..6).map(|i| format!("关键词{}", i)).collect();
        assert_eq!(keyword_confidence(&many, 6, 24), 1.0);
        assert_eq!(keyword_confidence(&[], 6, 10), 0.0);
    }

    #[test]
    fn test_sales_overview_with_pattern_boost() {
        let candidates = classify("本月销售额是多少");
        assert_eq!(candidates.len(), 1);
        let best = &candidates[0];
        assert_eq!(best.intent, IntentCategory::QuerySalesOverview);
        assert_eq!(best.matched_keywords, vec!["销售额", "销售"]);
        assert_eq!(best.method, MatchMethod::Keyword);
        assert!((best.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_pattern_only_candidate() {
        let candidates = classify("华东区和华南区对比");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].intent, IntentCategory::CompareRegion);
        assert_eq!(candidates[0].confidence, PATTERN_ONLY_CONFIDENCE);
        assert!(candidates[0].matched_keywords.is_empty());
        assert_eq!(candidates[0].method, MatchMethod::Pattern);
    }

    #[test]
    fn test_no_match_and_empty_query() {
        assert!(classify("随便说点什么").is_empty());
        assert!(classify("").is_empty());
        assert!(classify("  ？？ ").is_empty());
    }

    #[test]
    fn test_candidates_sorted_and_unique() {
        let candidates = classify("今年利润和去年相比，成本和费用怎么样");
        assert!(candidates.len() >= 2);
        for pair in candidates.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        let mut intents: Vec<_> = candidates.iter().map(|c| c.intent).collect();
        intents.sort();
        intents.dedup();
        assert_eq!(intents.len(), candidates.len());
    }

    #[test]
    fn test_ties_keep_registry_order() {
        let registry = registry_from(
            r#"{
                "QUERY_COST": {"keywords": ["甲"]},
                "QUERY_PROFIT": {"keywords": ["甲"]}
            }"#,
        );
        let candidates = IntentClassifier::new().classify(&registry, "甲乙");
        let order: Vec<_> = candidates.iter().map(|c| c.intent).collect();
        // QUERY_PROFIT precedes QUERY_COST in the catalog.
        assert_eq!(order, vec![IntentCategory::QueryProfit, IntentCategory::QueryCost]);
        assert_eq!(candidates[0].confidence, candidates[1].confidence);
    }

    #[test]
    fn test_only_first_matching_pattern_counts() {
        let registry = registry_from(
            r#"{"QUERY_COST": {"keywords": ["成本", "甲", "乙", "丙", "丁"], "patterns": [".*成本.*", "成本.*"]}}"#,
        );
        let candidates = IntentClassifier::new().classify(&registry, "成本高");
        // base 1/5, coverage capped at 0.3, a single +0.2 boost
        assert!((candidates[0].confidence - 0.7).abs() < 1e-9);

        let registry = registry_from(r#"{"QUERY_COST": {"patterns": ["x.*", "x.*", "x"]}}"#);
        let candidates = IntentClassifier::new().classify(&registry, "x");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].confidence, PATTERN_ONLY_CONFIDENCE);
    }

    #[test]
    fn test_result_from_candidates() {
        let result = IntentResult::from_candidates("华东区和华南区对比", classify("华东区和华南区对比"));
        assert_eq!(result.intent, IntentCategory::CompareRegion);
        assert_eq!(result.match_method, MatchMethod::Pattern);

        let result = IntentResult::from_candidates("本月销售额是多少", classify("本月销售额是多少"));
        assert_eq!(result.match_method, MatchMethod::Keyword);
        assert_eq!(result.query, "本月销售额是多少");

        let result = IntentResult::from_candidates("随便", Vec::new());
        assert_eq!(result.intent, IntentCategory::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.match_method, MatchMethod::None);
    }
}
