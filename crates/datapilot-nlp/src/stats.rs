//! Classification statistics.
//!
//! Lock-free counters updated on every classification. Writers share a read
//! guard over the counters and `reset` takes the write guard, so a reset never
//! interleaves with a half-applied `record`. Counters are still read
//! independently, so a snapshot taken during heavy traffic may be off by
//! in-flight requests.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::catalog::IntentCategory;
use crate::intent::IntentResult;

#[derive(Debug, Default)]
struct Counters {
    total_requests: AtomicU64,
    fallback_count: AtomicU64,
    /// f64 bits
    confidence_sum: AtomicU64,
    distribution: DashMap<IntentCategory, u64>,
}

/// Running totals across all classifications.
#[derive(Debug, Default)]
pub struct IntentStatistics {
    counters: RwLock<Counters>,
}

impl IntentStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: &IntentResult) {
        let counters = self.counters.read();

        counters.total_requests.fetch_add(1, Ordering::Relaxed);
        if result.needs_llm_fallback {
            counters.fallback_count.fetch_add(1, Ordering::Relaxed);
        }

        loop {
            let current = counters.confidence_sum.load(Ordering::Relaxed);
            let updated = (f64::from_bits(current) + result.confidence).to_bits();
            if counters
                .confidence_sum
                .compare_exchange(current, updated, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }

        *counters.distribution.entry(result.intent).or_insert(0) += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.counters.read().total_requests.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        let counters = self.counters.read();
        let total_requests = counters.total_requests.load(Ordering::Relaxed);
        let fallback_count = counters.fallback_count.load(Ordering::Relaxed);
        let confidence_sum = f64::from_bits(counters.confidence_sum.load(Ordering::Relaxed));

        let (average_confidence, fallback_rate) = if total_requests == 0 {
            (0.0, 0.0)
        } else {
            (
                confidence_sum / total_requests as f64,
                fallback_count as f64 / total_requests as f64,
            )
        };

        let intent_distribution = counters
            .distribution
            .iter()
            .map(|entry| (entry.key().code().to_string(), *entry.value()))
            .collect();

        StatisticsSnapshot {
            total_requests,
            fallback_count,
            average_confidence,
            fallback_rate,
            intent_distribution,
        }
    }

    /// Zeroes every counter as one step relative to concurrent `record` calls.
    pub fn reset(&self) {
        *self.counters.write() = Counters::default();
    }
}

/// Serializable view of [`IntentStatistics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub total_requests: u64,
    pub fallback_count: u64,
    pub average_confidence: f64,
    pub fallback_rate: f64,
    /// Request count per intent code
    pub intent_distribution: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn result(intent: IntentCategory, confidence: f64, fallback: bool) -> IntentResult {
        let mut result = IntentResult::unknown("q");
        result.intent = intent;
        result.confidence = confidence;
        result.needs_llm_fallback = fallback;
        result
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = IntentStatistics::new().snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.average_confidence, 0.0);
        assert_eq!(snapshot.fallback_rate, 0.0);
        assert!(snapshot.intent_distribution.is_empty());
    }

    #[test]
    fn test_record_and_reset() {
        let stats = IntentStatistics::new();
        stats.record(&result(IntentCategory::QueryProfit, 0.9, false));
        stats.record(&result(IntentCategory::QueryProfit, 0.5, true));
        stats.record(&result(IntentCategory::Unknown, 0.0, true));
        stats.record(&result(IntentCategory::QueryCost, 0.6, true));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_requests, 4);
        assert_eq!(snapshot.fallback_count, 3);
        assert!((snapshot.average_confidence - 0.5).abs() < 1e-9);
        assert!((snapshot.fallback_rate - 0.75).abs() < 1e-9);
        assert_eq!(snapshot.intent_distribution["QUERY_PROFIT"], 2);
        assert_eq!(snapshot.intent_distribution["UNKNOWN"], 1);
        assert_eq!(snapshot.intent_distribution["QUERY_COST"], 1);

        stats.reset();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.fallback_count, 0);
        assert!(snapshot.intent_distribution.is_empty());
    }

    #[test]
    fn test_concurrent_record() {
        let stats = Arc::new(IntentStatistics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..250 {
                        stats.record(&result(IntentCategory::QuerySalesOverview, 0.5, false));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_requests, 2000);
        assert_eq!(snapshot.intent_distribution["QUERY_SALES_OVERVIEW"], 2000);
        assert!((snapshot.average_confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reset_during_concurrent_record_stays_consistent() {
        for _ in 0..50 {
            let stats = Arc::new(IntentStatistics::new());
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let stats = Arc::clone(&stats);
                    let intent = if i % 2 == 0 {
                        IntentCategory::QueryProfit
                    } else {
                        IntentCategory::Unknown
                    };
                    thread::spawn(move || {
                        for _ in 0..1000 {
                            stats.record(&result(intent, 0.5, true));
                        }
                    })
                })
                .collect();

            for _ in 0..50 {
                stats.reset();
                thread::yield_now();
            }
            for handle in handles {
                handle.join().unwrap();
            }

            let snapshot = stats.snapshot();
            let distributed: u64 = snapshot.intent_distribution.values().sum();
            assert_eq!(distributed, snapshot.total_requests);
            assert_eq!(snapshot.fallback_count, snapshot.total_requests);
            assert!(snapshot.fallback_rate <= 1.0);
            if snapshot.total_requests > 0 {
                assert!((snapshot.average_confidence - 0.5).abs() < 1e-9);
            }
        }
    }
}
