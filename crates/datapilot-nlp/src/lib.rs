//! # DataPilot NLP
//!
//! Rule-based intent engine for Chinese analytics questions.
//!
//! A free-text query such as "本月销售额是多少" is normalized, scored against
//! a per-intent table of keywords and full-match patterns, and enriched with a
//! concrete date range, a grouping dimension, named entities and intent
//! parameters. Weak or ambiguous results are flagged for an LLM fallback that
//! the caller performs.
//!
//! ## Features
//!
//! - **Intent Classification**: Keyword and pattern scoring with ranked candidates
//! - **Temporal Parsing**: Relative and absolute Chinese date expressions against an injectable clock
//! - **Extraction**: Dimensions, departments, regions, metrics and parameters such as top-N
//! - **Hot Reload**: External pattern files merged additively and swapped atomically
//!
//! ## Example
//!
//! ```rust,no_run
//! use datapilot_nlp::{IntentCategory, IntentEngine};
//!
//! let engine = IntentEngine::new();
//! let result = engine.classify("本月销售额是多少");
//! assert_eq!(result.intent, IntentCategory::QuerySalesOverview);
//! println!("{} ({:.2})", result.intent, result.confidence);
//! ```

pub mod catalog;
pub mod dimension;
pub mod engine;
pub mod entity;
pub mod error;
pub mod fallback;
pub mod intent;
pub mod normalize;
pub mod params;
pub mod registry;
pub mod stats;
pub mod temporal;

use std::collections::HashMap;

pub use catalog::{catalog, IntentCategory, IntentDescriptor, IntentGroup};
pub use dimension::{Dimension, DimensionParser};
pub use engine::IntentEngine;
pub use entity::{EntityExtractor, EntityKind};
pub use error::{NlpError, Result};
pub use fallback::{resolve_with_fallback, FallbackPolicy, LlmIntentClassifier, LlmVerdict};
pub use intent::{CandidateIntent, IntentClassifier, IntentResult, MatchMethod};
pub use normalize::normalize;
pub use params::{ParameterExtractor, Parameters};
pub use registry::{LoadReport, PatternRegistry, PatternSpec, RejectedEntry, SharedRegistry};
pub use stats::{IntentStatistics, StatisticsSnapshot};
pub use temporal::{Clock, DateRange, FixedClock, Granularity, SystemClock, TemporalParser};

/// Caller session data passed alongside a query. The engine does not read it.
pub type QueryContext = HashMap<String, serde_json::Value>;
