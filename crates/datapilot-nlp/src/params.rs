//! Intent parameter extraction.
//!
//! Metric, top-N, sort order and aggregation are extracted independently of
//! the resolved intent; comparison type and ranking defaults depend on it.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

use crate::catalog::IntentCategory;
use crate::entity::METRIC_REGEX;

pub const PARAM_METRIC: &str = "metric";
pub const PARAM_TOP_N: &str = "topN";
pub const PARAM_SORT_ORDER: &str = "sortOrder";
pub const PARAM_AGGREGATION: &str = "aggregation";
pub const PARAM_COMPARE_TYPE: &str = "compareType";

/// Top-N applied to ranking intents that do not state one.
pub const DEFAULT_RANKING_TOP_N: u32 = 10;

/// Intent parameters keyed by name.
pub type Parameters = BTreeMap<String, Value>;

lazy_static! {
    static ref TOP_N_REGEX: Regex = Regex::new(r"top(\d+)|前(\d+)").unwrap();
    static ref ASC_REGEX: Regex = Regex::new(r"升序|从低到高|由低到高|从小到大").unwrap();
    static ref DESC_REGEX: Regex = Regex::new(r"降序|从高到低|由高到低|从大到小").unwrap();

    /// Checked in order; the first hit decides the aggregation.
    static ref AGGREGATION_CHAIN: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"合计|汇总|总计|总和|总额|累计|一共").unwrap(), "SUM"),
        (Regex::new(r"平均|均值|人均").unwrap(), "AVG"),
        (Regex::new(r"最高|最大|最多|峰值").unwrap(), "MAX"),
        (Regex::new(r"最低|最小|最少").unwrap(), "MIN"),
        (Regex::new(r"数量|多少个|几个|次数|个数|多少笔|多少家").unwrap(), "COUNT"),
    ];
}

/// Secondary scan for parameters that refine an intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterExtractor;

impl ParameterExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, normalized: &str, intent: IntentCategory) -> Parameters {
        let mut params = Parameters::new();

        if let Some(metric) = METRIC_REGEX.find(normalized) {
            params.insert(PARAM_METRIC.to_string(), Value::from(metric.as_str()));
        }

        if let Some(top_n) = extract_top_n(normalized) {
            params.insert(PARAM_TOP_N.to_string(), Value::from(top_n));
        }

        if ASC_REGEX.is_match(normalized) {
            params.insert(PARAM_SORT_ORDER.to_string(), Value::from("ASC"));
        } else if DESC_REGEX.is_match(normalized) {
            params.insert(PARAM_SORT_ORDER.to_string(), Value::from("DESC"));
        }

        // Cues for lower-priority functions are ignored once one branch hits.
        if let Some((_, aggregation)) = AGGREGATION_CHAIN
            .iter()
            .find(|(regex, _)| regex.is_match(normalized))
        {
            params.insert(PARAM_AGGREGATION.to_string(), Value::from(*aggregation));
        }

        if intent == IntentCategory::ComparePeriod {
            if normalized.contains("同比") {
                params.insert(PARAM_COMPARE_TYPE.to_string(), Value::from("YoY"));
            } else if normalized.contains("环比") {
                params.insert(PARAM_COMPARE_TYPE.to_string(), Value::from("MoM"));
            }
        }

        if intent.is_ranking() {
            params
                .entry(PARAM_TOP_N.to_string())
                .or_insert_with(|| Value::from(DEFAULT_RANKING_TOP_N));
            params
                .entry(PARAM_SORT_ORDER.to_string())
                .or_insert_with(|| Value::from("DESC"));
        }

        trace!("Extracted parameters: {:?}", params);
        params
    }
}

fn extract_top_n(normalized: &str) -> Option<u32> {
    let caps = TOP_N_REGEX.captures(normalized)?;
    caps.iter()
        .skip(1)
        .flatten()
        .next()?
        .as_str()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(query: &str, intent: IntentCategory) -> Parameters {
        ParameterExtractor::new().extract(query, intent)
    }

    #[test]
    fn test_metric_and_aggregation() {
        let params = extract("按部门汇总销售额", IntentCategory::QuerySalesOverview);
        assert_eq!(params[PARAM_METRIC], "销售额");
        assert_eq!(params[PARAM_AGGREGATION], "SUM");
        assert!(!params.contains_key(PARAM_TOP_N));
        assert!(!params.contains_key(PARAM_SORT_ORDER));
    }

    #[test]
    fn test_top_n_forms() {
        assert_eq!(extract("top5产品", IntentCategory::Unknown)[PARAM_TOP_N], 5);
        assert_eq!(extract("销售额前20的客户", IntentCategory::Unknown)[PARAM_TOP_N], 20);
        assert!(!extract("前99999999999名", IntentCategory::Unknown).contains_key(PARAM_TOP_N));
    }

    #[test]
    fn test_sort_order() {
        assert_eq!(extract("利润从低到高", IntentCategory::QueryProfit)[PARAM_SORT_ORDER], "ASC");
        assert_eq!(extract("按降序排列", IntentCategory::QueryProfit)[PARAM_SORT_ORDER], "DESC");
    }

    #[test]
    fn test_aggregation_priority_chain() {
        // SUM outranks AVG even though the AVG cue comes first.
        assert_eq!(extract("平均值和合计", IntentCategory::Unknown)[PARAM_AGGREGATION], "SUM");
        assert_eq!(extract("平均和最高", IntentCategory::Unknown)[PARAM_AGGREGATION], "AVG");
        assert_eq!(extract("最低和订单个数", IntentCategory::Unknown)[PARAM_AGGREGATION], "MIN");
        assert_eq!(extract("投诉次数", IntentCategory::Unknown)[PARAM_AGGREGATION], "COUNT");
    }

    #[test]
    fn test_compare_type() {
        let params = extract("销售额同比增长", IntentCategory::ComparePeriod);
        assert_eq!(params[PARAM_COMPARE_TYPE], "YoY");
        let params = extract("利润环比", IntentCategory::ComparePeriod);
        assert_eq!(params[PARAM_COMPARE_TYPE], "MoM");
        let params = extract("同比和环比", IntentCategory::ComparePeriod);
        assert_eq!(params[PARAM_COMPARE_TYPE], "YoY");

        let params = extract("销售额同比增长", IntentCategory::QuerySalesOverview);
        assert!(!params.contains_key(PARAM_COMPARE_TYPE));
    }

    #[test]
    fn test_ranking_defaults() {
        let params = extract("销售排名", IntentCategory::QuerySalesRanking);
        assert_eq!(params[PARAM_TOP_N], 10);
        assert_eq!(params[PARAM_SORT_ORDER], "DESC");

        let params = extract("销售排名前3从低到高", IntentCategory::QuerySalesRanking);
        assert_eq!(params[PARAM_TOP_N], 3);
        assert_eq!(params[PARAM_SORT_ORDER], "ASC");

        let params = extract("销售排名", IntentCategory::QuerySalesOverview);
        assert!(params.is_empty());
    }
}
