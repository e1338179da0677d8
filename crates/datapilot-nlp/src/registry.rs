//! Intent pattern registry.
//!
//! A [`PatternRegistry`] holds, per intent and in catalog order, the keyword list,
//! the anchored regex list and a weight. A registry is never edited once it has
//! been published: [`SharedRegistry::replace`] swaps in a fully built value, so
//! readers always see either the old or the new table as a whole.

use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::IntentCategory;
use crate::error::{NlpError, Result};
use crate::normalize::normalize;

/// Default weight for intents that do not declare one.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Built-in (intent, keywords, full-match patterns) table.
///
/// Keywords and patterns are written against the normalized query, i.e.
/// lowercase with whitespace and punctuation removed.
const DEFAULT_RULES: &[(IntentCategory, &[&str], &[&str])] = &[
    (
        IntentCategory::QuerySalesOverview,
        &["销售额", "销售", "营业额", "销售情况", "销售收入", "卖了多少"],
        &[
            r".*(销售额|营业额|销售收入).*(多少|怎么样|如何).*",
            r".*(查询|查看|看看|看一下).*(销售额|营业额|销售情况).*",
        ],
    ),
    (
        IntentCategory::QuerySalesTrend,
        &["趋势", "走势", "变化", "波动", "增长情况"],
        &[r".*(销售|销售额|营业额).*(趋势|走势|变化).*"],
    ),
    (
        IntentCategory::QuerySalesRanking,
        &["销售排名", "销售排行", "排名", "排行", "排行榜", "top"],
        &[r".*(销售|销售额|业绩).*(排名|排行).*", r".*(top|前)\d+.*"],
    ),
    (
        IntentCategory::QueryProductSales,
        &["产品销售", "产品销量", "各产品", "哪个产品", "品类", "爆款"],
        &[r".*(产品|品类|型号).*(卖|销量|销售).*"],
    ),
    (
        IntentCategory::QueryFinanceOverview,
        &["财务", "财务状况", "收支", "现金流", "资金", "财报"],
        &[],
    ),
    (
        IntentCategory::QueryProfit,
        &["利润", "毛利", "净利", "利润率", "盈利", "毛利率"],
        &[r".*(赚了|挣了)多少.*"],
    ),
    (
        IntentCategory::QueryCost,
        &["成本", "费用", "支出", "开销", "花费"],
        &[],
    ),
    (
        IntentCategory::QueryReceivable,
        &["应收", "回款", "应收账款", "账期", "欠款"],
        &[],
    ),
    (
        IntentCategory::QueryProductionOverview,
        &["产量", "生产", "生产情况", "产能", "开工", "完工"],
        &[r".*(生产|产量).*(多少|怎么样|如何).*"],
    ),
    (
        IntentCategory::QueryEquipmentStatus,
        &["设备", "设备状态", "停机", "故障", "稼动率", "oee"],
        &[],
    ),
    (
        IntentCategory::QueryInventory,
        &["库存", "存货", "库存量", "缺货", "积压", "周转"],
        &[],
    ),
    (
        IntentCategory::QueryQualityOverview,
        &["质量", "品质", "合格率", "良品率", "良率", "质检"],
        &[],
    ),
    (
        IntentCategory::QueryDefectAnalysis,
        &["不良", "缺陷", "不良率", "返工", "报废", "投诉"],
        &[],
    ),
    (
        IntentCategory::ComparePeriod,
        &["同比", "环比", "比上月", "比去年", "较上期", "同期"],
        &[r".*(和|与|跟|比)(上月|上个月|去年|上周|上季度|去年同期).*"],
    ),
    (
        IntentCategory::CompareRegion,
        &["区域对比", "地区对比", "各区域", "各大区", "区域差异"],
        &[r".*(华东|华南|华北|华中|西南|西北|东北)区?(和|与|跟|vs)(华东|华南|华北|华中|西南|西北|东北)区?.*"],
    ),
    (
        IntentCategory::CompareDepartment,
        &["部门对比", "各部门对比", "部门之间", "部门差异", "部门比较"],
        &[r".*(销售部|财务部|生产部|质量部|采购部|市场部|研发部|人事部|物流部|仓储部)(和|与|跟|vs)(销售部|财务部|生产部|质量部|采购部|市场部|研发部|人事部|物流部|仓储部).*"],
    ),
    (
        IntentCategory::QueryEmployeeRanking,
        &["业绩排名", "员工排名", "人员排名", "销售冠军", "个人业绩", "谁卖得最多"],
        &[],
    ),
    (
        IntentCategory::GenerateReport,
        &["报表", "报告", "日报", "周报", "月报", "生成报表"],
        &[],
    ),
    (
        IntentCategory::ExportData,
        &["导出", "下载", "excel", "导出数据", "导出报表"],
        &[],
    ),
    (
        IntentCategory::SystemHelp,
        &["帮助", "怎么用", "使用说明", "你能做什么", "功能介绍"],
        &[],
    ),
];

/// A regex that must match the whole normalized query.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    pub fn new(source: impl Into<String>) -> std::result::Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self { source, regex })
    }

    /// The pattern as written, without the implicit anchors.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches_fully(&self, normalized_query: &str) -> bool {
        self.regex.is_match(normalized_query)
    }
}

/// Keywords, patterns and weight for one intent.
#[derive(Debug, Clone)]
pub struct PatternEntry {
    pub keywords: Vec<String>,
    pub patterns: Vec<CompiledPattern>,
    pub weight: f64,
}

impl PatternEntry {
    fn empty() -> Self {
        Self {
            keywords: Vec::new(),
            patterns: Vec::new(),
            weight: DEFAULT_WEIGHT,
        }
    }
}

/// One intent's section of an external pattern resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternSpec {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// An external entry that could not be merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedEntry {
    pub code: String,
    pub reason: String,
}

/// Outcome of merging an external pattern resource.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub merged: Vec<String>,
    pub rejected: Vec<RejectedEntry>,
}

impl LoadReport {
    fn reject(&mut self, code: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(code = %code, reason = %reason, "Rejected external pattern entry");
        self.rejected.push(RejectedEntry {
            code: code.to_string(),
            reason,
        });
    }
}

/// Serialization format of an external pattern resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFormat {
    Json,
    Yaml,
}

impl PatternFormat {
    /// `.yaml`/`.yml` select YAML, anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Ordered per-intent pattern table.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    entries: Vec<(IntentCategory, PatternEntry)>,
}

impl PatternRegistry {
    /// Registry with every catalog intent present but no keywords or patterns.
    pub fn empty() -> Self {
        let entries = IntentCategory::ALL
            .iter()
            .filter(|intent| **intent != IntentCategory::Unknown)
            .map(|intent| (*intent, PatternEntry::empty()))
            .collect();
        Self { entries }
    }

    /// Registry built from the built-in rule table.
    pub fn defaults() -> Self {
        let mut registry = Self::empty();
        for (intent, keywords, patterns) in DEFAULT_RULES {
            if let Some(entry) = registry.entry_mut(*intent) {
                entry.keywords = keywords.iter().map(|k| k.to_string()).collect();
                entry.patterns = patterns
                    .iter()
                    .filter_map(|p| match CompiledPattern::new(*p) {
                        Ok(compiled) => Some(compiled),
                        Err(e) => {
                            warn!(intent = %intent, pattern = %p, error = %e, "Invalid built-in pattern");
                            None
                        }
                    })
                    .collect();
            }
        }
        registry
    }

    /// Built-in defaults extended with the resource at `path`.
    ///
    /// Fails only when the resource cannot be read or is not a mapping;
    /// individual bad entries are reported in the [`LoadReport`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<(Self, LoadReport)> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let document = parse_document(&content, PatternFormat::from_path(path))?;

        let mut registry = Self::defaults();
        let report = registry.merge_document(document);
        info!(
            path = %path.display(),
            merged = report.merged.len(),
            rejected = report.rejected.len(),
            "Loaded external intent patterns"
        );
        Ok((registry, report))
    }

    /// Iterates entries in registry order.
    pub fn entries(&self) -> impl Iterator<Item = (IntentCategory, &PatternEntry)> {
        self.entries.iter().map(|(intent, entry)| (*intent, entry))
    }

    pub fn get(&self, intent: IntentCategory) -> Option<&PatternEntry> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == intent)
            .map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, intent: IntentCategory) -> Option<&mut PatternEntry> {
        self.entries
            .iter_mut()
            .find(|(candidate, _)| *candidate == intent)
            .map(|(_, entry)| entry)
    }

    /// Merges raw `code -> spec` sections additively into this registry.
    pub fn merge_document(&mut self, document: BTreeMap<String, serde_json::Value>) -> LoadReport {
        let mut report = LoadReport::default();

        for (code, raw) in document {
            let intent = match IntentCategory::from_code(&code) {
                Some(IntentCategory::Unknown) => {
                    report.reject(&code, "UNKNOWN cannot carry patterns");
                    continue;
                }
                Some(intent) => intent,
                None => {
                    report.reject(&code, "unknown intent code");
                    continue;
                }
            };

            let spec: PatternSpec = match serde_json::from_value(raw) {
                Ok(spec) => spec,
                Err(e) => {
                    report.reject(&code, format!("malformed entry: {}", e));
                    continue;
                }
            };

            match self.merge_spec(intent, spec) {
                Ok(()) => {
                    debug!(intent = %intent, "Merged external patterns");
                    report.merged.push(code);
                }
                Err(reason) => report.reject(&code, reason),
            }
        }

        report
    }

    /// Validates the whole section before touching the entry so a bad one
    /// leaves no partial state behind.
    fn merge_spec(&mut self, intent: IntentCategory, spec: PatternSpec) -> std::result::Result<(), String> {
        if let Some(weight) = spec.weight {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(format!("weight must be a positive number, got {}", weight));
            }
        }

        let mut compiled = Vec::with_capacity(spec.patterns.len());
        for source in &spec.patterns {
            let pattern = CompiledPattern::new(source.as_str())
                .map_err(|e| format!("invalid pattern {:?}: {}", source, e))?;
            compiled.push(pattern);
        }

        let entry = self
            .entry_mut(intent)
            .ok_or_else(|| format!("intent {} missing from registry", intent))?;

        for keyword in spec.keywords.iter().map(|k| normalize(k)) {
            if !keyword.is_empty() && !entry.keywords.contains(&keyword) {
                entry.keywords.push(keyword);
            }
        }
        for pattern in compiled {
            if !entry.patterns.iter().any(|p| p.source() == pattern.source()) {
                entry.patterns.push(pattern);
            }
        }
        if let Some(weight) = spec.weight {
            entry.weight = weight;
        }

        Ok(())
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Parses an external resource into its top-level `code -> section` map.
pub fn parse_document(
    content: &str,
    format: PatternFormat,
) -> Result<BTreeMap<String, serde_json::Value>> {
    let parsed = match format {
        PatternFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        PatternFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| NlpError::pattern_config(format!("malformed pattern resource: {}", e)))
}

/// Engine-owned handle to the current registry snapshot.
#[derive(Debug)]
pub struct SharedRegistry {
    current: RwLock<Arc<PatternRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: PatternRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The registry as of now; unaffected by later replacements.
    pub fn snapshot(&self) -> Arc<PatternRegistry> {
        self.current.read().clone()
    }

    /// Publishes a fully built registry.
    pub fn replace(&self, registry: PatternRegistry) {
        let next = Arc::new(registry);
        *self.current.write() = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn document(json: &str) -> BTreeMap<String, serde_json::Value> {
        parse_document(json, PatternFormat::Json).unwrap()
    }

    #[test]
    fn test_defaults_follow_catalog_order() {
        let registry = PatternRegistry::defaults();
        let order: Vec<_> = registry.entries().map(|(intent, _)| intent).collect();
        let expected: Vec<_> = IntentCategory::ALL
            .iter()
            .copied()
            .filter(|i| *i != IntentCategory::Unknown)
            .collect();
        assert_eq!(order, expected);
        assert!(registry.get(IntentCategory::Unknown).is_none());
    }

    #[test]
    fn test_default_patterns_compile() {
        let registry = PatternRegistry::defaults();
        let compiled: usize = registry.entries().map(|(_, e)| e.patterns.len()).sum();
        let declared: usize = DEFAULT_RULES.iter().map(|(_, _, p)| p.len()).sum();
        assert_eq!(compiled, declared);
    }

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = CompiledPattern::new("销售额").unwrap();
        assert!(pattern.matches_fully("销售额"));
        assert!(!pattern.matches_fully("本月销售额"));
        assert_eq!(pattern.source(), "销售额");
    }

    #[test]
    fn test_merge_is_additive() {
        let mut registry = PatternRegistry::defaults();
        let before = registry.get(IntentCategory::QueryInventory).unwrap().keywords.len();

        let report = registry.merge_document(document(
            r#"{"QUERY_INVENTORY": {"keywords": ["库存", "Stock Level"], "patterns": [".*仓库.*"], "weight": 1.5}}"#,
        ));

        assert_eq!(report.merged, vec!["QUERY_INVENTORY".to_string()]);
        let entry = registry.get(IntentCategory::QueryInventory).unwrap();
        assert_eq!(entry.keywords.len(), before + 1);
        assert_eq!(entry.keywords[0], "库存");
        assert_eq!(entry.keywords.last().unwrap(), "stocklevel");
        assert_eq!(entry.patterns.last().unwrap().source(), ".*仓库.*");
        assert_eq!(entry.weight, 1.5);
    }

    #[test]
    fn test_invalid_regex_rejects_only_that_entry() {
        let mut registry = PatternRegistry::defaults();
        let report = registry.merge_document(document(
            r#"{
                "QUERY_COST": {"keywords": ["物料"], "patterns": ["(unclosed"]},
                "QUERY_PROFIT": {"keywords": ["净利润"]}
            }"#,
        ));

        assert_eq!(report.merged, vec!["QUERY_PROFIT".to_string()]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].code, "QUERY_COST");

        let cost = registry.get(IntentCategory::QueryCost).unwrap();
        assert!(!cost.keywords.contains(&"物料".to_string()));
        let profit = registry.get(IntentCategory::QueryProfit).unwrap();
        assert!(profit.keywords.contains(&"净利润".to_string()));
    }

    #[test]
    fn test_unknown_codes_and_bad_weights_rejected() {
        let mut registry = PatternRegistry::defaults();
        let report = registry.merge_document(document(
            r#"{
                "NOT_AN_INTENT": {"keywords": ["x"]},
                "UNKNOWN": {"keywords": ["y"]},
                "QUERY_COST": {"weight": -1},
                "QUERY_PROFIT": {"keywords": "not a list"}
            }"#,
        ));

        assert!(report.merged.is_empty());
        let codes: Vec<_> = report.rejected.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["NOT_AN_INTENT", "QUERY_COST", "QUERY_PROFIT", "UNKNOWN"]);
        assert_eq!(registry.get(IntentCategory::QueryCost).unwrap().weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn test_from_path_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "QUERY_RECEIVABLE:\n  keywords:\n    - 催款\n  patterns:\n    - '.*收款.*'\n"
        )
        .unwrap();

        let (registry, report) = PatternRegistry::from_path(file.path()).unwrap();
        assert_eq!(report.merged, vec!["QUERY_RECEIVABLE".to_string()]);
        let entry = registry.get(IntentCategory::QueryReceivable).unwrap();
        assert!(entry.keywords.contains(&"催款".to_string()));
        assert!(entry.patterns.iter().any(|p| p.source() == ".*收款.*"));
    }

    #[test]
    fn test_from_path_malformed_or_missing() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{ not json").unwrap();
        assert!(matches!(
            PatternRegistry::from_path(file.path()),
            Err(NlpError::PatternConfig(_))
        ));

        assert!(matches!(
            PatternRegistry::from_path("/nonexistent/patterns.json"),
            Err(NlpError::Io(_))
        ));
    }

    #[test]
    fn test_shared_registry_swap_keeps_old_snapshot() {
        let shared = SharedRegistry::new(PatternRegistry::defaults());
        let old = shared.snapshot();

        shared.replace(PatternRegistry::empty());

        assert!(!old.get(IntentCategory::QueryCost).unwrap().keywords.is_empty());
        assert!(shared.snapshot().get(IntentCategory::QueryCost).unwrap().keywords.is_empty());
    }
}
