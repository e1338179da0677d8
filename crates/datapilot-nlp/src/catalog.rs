//! Closed intent catalog.
//!
//! Declaration order in [`IntentCategory::ALL`] is the registry iteration order,
//! which is also the tie-break order when two candidates score the same.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Business area an intent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentGroup {
    Sales,
    Finance,
    Production,
    Quality,
    Comparison,
    Ranking,
    Report,
    System,
    Unknown,
}

impl IntentGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "SALES",
            Self::Finance => "FINANCE",
            Self::Production => "PRODUCTION",
            Self::Quality => "QUALITY",
            Self::Comparison => "COMPARISON",
            Self::Ranking => "RANKING",
            Self::Report => "REPORT",
            Self::System => "SYSTEM",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Supported intents for analytics questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentCategory {
    /// 销售额、营业额等总体情况
    QuerySalesOverview,
    /// 销售趋势与走势
    QuerySalesTrend,
    /// 销售排名
    QuerySalesRanking,
    /// 分产品销售
    QueryProductSales,
    /// 财务总体状况
    QueryFinanceOverview,
    /// 利润与毛利
    QueryProfit,
    /// 成本与费用
    QueryCost,
    /// 应收账款与回款
    QueryReceivable,
    /// 产量与生产进度
    QueryProductionOverview,
    /// 设备运行状态
    QueryEquipmentStatus,
    /// 库存
    QueryInventory,
    /// 质量总体指标
    QueryQualityOverview,
    /// 不良与缺陷
    QueryDefectAnalysis,
    /// 同比、环比
    ComparePeriod,
    /// 区域之间对比
    CompareRegion,
    /// 部门之间对比
    CompareDepartment,
    /// 员工业绩排名
    QueryEmployeeRanking,
    /// 生成报表
    GenerateReport,
    /// 导出数据
    ExportData,
    /// 使用帮助
    SystemHelp,
    /// No rule matched
    Unknown,
}

impl IntentCategory {
    /// Every intent in registry order, `Unknown` last.
    pub const ALL: [IntentCategory; 21] = [
        Self::QuerySalesOverview,
        Self::QuerySalesTrend,
        Self::QuerySalesRanking,
        Self::QueryProductSales,
        Self::QueryFinanceOverview,
        Self::QueryProfit,
        Self::QueryCost,
        Self::QueryReceivable,
        Self::QueryProductionOverview,
        Self::QueryEquipmentStatus,
        Self::QueryInventory,
        Self::QueryQualityOverview,
        Self::QueryDefectAnalysis,
        Self::ComparePeriod,
        Self::CompareRegion,
        Self::CompareDepartment,
        Self::QueryEmployeeRanking,
        Self::GenerateReport,
        Self::ExportData,
        Self::SystemHelp,
        Self::Unknown,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::QuerySalesOverview => "QUERY_SALES_OVERVIEW",
            Self::QuerySalesTrend => "QUERY_SALES_TREND",
            Self::QuerySalesRanking => "QUERY_SALES_RANKING",
            Self::QueryProductSales => "QUERY_PRODUCT_SALES",
            Self::QueryFinanceOverview => "QUERY_FINANCE_OVERVIEW",
            Self::QueryProfit => "QUERY_PROFIT",
            Self::QueryCost => "QUERY_COST",
            Self::QueryReceivable => "QUERY_RECEIVABLE",
            Self::QueryProductionOverview => "QUERY_PRODUCTION_OVERVIEW",
            Self::QueryEquipmentStatus => "QUERY_EQUIPMENT_STATUS",
            Self::QueryInventory => "QUERY_INVENTORY",
            Self::QueryQualityOverview => "QUERY_QUALITY_OVERVIEW",
            Self::QueryDefectAnalysis => "QUERY_DEFECT_ANALYSIS",
            Self::ComparePeriod => "COMPARE_PERIOD",
            Self::CompareRegion => "COMPARE_REGION",
            Self::CompareDepartment => "COMPARE_DEPARTMENT",
            Self::QueryEmployeeRanking => "QUERY_EMPLOYEE_RANKING",
            Self::GenerateReport => "GENERATE_REPORT",
            Self::ExportData => "EXPORT_DATA",
            Self::SystemHelp => "SYSTEM_HELP",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// 意图的中文名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::QuerySalesOverview => "销售概览",
            Self::QuerySalesTrend => "销售趋势",
            Self::QuerySalesRanking => "销售排名",
            Self::QueryProductSales => "产品销售",
            Self::QueryFinanceOverview => "财务概览",
            Self::QueryProfit => "利润分析",
            Self::QueryCost => "成本分析",
            Self::QueryReceivable => "应收回款",
            Self::QueryProductionOverview => "生产概况",
            Self::QueryEquipmentStatus => "设备状态",
            Self::QueryInventory => "库存查询",
            Self::QueryQualityOverview => "质量概况",
            Self::QueryDefectAnalysis => "不良分析",
            Self::ComparePeriod => "同期对比",
            Self::CompareRegion => "区域对比",
            Self::CompareDepartment => "部门对比",
            Self::QueryEmployeeRanking => "人员排名",
            Self::GenerateReport => "生成报表",
            Self::ExportData => "导出数据",
            Self::SystemHelp => "使用帮助",
            Self::Unknown => "未知意图",
        }
    }

    pub fn group(&self) -> IntentGroup {
        match self {
            Self::QuerySalesOverview | Self::QuerySalesTrend | Self::QueryProductSales => {
                IntentGroup::Sales
            }
            Self::QueryFinanceOverview
            | Self::QueryProfit
            | Self::QueryCost
            | Self::QueryReceivable => IntentGroup::Finance,
            Self::QueryProductionOverview | Self::QueryEquipmentStatus | Self::QueryInventory => {
                IntentGroup::Production
            }
            Self::QueryQualityOverview | Self::QueryDefectAnalysis => IntentGroup::Quality,
            Self::ComparePeriod | Self::CompareRegion | Self::CompareDepartment => {
                IntentGroup::Comparison
            }
            Self::QuerySalesRanking | Self::QueryEmployeeRanking => IntentGroup::Ranking,
            Self::GenerateReport | Self::ExportData => IntentGroup::Report,
            Self::SystemHelp => IntentGroup::System,
            Self::Unknown => IntentGroup::Unknown,
        }
    }

    /// Whether the intent asks for data (as opposed to an action or help).
    pub fn is_query_intent(&self) -> bool {
        !matches!(
            self.group(),
            IntentGroup::Report | IntentGroup::System | IntentGroup::Unknown
        )
    }

    pub fn is_ranking(&self) -> bool {
        self.group() == IntentGroup::Ranking
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|intent| intent.code() == code)
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Catalog entry handed to external classifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDescriptor {
    pub code: String,
    pub name: String,
    pub group: IntentGroup,
    pub is_query_intent: bool,
}

impl From<IntentCategory> for IntentDescriptor {
    fn from(intent: IntentCategory) -> Self {
        Self {
            code: intent.code().to_string(),
            name: intent.display_name().to_string(),
            group: intent.group(),
            is_query_intent: intent.is_query_intent(),
        }
    }
}

/// Returns every classifiable intent, `Unknown` excluded.
pub fn catalog() -> Vec<IntentDescriptor> {
    IntentCategory::ALL
        .iter()
        .filter(|intent| **intent != IntentCategory::Unknown)
        .map(|intent| IntentDescriptor::from(*intent))
        .collect()
}
