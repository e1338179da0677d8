//! Named-entity extraction over closed vocabularies.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vocabulary an entity is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Department,
    Region,
    Metric,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Department, Self::Region, Self::Metric];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::Region => "region",
            Self::Metric => "metric",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "department" => Ok(Self::Department),
            "region" => Ok(Self::Region),
            "metric" => Ok(Self::Metric),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

lazy_static! {
    static ref DEPARTMENT_REGEX: Regex =
        Regex::new(r"销售部|财务部|生产部|质量部|采购部|市场部|研发部|人事部|物流部|仓储部").unwrap();
    static ref REGION_REGEX: Regex = Regex::new(r"华东|华南|华北|华中|西南|西北|东北").unwrap();
    // Longer names precede their prefixes so 毛利率 is not cut to 毛利.
    pub(crate) static ref METRIC_REGEX: Regex = Regex::new(
        r"销售额|营业额|利润率|利润|毛利率|毛利|成本|收入|产量|良品率|不良率|合格率|库存|订单量|回款"
    )
    .unwrap();
}

/// Extracts department, region and metric names.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// All non-overlapping matches of one vocabulary, in order of appearance.
    pub fn extract(&self, query: &str, kind: EntityKind) -> Vec<String> {
        let regex: &Regex = match kind {
            EntityKind::Department => &*DEPARTMENT_REGEX,
            EntityKind::Region => &*REGION_REGEX,
            EntityKind::Metric => &*METRIC_REGEX,
        };
        regex
            .find_iter(query)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Departments, then regions, then metrics, exact duplicates removed.
    pub fn extract_all(&self, query: &str) -> Vec<String> {
        let mut entities: Vec<String> = Vec::new();
        for kind in EntityKind::ALL {
            for value in self.extract(query, kind) {
                if !entities.contains(&value) {
                    entities.push(value);
                }
            }
        }
        entities
    }
}
