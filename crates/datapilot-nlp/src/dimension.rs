//! Grouping-dimension detection.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis a question asks to group results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Department,
    Region,
    Product,
    Person,
    Time,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::Region => "region",
            Self::Product => "product",
            Self::Person => "person",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

lazy_static! {
    /// Registration order decides which dimension wins.
    static ref DIMENSION_RULES: Vec<(Regex, Dimension)> = vec![
        (
            Regex::new(r"(按|分|各|每个|哪个)个?部门|部门(分布|维度|排名|汇总)").unwrap(),
            Dimension::Department,
        ),
        (
            Regex::new(r"(按|分|各|每个|哪个)个?(区域|地区|大区|省份|城市)|(区域|地区)(分布|维度|排名|汇总)").unwrap(),
            Dimension::Region,
        ),
        (
            Regex::new(r"(按|分|各|每个|哪个)个?(产品|品类|型号|sku)|产品(分布|维度|排名|汇总)").unwrap(),
            Dimension::Product,
        ),
        (
            Regex::new(r"(按|分|各|每个|哪个)个?(人|员工|销售员|业务员)|(员工|人员|个人)(排名|业绩)").unwrap(),
            Dimension::Person,
        ),
        (
            Regex::new(r"(按|分)(天|日|周|月|季度|年)|(逐|每)(日|天|月)|(日|月|年)度?趋势").unwrap(),
            Dimension::Time,
        ),
    ];
}

/// Detects grouping dimensions in a normalized query.
#[derive(Debug, Clone, Copy, Default)]
pub struct DimensionParser;

impl DimensionParser {
    pub fn new() -> Self {
        Self
    }

    /// First registered dimension found anywhere in the query.
    pub fn parse(&self, normalized: &str) -> Option<Dimension> {
        DIMENSION_RULES
            .iter()
            .find(|(regex, _)| regex.is_match(normalized))
            .map(|(_, dimension)| *dimension)
    }

    /// Every matching dimension, in registration order.
    pub fn parse_all(&self, normalized: &str) -> Vec<Dimension> {
        DIMENSION_RULES
            .iter()
            .filter(|(regex, _)| regex.is_match(normalized))
            .map(|(_, dimension)| *dimension)
            .collect()
    }
}
