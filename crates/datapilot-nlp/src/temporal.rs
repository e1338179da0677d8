//! Temporal expression parsing.
//!
//! An ordered table of (regex, expression kind) rules is scanned against the
//! normalized query; the first rule whose regex matches anywhere is resolved
//! against a single "today" captured by the caller. If that resolution fails
//! the scan stops there and the caller's default is returned.

use chrono::{Datelike, Days, Local, Months, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Source of the current instant.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: NaiveDateTime,
}

impl FixedClock {
    pub fn new(instant: NaiveDateTime) -> Self {
        Self { instant }
    }

    /// Midnight at the start of `date`.
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.instant
    }
}

/// Coarsest calendar unit a range was expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Quarter => "QUARTER",
            Self::Year => "YEAR",
        }
    }
}

/// A resolved, inclusive date interval. `start_date <= end_date` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
    granularity: Granularity,
    expression: String,
    relative: bool,
}

#[derive(Deserialize)]
struct RawDateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
    granularity: Granularity,
    expression: String,
    relative: bool,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = String;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start_date, raw.end_date, raw.granularity, raw.expression, raw.relative)
            .ok_or_else(|| format!("start_date {} is after end_date {}", raw.start_date, raw.end_date))
    }
}

impl DateRange {
    /// Returns `None` when `start_date > end_date`.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        granularity: Granularity,
        expression: impl Into<String>,
        relative: bool,
    ) -> Option<Self> {
        if start_date > end_date {
            return None;
        }
        Some(Self {
            start_date,
            end_date,
            granularity,
            expression: expression.into(),
            relative,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// The text that produced this range.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Kind of temporal expression a rule recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeExpression {
    AbsoluteDate,
    IsoDate,
    AbsoluteMonth,
    AbsoluteYear,
    LastNDays,
    LastNWeeks,
    LastNMonths,
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    LastQuarter,
    Quarter(u32),
    ThisYear,
    LastYear,
}

impl TimeExpression {
    fn granularity(&self) -> Granularity {
        match self {
            Self::AbsoluteDate | Self::IsoDate | Self::LastNDays | Self::Today | Self::Yesterday => {
                Granularity::Day
            }
            Self::LastNWeeks | Self::ThisWeek | Self::LastWeek => Granularity::Week,
            Self::AbsoluteMonth | Self::LastNMonths | Self::ThisMonth | Self::LastMonth => {
                Granularity::Month
            }
            Self::ThisQuarter | Self::LastQuarter | Self::Quarter(_) => Granularity::Quarter,
            Self::AbsoluteYear | Self::ThisYear | Self::LastYear => Granularity::Year,
        }
    }

    fn is_relative(&self) -> bool {
        !matches!(
            self,
            Self::AbsoluteDate | Self::IsoDate | Self::AbsoluteMonth | Self::AbsoluteYear
        )
    }
}

struct TimeRule {
    regex: Regex,
    expression: TimeExpression,
}

fn rule(pattern: &str, expression: TimeExpression) -> TimeRule {
    TimeRule {
        regex: Regex::new(pattern).unwrap(),
        expression,
    }
}

lazy_static! {
    /// Priority-ordered rules; more specific forms come first.
    ///
    /// Absolute forms outrank quarters and relative words, so `2024年第一季度`
    /// resolves to the whole of 2024 rather than its first quarter.
    static ref TIME_RULES: Vec<TimeRule> = vec![
        rule(r"(\d{4})年(\d{1,2})月(\d{1,2})[日号]", TimeExpression::AbsoluteDate),
        rule(r"(\d{4})-(\d{1,2})-(\d{1,2})", TimeExpression::IsoDate),
        rule(r"(\d{4})年(\d{1,2})月", TimeExpression::AbsoluteMonth),
        rule(r"(\d{4})年", TimeExpression::AbsoluteYear),
        rule(r"(?:最近|过去|近)(\d+)(?:天|日)|(\d+)天内", TimeExpression::LastNDays),
        rule(r"(?:最近|过去|近)(\d+)(?:周|个星期|个礼拜)|(\d+)周内", TimeExpression::LastNWeeks),
        rule(r"(?:最近|过去|近)(\d+)个?月|(\d+)个月内", TimeExpression::LastNMonths),
        rule(r"今天|今日", TimeExpression::Today),
        rule(r"昨天|昨日", TimeExpression::Yesterday),
        rule(r"本周|这周|本星期|这个星期", TimeExpression::ThisWeek),
        rule(r"上周|上星期|上个星期", TimeExpression::LastWeek),
        rule(r"本月|这个月|当月", TimeExpression::ThisMonth),
        rule(r"上月|上个月", TimeExpression::LastMonth),
        rule(r"本季度|这个季度|本季", TimeExpression::ThisQuarter),
        rule(r"上季度|上个季度|上季", TimeExpression::LastQuarter),
        rule(r"第一季度|一季度|q1", TimeExpression::Quarter(1)),
        rule(r"第二季度|二季度|q2", TimeExpression::Quarter(2)),
        rule(r"第三季度|三季度|q3", TimeExpression::Quarter(3)),
        rule(r"第四季度|四季度|q4", TimeExpression::Quarter(4)),
        rule(r"今年|本年度|本年", TimeExpression::ThisYear),
        rule(r"去年|上一年|上年", TimeExpression::LastYear),
    ];
}

/// Converts temporal expressions into concrete [`DateRange`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalParser;

impl TemporalParser {
    pub fn new() -> Self {
        Self
    }

    /// Resolves the highest-priority expression in `normalized` relative to `today`.
    ///
    /// Returns `default` when no rule matches, and also when the first matching
    /// rule captures an impossible date (lower-priority rules are not retried).
    pub fn parse(
        &self,
        normalized: &str,
        today: NaiveDate,
        default: Option<DateRange>,
    ) -> Option<DateRange> {
        let Some((rule, caps)) = TIME_RULES
            .iter()
            .find_map(|rule| rule.regex.captures(normalized).map(|caps| (rule, caps)))
        else {
            trace!("No temporal expression found");
            return default;
        };

        let expression = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let resolved = resolve(rule.expression, &caps, today).and_then(|(start, end)| {
            DateRange::new(
                start,
                end,
                rule.expression.granularity(),
                expression,
                rule.expression.is_relative(),
            )
        });

        match resolved {
            Some(range) => {
                debug!(
                    "Resolved {:?} '{}' to {}..{}",
                    rule.expression, expression, range.start_date, range.end_date
                );
                Some(range)
            }
            None => {
                debug!("Could not resolve {:?} '{}'", rule.expression, expression);
                default
            }
        }
    }
}

fn resolve(
    expression: TimeExpression,
    caps: &Captures<'_>,
    today: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    match expression {
        TimeExpression::AbsoluteDate | TimeExpression::IsoDate => {
            let date = NaiveDate::from_ymd_opt(
                capture_number(caps, 1)?,
                capture_number(caps, 2)?,
                capture_number(caps, 3)?,
            )?;
            Some((date, date))
        }
        TimeExpression::AbsoluteMonth => {
            month_bounds(capture_number(caps, 1)?, capture_number(caps, 2)?)
        }
        TimeExpression::AbsoluteYear => year_bounds(capture_number(caps, 1)?),
        TimeExpression::LastNDays => {
            let n = first_number(caps)?;
            Some((today.checked_sub_days(Days::new(n))?, today))
        }
        TimeExpression::LastNWeeks => {
            let n = first_number(caps)?.checked_mul(7)?;
            Some((today.checked_sub_days(Days::new(n))?, today))
        }
        TimeExpression::LastNMonths => {
            let n = u32::try_from(first_number(caps)?).ok()?;
            Some((today.checked_sub_months(Months::new(n))?, today))
        }
        TimeExpression::Today => Some((today, today)),
        TimeExpression::Yesterday => {
            let yesterday = today.pred_opt()?;
            Some((yesterday, yesterday))
        }
        TimeExpression::ThisWeek => {
            let monday = week_start(today)?;
            Some((monday, monday.checked_add_days(Days::new(6))?))
        }
        TimeExpression::LastWeek => {
            let monday = week_start(today)?;
            Some((
                monday.checked_sub_days(Days::new(7))?,
                monday.checked_sub_days(Days::new(1))?,
            ))
        }
        TimeExpression::ThisMonth => month_bounds(today.year(), today.month()),
        TimeExpression::LastMonth => {
            let previous = today.checked_sub_months(Months::new(1))?;
            month_bounds(previous.year(), previous.month())
        }
        TimeExpression::ThisQuarter => quarter_bounds(today.year(), quarter_of(today.month())),
        TimeExpression::LastQuarter => match quarter_of(today.month()) {
            1 => quarter_bounds(today.year() - 1, 4),
            quarter => quarter_bounds(today.year(), quarter - 1),
        },
        TimeExpression::Quarter(quarter) => quarter_bounds(today.year(), quarter),
        TimeExpression::ThisYear => year_bounds(today.year()),
        TimeExpression::LastYear => year_bounds(today.year() - 1),
    }
}

fn capture_number<T: std::str::FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

/// First participating capture group, for rules with alternative spellings.
fn first_number(caps: &Captures<'_>) -> Option<u64> {
    caps.iter()
        .skip(1)
        .flatten()
        .next()?
        .as_str()
        .parse()
        .ok()
}

fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

fn quarter_bounds(year: i32, quarter: u32) -> Option<(NaiveDate, NaiveDate)> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    let (first, _) = month_bounds(year, (quarter - 1) * 3 + 1)?;
    let (_, last) = month_bounds(year, quarter * 3)?;
    Some((first, last))
}

fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}
