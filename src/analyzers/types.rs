//! Data types used by the aggregation pipeline.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AggregateError;
use crate::features::Severity;

/// Calendar dimension for the stacked bar chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeDimension {
    Year,
    Month,
    Weekday,
    Hour,
}

impl TimeDimension {
    pub const ALL: [TimeDimension; 4] = [
        TimeDimension::Year,
        TimeDimension::Month,
        TimeDimension::Weekday,
        TimeDimension::Hour,
    ];

    /// Selector value, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            TimeDimension::Year => "Year",
            TimeDimension::Month => "Month",
            TimeDimension::Weekday => "weekday_label",
            TimeDimension::Hour => "Hour",
        }
    }

    /// Human-readable selector label.
    pub fn label(self) -> &'static str {
        match self {
            TimeDimension::Weekday => "Day",
            other => other.name(),
        }
    }
}

impl FromStr for TimeDimension {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Year" => Ok(TimeDimension::Year),
            "Month" => Ok(TimeDimension::Month),
            "weekday_label" | "Day" => Ok(TimeDimension::Weekday),
            "Hour" => Ok(TimeDimension::Hour),
            other => Err(AggregateError::InvalidDimension(other.to_string())),
        }
    }
}

/// Categorical dimension for the proportion (pie) charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryDimension {
    AreaType,
    SpeedLimit,
}

impl CategoryDimension {
    pub const ALL: [CategoryDimension; 2] =
        [CategoryDimension::AreaType, CategoryDimension::SpeedLimit];

    pub fn name(self) -> &'static str {
        match self {
            CategoryDimension::AreaType => "area_type",
            CategoryDimension::SpeedLimit => "speed_limit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryDimension::AreaType => "Urban or Rural",
            CategoryDimension::SpeedLimit => "Speed Limit",
        }
    }
}

impl FromStr for CategoryDimension {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "area_type" | "Urban_or_Rural_Area" => Ok(CategoryDimension::AreaType),
            "speed_limit" | "Speed_limit" => Ok(CategoryDimension::SpeedLimit),
            other => Err(AggregateError::InvalidDimension(other.to_string())),
        }
    }
}

/// Any selector value: a calendar dimension or a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Time(TimeDimension),
    Category(CategoryDimension),
}

impl FromStr for Dimension {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<TimeDimension>()
            .map(Dimension::Time)
            .or_else(|_| s.parse::<CategoryDimension>().map(Dimension::Category))
    }
}

/// Value of the grouping dimension for one output row.
///
/// Within one table every key uses the same variant, so the derived ordering
/// is numeric for numbers and lexical for labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Number(i64),
    Label(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Number(n) => write!(f, "{n}"),
            GroupKey::Label(s) => f.write_str(s),
        }
    }
}

/// Counts for one dimension value, one column per severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityRow {
    pub key: GroupKey,
    pub fatal: u64,
    pub serious: u64,
    pub slight: u64,
}

impl SeverityRow {
    pub fn empty(key: GroupKey) -> Self {
        Self {
            key,
            fatal: 0,
            serious: 0,
            slight: 0,
        }
    }

    pub fn count(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Fatal => self.fatal,
            Severity::Serious => self.serious,
            Severity::Slight => self.slight,
        }
    }

    pub(crate) fn count_mut(&mut self, severity: Severity) -> &mut u64 {
        match severity {
            Severity::Fatal => &mut self.fatal,
            Severity::Serious => &mut self.serious,
            Severity::Slight => &mut self.slight,
        }
    }

    pub fn total(&self) -> u64 {
        self.fatal + self.serious + self.slight
    }
}

/// Dense dimension × severity table, rows sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityTable {
    pub dimension: String,
    /// Whether counts were rescaled to an average-length month.
    pub normalized: bool,
    pub rows: Vec<SeverityRow>,
}

impl SeverityTable {
    pub fn keys(&self) -> Vec<GroupKey> {
        self.rows.iter().map(|r| r.key.clone()).collect()
    }

    pub fn column(&self, severity: Severity) -> Vec<u64> {
        self.rows.iter().map(|r| r.count(severity)).collect()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&SeverityRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(SeverityRow::total).sum()
    }
}

/// Category labels and counts for a single severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProportionSeries {
    pub severity: Severity,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl ProportionSeries {
    pub fn value_for(&self, label: &str) -> Option<u64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|idx| self.values[idx])
    }

    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }
}
