//! Typed accident records, derived calendar fields and the in-memory table.
//!
//! The table is built once at startup and never mutated afterwards; every
//! query borrows it read-only.

use std::path::Path;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;
use tracing::{info, warn};

use crate::cleaner::clean_with_report;
use crate::error::LoadError;
use crate::loader::{RawAccident, load_files};

/// Accident severity as coded in `Accident_Severity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Fatal = 1,
    Serious = 2,
    Slight = 3,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Fatal, Severity::Serious, Severity::Slight];

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Severity::Fatal),
            2 => Some(Severity::Serious),
            3 => Some(Severity::Slight),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Fatal => "Fatal",
            Severity::Serious => "Serious",
            Severity::Slight => "Slight",
        }
    }
}

/// Area classification from `Urban_or_Rural_Area`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AreaType {
    Urban,
    Rural,
}

impl AreaType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(AreaType::Urban),
            2 => Some(AreaType::Rural),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AreaType::Urban => "Urban",
            AreaType::Rural => "Rural",
        }
    }
}

/// Weekday labels, prefixed so that lexical order matches calendar order.
pub const WEEKDAY_LABELS: [&str; 7] = [
    "1 - Monday",
    "2 - Tuesday",
    "3 - Wednesday",
    "4 - Thursday",
    "5 - Friday",
    "6 - Saturday",
    "7 - Sunday",
];

pub fn weekday_label(weekday: Weekday) -> &'static str {
    WEEKDAY_LABELS[weekday.num_days_from_monday() as usize]
}

/// A cleaned accident with its categorical fields decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccidentRecord {
    pub timestamp: NaiveDateTime,
    pub severity: Severity,
    pub area_type: AreaType,
    pub speed_limit: u32,
}

impl AccidentRecord {
    /// Decodes a cleaned row. Returns `None` when a field cannot be
    /// represented, which for cleaned input only happens for an
    /// out-of-range severity code.
    pub fn from_raw(raw: &RawAccident) -> Option<Self> {
        Some(Self {
            timestamp: raw.timestamp?,
            severity: Severity::from_code(raw.severity?)?,
            area_type: AreaType::from_code(raw.area_code?)?,
            speed_limit: u32::try_from(raw.speed_limit?).ok()?,
        })
    }
}

/// The analysis projection of one accident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureRow {
    pub severity: Severity,
    pub area_type: AreaType,
    pub speed_limit: u32,
    pub year: i32,
    pub month: u32,
    pub weekday_label: &'static str,
    pub hour: u32,
}

impl FeatureRow {
    pub fn derive(record: &AccidentRecord) -> Self {
        let ts = record.timestamp;
        Self {
            severity: record.severity,
            area_type: record.area_type,
            speed_limit: record.speed_limit,
            year: ts.year(),
            month: ts.month(),
            weekday_label: weekday_label(ts.weekday()),
            hour: ts.hour(),
        }
    }
}

/// Immutable table of feature rows shared by all queries.
#[derive(Debug, Clone, Default)]
pub struct AccidentTable {
    rows: Vec<FeatureRow>,
}

impl AccidentTable {
    /// Loads, cleans and derives the table from the source files.
    #[tracing::instrument(skip_all, fields(files = paths.len()))]
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, LoadError> {
        let raw = load_files(paths)?;
        let (cleaned, _report) = clean_with_report(raw);
        Ok(Self::build(&cleaned))
    }

    /// Derives the table from already-cleaned rows.
    pub fn build(cleaned: &[RawAccident]) -> Self {
        let mut skipped = 0usize;
        let rows: Vec<FeatureRow> = cleaned
            .iter()
            .filter_map(|raw| {
                let record = AccidentRecord::from_raw(raw);
                if record.is_none() {
                    skipped += 1;
                }
                record
            })
            .map(|record| FeatureRow::derive(&record))
            .collect();

        if skipped > 0 {
            warn!(skipped, "Rows with unrepresentable fields left out of the table");
        }
        info!(rows = rows.len(), "Accident table built");

        Self { rows }
    }

    pub fn from_records(records: &[AccidentRecord]) -> Self {
        Self {
            rows: records.iter().map(FeatureRow::derive).collect(),
        }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last year present, if any.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.rows.iter().map(|r| r.year).min()?;
        let max = self.rows.iter().map(|r| r.year).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_timestamp;

    fn raw(date: &str, time: &str, severity: i64, area_code: i64, speed_limit: i64) -> RawAccident {
        RawAccident {
            timestamp: parse_timestamp(date, time),
            time: Some(time.to_string()),
            latitude: Some(51.5),
            longitude: Some(-0.1),
            area_code: Some(area_code),
            speed_limit: Some(speed_limit),
            severity: Some(severity),
            fields: vec![date.to_string(), time.to_string()],
        }
    }

    #[test]
    fn test_weekday_labels_sort_in_calendar_order() {
        let mut sorted = WEEKDAY_LABELS;
        sorted.sort();
        assert_eq!(sorted, WEEKDAY_LABELS);
        assert_eq!(weekday_label(Weekday::Mon), "1 - Monday");
        assert_eq!(weekday_label(Weekday::Sun), "7 - Sunday");
    }

    #[test]
    fn test_derive_calendar_fields() {
        // 4 January 2005 was a Tuesday.
        let record = AccidentRecord::from_raw(&raw("04/01/2005", "17:42", 2, 1, 30)).unwrap();
        let row = FeatureRow::derive(&record);

        assert_eq!(row.year, 2005);
        assert_eq!(row.month, 1);
        assert_eq!(row.weekday_label, "2 - Tuesday");
        assert_eq!(row.hour, 17);
        assert_eq!(row.severity, Severity::Serious);
        assert_eq!(row.area_type, AreaType::Urban);
        assert_eq!(row.speed_limit, 30);
    }

    #[test]
    fn test_area_codes_map_to_labels() {
        assert_eq!(AreaType::from_code(1).map(AreaType::label), Some("Urban"));
        assert_eq!(AreaType::from_code(2).map(AreaType::label), Some("Rural"));
        assert_eq!(AreaType::from_code(3), None);
    }

    #[test]
    fn test_severity_codes() {
        for severity in Severity::ALL {
            assert_eq!(Severity::from_code(severity.code() as i64), Some(severity));
        }
        assert_eq!(Severity::from_code(0), None);
        assert_eq!(Severity::from_code(4), None);
    }

    #[test]
    fn test_build_skips_unknown_severity() {
        let table = AccidentTable::build(&[
            raw("04/01/2005", "17:42", 3, 1, 30),
            raw("05/01/2005", "08:00", 9, 2, 60),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].severity, Severity::Slight);
    }

    #[test]
    fn test_year_range() {
        let table = AccidentTable::build(&[
            raw("04/01/2005", "17:42", 3, 1, 30),
            raw("05/06/2014", "08:00", 1, 2, 60),
            raw("05/06/2009", "08:00", 1, 2, 60),
        ]);

        assert_eq!(table.year_range(), Some((2005, 2014)));
        assert_eq!(AccidentTable::default().year_range(), None);
        assert!(AccidentTable::default().is_empty());
    }
}
