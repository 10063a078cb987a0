//! Row-level cleaning of the raw accident rows.
//!
//! Every step is a row predicate or a set operation, so applying [`clean`]
//! to its own output removes nothing further.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use crate::loader::RawAccident;

/// Smallest speed limit kept in the table.
pub const MIN_SPEED_LIMIT: i64 = 20;

/// Counts of what each cleaning step removed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub dropped_missing: usize,
    pub dropped_duplicate: usize,
    pub dropped_filter: usize,
    pub kept: usize,
}

/// Cleans the rows, discarding the report.
pub fn clean(records: Vec<RawAccident>) -> Vec<RawAccident> {
    clean_with_report(records).0
}

/// Drops rows missing a location or time, removes exact duplicates (first
/// occurrence wins) and keeps urban/rural rows at or above
/// [`MIN_SPEED_LIMIT`]. Survivor order is preserved.
pub fn clean_with_report(records: Vec<RawAccident>) -> (Vec<RawAccident>, CleaningReport) {
    let mut report = CleaningReport {
        input_rows: records.len(),
        ..Default::default()
    };

    // Duplicate detection borrows the row text; nothing is cloned.
    let keep: Vec<bool> = {
        let mut seen: HashSet<&[String]> = HashSet::with_capacity(records.len());
        let keep: Vec<bool> = records
            .iter()
            .map(|record| {
                if !has_required_fields(record) {
                    report.dropped_missing += 1;
                    false
                } else if !seen.insert(record.fields.as_slice()) {
                    report.dropped_duplicate += 1;
                    false
                } else if !passes_filters(record) {
                    report.dropped_filter += 1;
                    false
                } else {
                    true
                }
            })
            .collect();
        keep
    };

    let kept: Vec<RawAccident> = records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect();

    report.kept = kept.len();
    info!(
        input_rows = report.input_rows,
        dropped_missing = report.dropped_missing,
        dropped_duplicate = report.dropped_duplicate,
        dropped_filter = report.dropped_filter,
        kept = report.kept,
        "Accident rows cleaned"
    );

    (kept, report)
}

fn has_required_fields(record: &RawAccident) -> bool {
    record.latitude.is_some()
        && record.longitude.is_some()
        && record.time.is_some()
        && record.timestamp.is_some()
}

fn passes_filters(record: &RawAccident) -> bool {
    matches!(record.area_code, Some(1 | 2))
        && record.speed_limit.is_some_and(|limit| limit >= MIN_SPEED_LIMIT)
}
