use std::collections::BTreeMap;

use tracing::debug;

use crate::analyzers::normalize::normalize_month_count;
use crate::analyzers::types::{
    CategoryDimension, GroupKey, ProportionSeries, SeverityRow, SeverityTable, TimeDimension,
};
use crate::error::AggregateError;
use crate::features::{AccidentTable, FeatureRow, Severity};

/// Groups the table by a named calendar dimension and severity.
///
/// Accepts `Year`, `Month`, `weekday_label` (or `Day`) and `Hour`.
///
/// # Errors
///
/// Returns [`AggregateError::InvalidDimension`] for any other name.
pub fn severity_by_dimension(
    table: &AccidentTable,
    dimension: &str,
) -> Result<SeverityTable, AggregateError> {
    let dimension: TimeDimension = dimension.parse()?;
    Ok(severity_by(table, dimension))
}

/// Dense dimension × severity counts. Rows are the observed dimension values
/// in ascending order; a missing combination counts as zero. Month counts
/// are rescaled to an average month length.
pub fn severity_by(table: &AccidentTable, dimension: TimeDimension) -> SeverityTable {
    let rows = match dimension {
        TimeDimension::Year => count_by(table.rows(), |row| GroupKey::Number(row.year.into())),
        TimeDimension::Month => normalized_month_rows(table.rows()),
        TimeDimension::Weekday => {
            count_by(table.rows(), |row| GroupKey::Label(row.weekday_label.to_string()))
        }
        TimeDimension::Hour => count_by(table.rows(), |row| GroupKey::Number(row.hour.into())),
    };

    let normalized = dimension == TimeDimension::Month;

    debug!(dimension = dimension.name(), groups = rows.len(), normalized, "Severity table computed");

    SeverityTable {
        dimension: dimension.name().to_string(),
        normalized,
        rows,
    }
}

/// Splits the table by a named category into one series per severity.
///
/// Accepts `area_type` (or `Urban_or_Rural_Area`) and `speed_limit` (or
/// `Speed_limit`).
///
/// # Errors
///
/// Returns [`AggregateError::InvalidDimension`] for any other name.
pub fn severity_proportions(
    table: &AccidentTable,
    category: &str,
) -> Result<Vec<ProportionSeries>, AggregateError> {
    let category: CategoryDimension = category.parse()?;
    Ok(proportions_by(table, category))
}

/// Fatal, Serious and Slight series over the same ordered category labels,
/// zero-filled where a category has no accidents of that severity.
pub fn proportions_by(table: &AccidentTable, category: CategoryDimension) -> Vec<ProportionSeries> {
    let rows = count_by(table.rows(), |row| category_key(category, row));
    let labels: Vec<String> = rows.iter().map(|r| r.key.to_string()).collect();

    Severity::ALL
        .iter()
        .map(|&severity| ProportionSeries {
            severity,
            labels: labels.clone(),
            values: rows.iter().map(|r| r.count(severity)).collect(),
        })
        .collect()
}

fn category_key(category: CategoryDimension, row: &FeatureRow) -> GroupKey {
    match category {
        CategoryDimension::AreaType => GroupKey::Label(row.area_type.label().to_string()),
        CategoryDimension::SpeedLimit => GroupKey::Number(row.speed_limit.into()),
    }
}

fn count_by<F>(rows: &[FeatureRow], key_of: F) -> Vec<SeverityRow>
where
    F: Fn(&FeatureRow) -> GroupKey,
{
    let mut groups: BTreeMap<GroupKey, SeverityRow> = BTreeMap::new();

    for row in rows {
        let key = key_of(row);
        let counts = groups
            .entry(key)
            .or_insert_with_key(|k| SeverityRow::empty(k.clone()));
        *counts.count_mut(row.severity) += 1;
    }

    groups.into_values().collect()
}

/// Counts keyed by calendar month, each rescaled to an average-length month.
fn normalized_month_rows(rows: &[FeatureRow]) -> Vec<SeverityRow> {
    let mut months: BTreeMap<u32, SeverityRow> = BTreeMap::new();

    for row in rows {
        let counts = months
            .entry(row.month)
            .or_insert_with(|| SeverityRow::empty(GroupKey::Number(row.month.into())));
        *counts.count_mut(row.severity) += 1;
    }

    months
        .into_iter()
        .map(|(month, mut counts)| {
            // Derived from a parsed date, so always 1..=12.
            debug_assert!((1..=12).contains(&month), "month {month} out of range");
            for severity in Severity::ALL {
                let count = counts.count_mut(severity);
                *count = normalize_month_count(*count, month).unwrap_or(*count);
            }
            counts
        })
        .collect()
}
