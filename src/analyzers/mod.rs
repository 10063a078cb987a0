//! Severity aggregation over the accident table.
//!
//! Groups feature rows by a selected dimension and accident severity into a
//! dense dimension × severity table, normalizing monthly counts for month
//! length where requested.

pub mod aggregate;
pub mod normalize;
pub mod types;

pub use aggregate::{proportions_by, severity_by, severity_by_dimension, severity_proportions};
pub use types::{
    CategoryDimension, Dimension, GroupKey, ProportionSeries, SeverityRow, SeverityTable,
    TimeDimension,
};
