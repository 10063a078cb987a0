//! Plotly figure builders for the aggregation results.
//!
//! Figures are plain JSON (`data` traces plus `layout`) so the page script
//! can hand them straight to `Plotly.react`.

use serde_json::{Value, json};

use crate::analyzers::{ProportionSeries, SeverityTable};
use crate::features::Severity;

/// Bar trace stacking order, bottom first.
const BAR_ORDER: [Severity; 3] = [Severity::Slight, Severity::Serious, Severity::Fatal];

/// Horizontal domain and annotation anchor for each donut.
fn pie_slot(severity: Severity) -> ([f64; 2], f64) {
    match severity {
        Severity::Fatal => ([0.0, 0.33], 0.145),
        Severity::Serious => ([0.33, 0.67], 0.5),
        Severity::Slight => ([0.67, 1.0], 0.86),
    }
}

/// Stacked bar chart, one trace per severity.
pub fn bar_figure(table: &SeverityTable) -> Value {
    let x: Vec<Value> = table
        .keys()
        .into_iter()
        .map(|key| serde_json::to_value(key).unwrap_or(Value::Null))
        .collect();

    let data: Vec<Value> = BAR_ORDER
        .iter()
        .map(|&severity| {
            json!({
                "x": x,
                "y": table.column(severity),
                "type": "bar",
                "name": severity.label(),
            })
        })
        .collect();

    json!({
        "data": data,
        "layout": {
            "title": "Accidents per Time-unit",
            "barmode": "stack",
            "xaxis": { "title": table.dimension, "type": "category" },
        }
    })
}

/// Three donut charts side by side, one per severity.
pub fn pie_figure(series: &[ProportionSeries]) -> Value {
    let data: Vec<Value> = series
        .iter()
        .map(|s| {
            let (domain, _) = pie_slot(s.severity);
            json!({
                "values": s.values,
                "labels": s.labels,
                "domain": { "x": domain },
                "name": s.severity.label(),
                "hoverinfo": "label+percent",
                "hole": 0.4,
                "type": "pie",
            })
        })
        .collect();

    let annotations: Vec<Value> = series
        .iter()
        .map(|s| {
            let (_, x) = pie_slot(s.severity);
            json!({
                "font": { "size": 20 },
                "showarrow": false,
                "text": s.severity.label(),
                "x": x,
                "y": 0.5,
            })
        })
        .collect();

    json!({
        "data": data,
        "layout": {
            "title": "Accident Proportions",
            "annotations": annotations,
        }
    })
}
