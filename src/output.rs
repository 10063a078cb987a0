//! Output formatting for aggregation results.
//!
//! Supports pretty-printed JSON and CSV export of severity tables.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

use crate::analyzers::SeverityTable;
use csv::WriterBuilder;

/// Writes any result as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(mut writer: W, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes a [`SeverityTable`] to `path` as CSV, replacing any existing file.
///
/// The header row is the dimension name followed by the three severities.
pub fn write_table_csv(path: &str, table: &SeverityTable) -> Result<()> {
    debug!(path, rows = table.rows.len(), "Writing severity table CSV");

    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;

    writer.write_record([table.dimension.as_str(), "Fatal", "Serious", "Slight"])?;
    for row in &table.rows {
        writer.write_record([
            row.key.to_string(),
            row.fatal.to_string(),
            row.serious.to_string(),
            row.slight.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{GroupKey, SeverityRow};
    use std::env;
    use std::fs;
    use std::path::Path;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn table() -> SeverityTable {
        SeverityTable {
            dimension: "weekday_label".to_string(),
            normalized: false,
            rows: vec![
                SeverityRow {
                    key: GroupKey::Label("1 - Monday".to_string()),
                    fatal: 1,
                    serious: 0,
                    slight: 5,
                },
                SeverityRow {
                    key: GroupKey::Label("2 - Tuesday".to_string()),
                    fatal: 0,
                    serious: 2,
                    slight: 3,
                },
            ],
        }
    }

    #[test]
    fn test_write_json() {
        let mut buf = Vec::new();
        write_json(&mut buf, &table()).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["dimension"], "weekday_label");
        assert_eq!(parsed["rows"][0]["key"], "1 - Monday");
        assert_eq!(parsed["rows"][1]["serious"], 2);
        assert!(buf.ends_with(b"\n"));
    }

    #[test]
    fn test_write_table_csv_creates_file() {
        let path = temp_path("accidents_dashboard_test_table.csv");
        let _ = fs::remove_file(&path);

        write_table_csv(&path, &table()).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "weekday_label,Fatal,Serious,Slight");
        assert_eq!(lines[1], "1 - Monday,1,0,5");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_table_csv_replaces_existing() {
        let path = temp_path("accidents_dashboard_test_replace.csv");

        write_table_csv(&path, &table()).unwrap();
        write_table_csv(&path, &table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("Fatal")).count();
        assert_eq!(header_count, 1);

        fs::remove_file(&path).unwrap();
    }
}
