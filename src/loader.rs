//! CSV loader for the accident source files.
//!
//! Every file is read with a flexible reader: short rows, stray columns and
//! values that fail to parse are kept as absent fields instead of aborting the
//! load. Only an unreadable file or a missing required column is fatal.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ByteRecord, ReaderBuilder};
use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::LoadError;

/// Columns every source file must carry.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Date",
    "Time",
    "Latitude",
    "Longitude",
    "Urban_or_Rural_Area",
    "Speed_limit",
    "Accident_Severity",
];

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// One accident row as read from disk, before cleaning.
///
/// `fields` holds the complete row text and is what duplicate detection
/// compares; the typed fields are parsed views of the required columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAccident {
    pub timestamp: Option<NaiveDateTime>,
    pub time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub area_code: Option<i64>,
    pub speed_limit: Option<i64>,
    pub severity: Option<i64>,
    pub fields: Vec<String>,
}

/// Positions of the required columns within one file's header.
struct ColumnIndex {
    date: usize,
    time: usize,
    latitude: usize,
    longitude: usize,
    area_code: usize,
    speed_limit: usize,
    severity: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &[String], source_name: &str) -> Result<Self, LoadError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| LoadError::MissingColumn {
                    source_name: source_name.to_string(),
                    column,
                })
        };

        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = find(column)?;
        }
        let [date, time, latitude, longitude, area_code, speed_limit, severity] = positions;

        Ok(Self {
            date,
            time,
            latitude,
            longitude,
            area_code,
            speed_limit,
            severity,
        })
    }

    fn parse_row(&self, fields: Vec<String>) -> RawAccident {
        let get = |idx: usize| fields.get(idx).map(|s| s.trim()).filter(|s| !s.is_empty());

        let time = get(self.time).map(str::to_string);
        let timestamp = match (get(self.date), time.as_deref()) {
            (Some(date), Some(time)) => parse_timestamp(date, time),
            _ => None,
        };

        RawAccident {
            timestamp,
            latitude: get(self.latitude).and_then(parse_float),
            longitude: get(self.longitude).and_then(parse_float),
            area_code: get(self.area_code).and_then(parse_int),
            speed_limit: get(self.speed_limit).and_then(parse_int),
            severity: get(self.severity).and_then(parse_int),
            time,
            fields,
        }
    }
}

/// Combines a `dd/mm/yyyy` date and an `HH:MM` time into one timestamp.
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let combined = format!("{} {}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&combined, TIMESTAMP_FORMAT).ok()
}

fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts both `30` and `30.0`; anything with a fractional part is absent.
fn parse_int(s: &str) -> Option<i64> {
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let v = parse_float(s)?;
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// Loads and concatenates the source files in order, then orders the result
/// by timestamp. Rows without a timestamp sort last.
///
/// # Errors
///
/// Fails if no paths are given, a file cannot be opened or read, or a file
/// lacks one of [`REQUIRED_COLUMNS`].
#[tracing::instrument(skip_all, fields(files = paths.len()))]
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RawAccident>, LoadError> {
    if paths.is_empty() {
        return Err(LoadError::NoFiles);
    }

    let mut records = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let rows = load_file(path)?;
        info!(path = %path.display(), rows = rows.len(), "Loaded accident file");
        records.extend(rows);
    }

    sort_by_timestamp(&mut records);
    info!(total = records.len(), "Accident files concatenated");
    Ok(records)
}

/// Reads one source file. Paths ending in `.gz` are decompressed on the fly.
pub fn load_file(path: &Path) -> Result<Vec<RawAccident>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source_name = path.display().to_string();

    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        read_records(GzDecoder::new(file), &source_name)
    } else {
        read_records(file, &source_name)
    }
}

/// Reads a single in-memory source and orders it by timestamp.
pub fn load_reader<R: Read>(reader: R, source_name: &str) -> Result<Vec<RawAccident>, LoadError> {
    let mut records = read_records(reader, source_name)?;
    sort_by_timestamp(&mut records);
    Ok(records)
}

fn read_records<R: Read>(reader: R, source_name: &str) -> Result<Vec<RawAccident>, LoadError> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        source_name: source_name.to_string(),
        source,
    };

    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = to_strings(rdr.byte_headers().map_err(csv_err)?);
    let columns = ColumnIndex::from_headers(&headers, source_name)?;

    let mut records = Vec::new();
    let mut without_timestamp = 0usize;
    let mut row = ByteRecord::new();

    while rdr.read_byte_record(&mut row).map_err(csv_err)? {
        let record = columns.parse_row(to_strings(&row));
        if record.timestamp.is_none() {
            without_timestamp += 1;
        }
        records.push(record);
    }

    if without_timestamp > 0 {
        debug!(source = source_name, without_timestamp, "Rows with unparsable date/time");
    }

    Ok(records)
}

fn to_strings(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

fn sort_by_timestamp(records: &mut [RawAccident]) {
    records.sort_by_key(|r| (r.timestamp.is_none(), r.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    const HEADER: &str =
        "Accident_Index,Longitude,Latitude,Accident_Severity,Date,Time,Speed_limit,Urban_or_Rural_Area";

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for row in rows {
            s.push('\n');
            s.push_str(row);
        }
        s
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("04/01/2005", "17:42").unwrap();
        assert_eq!(ts.year(), 2005);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 4);
        assert_eq!(ts.hour(), 17);
        assert_eq!(ts.minute(), 42);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("2005-01-04", "17:42").is_none());
        assert!(parse_timestamp("31/02/2005", "10:00").is_none());
        assert!(parse_timestamp("04/01/2005", "25:00").is_none());
    }

    #[test]
    fn test_parse_int_accepts_float_text() {
        assert_eq!(parse_int("30"), Some(30));
        assert_eq!(parse_int("30.0"), Some(30));
        assert_eq!(parse_int("30.5"), None);
        assert_eq!(parse_int("NA"), None);
    }

    #[test]
    fn test_load_reader_parses_required_fields() {
        let data = sample(&["200501BS00001,-0.19,51.48,2,04/01/2005,17:42,30,1"]);
        let records = load_reader(data.as_bytes(), "inline").unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.severity, Some(2));
        assert_eq!(r.speed_limit, Some(30));
        assert_eq!(r.area_code, Some(1));
        assert_eq!(r.latitude, Some(51.48));
        assert_eq!(r.longitude, Some(-0.19));
        assert_eq!(r.time.as_deref(), Some("17:42"));
        assert!(r.timestamp.is_some());
        assert_eq!(r.fields.len(), 8);
    }

    #[test]
    fn test_load_reader_tolerates_malformed_values() {
        let data = sample(&[
            "A,-0.19,,2,04/01/2005,,thirty,1",
            "B,-0.19,51.48",
        ]);
        let records = load_reader(data.as_bytes(), "inline").unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.timestamp.is_none()));
        assert!(records.iter().all(|r| r.latitude.is_none() || r.severity.is_none()));
        assert!(records.iter().any(|r| r.speed_limit.is_none() && r.area_code == Some(1)));
    }

    #[test]
    fn test_load_reader_orders_by_timestamp() {
        let data = sample(&[
            "late,-0.19,51.48,3,05/01/2005,09:00,30,1",
            "none,-0.19,51.48,3,,09:00,30,1",
            "early,-0.19,51.48,3,04/01/2005,09:00,30,1",
        ]);
        let records = load_reader(data.as_bytes(), "inline").unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.fields[0].as_str()).collect();
        assert_eq!(ids, vec!["early", "late", "none"]);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let data = "Date,Time,Latitude\n04/01/2005,17:42,51.48";
        let err = load_reader(data.as_bytes(), "inline").unwrap_err();

        match err {
            LoadError::MissingColumn { column, .. } => assert_eq!(column, "Longitude"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_each_required_column_is_checked() {
        let headers: Vec<String> = HEADER.split(',').map(str::to_string).collect();

        for column in REQUIRED_COLUMNS {
            let without: Vec<String> = headers.iter().filter(|h| *h != column).cloned().collect();
            match ColumnIndex::from_headers(&without, "inline") {
                Err(LoadError::MissingColumn { column: missing, .. }) => assert_eq!(missing, column),
                _ => panic!("expected {column} to be reported missing"),
            }
        }

        let index = ColumnIndex::from_headers(&headers, "inline").unwrap();
        assert_eq!((index.longitude, index.latitude, index.date), (1, 2, 4));
        assert_eq!((index.severity, index.speed_limit, index.area_code), (3, 6, 7));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = temp_path("accidents_dashboard_does_not_exist.csv");
        let _ = fs::remove_file(&path);

        let err = load_files(&[path]).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_no_files_is_an_error() {
        let paths: [&str; 0] = [];
        assert!(matches!(load_files(&paths), Err(LoadError::NoFiles)));
    }

    #[test]
    fn test_load_files_concatenates_and_reads_gzip() {
        let plain = temp_path("accidents_dashboard_loader_plain.csv");
        let gz = temp_path("accidents_dashboard_loader_gz.csv.gz");

        fs::write(&plain, sample(&["p,-0.19,51.48,3,06/01/2005,08:00,30,1"])).unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(sample(&["g,-0.19,51.48,1,03/01/2005,08:00,60,2"]).as_bytes())
            .unwrap();
        fs::write(&gz, encoder.finish().unwrap()).unwrap();

        let records = load_files(&[plain.as_str(), gz.as_str()]).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.fields[0].as_str()).collect();
        assert_eq!(ids, vec!["g", "p"]);

        fs::remove_file(&plain).unwrap();
        fs::remove_file(&gz).unwrap();
    }
}
