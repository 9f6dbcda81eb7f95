//! Production CSV Import
//!
//! Reads monthly or daily production tables into [`ProductionPoint`] series
//! grouped by stream. Two layouts are detected from the header row:
//!
//! **Long layout:** one rate column plus an optional stream column, e.g.
//! `date,well,stream,rate`. Without a stream column every row belongs to the
//! default stream.
//!
//! **Wide layout:** one rate column per stream, e.g.
//! `date,oil_rate,gas_rate,water_rate`.
//!
//! Time comes from a days column when present, otherwise from a date column
//! (`YYYY-MM-DD` or RFC 3339) measured from the earliest date in the file.
//!
//! ```ignore
//! use dca_engine::import::{import_csv, ImportOptions};
//!
//! let import = import_csv("well_a.csv", &ImportOptions::from_global())?;
//! for (stream, points) in import.streams() {
//!     // fit each stream
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::types::{ProductionPoint, Stream};
use crate::units;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Parse errors logged per file before going quiet
const MAX_LOGGED_ERRORS: usize = 10;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Empty file: {0}")]
    Empty(String),

    #[error("Missing columns in {source_name}: {reason}")]
    MissingColumns { source_name: String, reason: String },

    #[error("No usable rows in {source_name}: {errors} errors, {skipped} skipped")]
    NoData {
        source_name: String,
        errors: usize,
        skipped: usize,
    },
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

// ============================================================================
// Options
// ============================================================================

/// Import behaviour
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Keep only rows for this well. When unset, the first well seen is used.
    pub well_id: Option<String>,
    /// Stream for long-layout files without a stream column
    pub default_stream: Stream,
    /// Unit of the rate values in the file
    pub rate_unit: Option<String>,
    /// Unit to convert rates into
    pub target_rate_unit: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            well_id: None,
            default_stream: Stream::Oil,
            rate_unit: None,
            target_rate_unit: None,
        }
    }
}

impl ImportOptions {
    /// Options with rate units from the global `[import]` config section
    pub fn from_global() -> Self {
        let cfg = &crate::config::get().import;
        Self {
            rate_unit: cfg.rate_unit.clone(),
            target_rate_unit: cfg.target_rate_unit.clone(),
            ..Self::default()
        }
    }

    fn convert_rate(&self, rate: f64) -> f64 {
        match (&self.rate_unit, &self.target_rate_unit) {
            (Some(from), Some(to)) => units::convert(rate, from, to),
            _ => rate,
        }
    }
}

// ============================================================================
// Column Mapping
// ============================================================================

/// Maps CSV column names to indices
#[derive(Debug, Clone, Default)]
struct ColumnMap {
    date: Option<usize>,
    days: Option<usize>,
    well: Option<usize>,
    stream: Option<usize>,
    rate: Option<usize>,
    /// Wide layout: per-stream rate columns
    stream_rates: Vec<(Stream, usize)>,
}

impl ColumnMap {
    fn from_header(header: &str) -> Self {
        let mut map = Self::default();

        for (idx, col) in csv_split(header).iter().enumerate() {
            let col_lower = col.trim().trim_start_matches('\u{feff}').to_lowercase();
            // "oil rate (bbl/d)" -> "oil_rate"
            let name = col_lower
                .split('(')
                .next()
                .unwrap_or("")
                .trim()
                .replace([' ', '-'], "_");

            match name.as_str() {
                "date" | "datetime" | "timestamp" | "production_date" => {
                    map.date.get_or_insert(idx);
                }
                "days" | "day" | "time_days" | "t" | "time" | "elapsed_days" => {
                    map.days.get_or_insert(idx);
                }
                "well" | "well_id" | "well_name" | "uwi" | "api" => {
                    map.well.get_or_insert(idx);
                }
                "stream" | "phase" | "fluid" | "product" => {
                    map.stream.get_or_insert(idx);
                }
                "rate" | "q" | "production" | "volume_rate" => {
                    map.rate.get_or_insert(idx);
                }
                "oil" | "oil_rate" | "qo" | "bopd" => map.push_stream_rate(Stream::Oil, idx),
                "gas" | "gas_rate" | "qg" | "mcfd" => map.push_stream_rate(Stream::Gas, idx),
                "water" | "water_rate" | "qw" | "bwpd" => map.push_stream_rate(Stream::Water, idx),
                _ => {}
            }
        }

        map
    }

    fn push_stream_rate(&mut self, stream: Stream, idx: usize) {
        if !self.stream_rates.iter().any(|(s, _)| *s == stream) {
            self.stream_rates.push((stream, idx));
        }
    }

    fn is_wide(&self) -> bool {
        self.rate.is_none() && !self.stream_rates.is_empty()
    }

    fn validate(&self) -> Result<(), String> {
        if self.date.is_none() && self.days.is_none() {
            return Err("need a date or days column".to_string());
        }
        if self.rate.is_none() && self.stream_rates.is_empty() {
            return Err("need a rate column or per-stream rate columns".to_string());
        }
        Ok(())
    }

    fn summary(&self) -> String {
        let mut found: Vec<String> = Vec::new();
        if self.date.is_some() {
            found.push("date".to_string());
        }
        if self.days.is_some() {
            found.push("days".to_string());
        }
        if self.well.is_some() {
            found.push("well".to_string());
        }
        if self.stream.is_some() {
            found.push("stream".to_string());
        }
        if self.rate.is_some() {
            found.push("rate".to_string());
        }
        found.extend(self.stream_rates.iter().map(|(s, _)| format!("{s}_rate")));

        let layout = if self.is_wide() { "wide" } else { "long" };
        format!("[{layout}] columns: [{}]", found.join(", "))
    }
}

// ============================================================================
// Row Parsing
// ============================================================================

/// Where a row sits in time before days are resolved
#[derive(Debug, Clone, Copy)]
enum RowTime {
    Days(f64),
    Date(DateTime<Utc>),
}

#[derive(Debug)]
struct RawRow {
    well: Option<String>,
    time: RowTime,
    rates: Vec<(Stream, f64)>,
}

/// Parse `YYYY-MM-DD`, RFC 3339, or `YYYY-MM-DD HH:MM:SS` (UTC).
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn field<'a>(fields: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| fields.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn parse_number(s: &str, column: &str) -> Result<f64, String> {
    s.replace('_', "")
        .parse::<f64>()
        .map_err(|_| format!("{column}: not a number '{s}'"))
}

/// `Ok(None)` means the row carries no rate and is skipped.
fn parse_row(
    line: &str,
    map: &ColumnMap,
    options: &ImportOptions,
) -> Result<Option<RawRow>, String> {
    let fields = csv_split(line);

    let time = match (field(&fields, map.days), field(&fields, map.date)) {
        (Some(days), _) => RowTime::Days(parse_number(days, "days")?),
        (None, Some(date)) => {
            RowTime::Date(parse_date(date).ok_or_else(|| format!("date: cannot parse '{date}'"))?)
        }
        (None, None) => return Ok(None),
    };

    let mut rates = Vec::new();
    if map.is_wide() {
        for &(stream, idx) in &map.stream_rates {
            if let Some(raw) = field(&fields, Some(idx)) {
                rates.push((stream, options.convert_rate(parse_number(raw, stream.as_str())?)));
            }
        }
    } else if let Some(raw) = field(&fields, map.rate) {
        let stream = match field(&fields, map.stream) {
            Some(s) => s.parse::<Stream>()?,
            None => options.default_stream,
        };
        rates.push((stream, options.convert_rate(parse_number(raw, "rate")?)));
    }

    if rates.is_empty() {
        return Ok(None);
    }

    Ok(Some(RawRow {
        well: field(&fields, map.well).map(str::to_string),
        time,
        rates,
    }))
}

// ============================================================================
// Import
// ============================================================================

/// Metadata about an imported file
#[derive(Debug, Clone, Serialize)]
pub struct ImportInfo {
    pub well_id: String,
    pub source: String,
    pub columns_found: String,
    /// Rows turned into at least one point
    pub rows_used: usize,
    /// Rows without a rate, or for another well
    pub skipped_rows: usize,
    /// Rows that failed to parse
    pub error_rows: usize,
    /// Earliest date in the file, the origin of `time_days`
    pub start_date: Option<DateTime<Utc>>,
}

/// Production series for one well, grouped by stream
#[derive(Debug, Clone)]
pub struct ProductionImport {
    pub points_by_stream: BTreeMap<Stream, Vec<ProductionPoint>>,
    pub info: ImportInfo,
}

impl ProductionImport {
    pub fn points(&self, stream: Stream) -> Option<&[ProductionPoint]> {
        self.points_by_stream.get(&stream).map(Vec::as_slice)
    }

    /// Owned `(stream, points)` pairs in stream order
    pub fn streams(&self) -> Vec<(Stream, Vec<ProductionPoint>)> {
        self.points_by_stream
            .iter()
            .map(|(s, p)| (*s, p.clone()))
            .collect()
    }
}

/// Import a production CSV file.
pub fn import_csv(
    path: impl AsRef<Path>,
    options: &ImportOptions,
) -> Result<ProductionImport, ImportError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Files without a well column are named after the well
    let stem = path.file_stem().and_then(|s| s.to_str()).map(str::to_string);
    read_csv(BufReader::new(file), &path.display().to_string(), options, stem)
}

/// Import production CSV text from any reader.
///
/// `source_name` is used in logs and errors only.
pub fn read_csv(
    reader: impl BufRead,
    source_name: &str,
    options: &ImportOptions,
    fallback_well_id: Option<String>,
) -> Result<ProductionImport, ImportError> {
    let mut lines = reader.lines();

    let header = lines
        .next()
        .ok_or_else(|| ImportError::Empty(source_name.to_string()))?
        .map_err(|source| ImportError::Io {
            path: PathBuf::from(source_name),
            source,
        })?;

    let map = ColumnMap::from_header(&header);
    map.validate().map_err(|reason| ImportError::MissingColumns {
        source_name: source_name.to_string(),
        reason,
    })?;
    let columns_found = map.summary();
    info!(source = %source_name, "{}", columns_found);

    let mut well_id = options.well_id.clone();
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    let mut errors = 0usize;

    for (line_idx, line_result) in lines.enumerate() {
        let line_num = line_idx + 2;
        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                warn!(line = line_num, error = %e, "Error reading line");
                errors += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_row(&line, &map, options) {
            Ok(Some(row)) => {
                if let Some(row_well) = &row.well {
                    match &well_id {
                        Some(wanted) if wanted != row_well => {
                            skipped += 1;
                            continue;
                        }
                        Some(_) => {}
                        None => well_id = Some(row_well.clone()),
                    }
                }
                rows.push(row);
            }
            Ok(None) => skipped += 1,
            Err(e) => {
                if errors < MAX_LOGGED_ERRORS {
                    warn!(line = line_num, error = %e, "Parse error");
                }
                errors += 1;
            }
        }
    }

    if rows.is_empty() {
        return Err(ImportError::NoData {
            source_name: source_name.to_string(),
            errors,
            skipped,
        });
    }

    let start_date = rows
        .iter()
        .filter_map(|r| match r.time {
            RowTime::Date(d) => Some(d),
            RowTime::Days(_) => None,
        })
        .min();

    let mut points_by_stream: BTreeMap<Stream, Vec<ProductionPoint>> = BTreeMap::new();
    for row in &rows {
        let point_for = |rate: f64| match (row.time, start_date) {
            (RowTime::Days(days), _) => ProductionPoint::new(days, rate),
            (RowTime::Date(date), Some(start)) => {
                let days = (date - start).num_seconds() as f64 / SECONDS_PER_DAY;
                ProductionPoint::with_date(days, rate, date)
            }
            (RowTime::Date(date), None) => ProductionPoint::with_date(0.0, rate, date),
        };
        for &(stream, rate) in &row.rates {
            points_by_stream.entry(stream).or_default().push(point_for(rate));
        }
    }

    let info = ImportInfo {
        well_id: well_id
            .or(fallback_well_id)
            .unwrap_or_else(|| "unknown".to_string()),
        source: source_name.to_string(),
        columns_found,
        rows_used: rows.len(),
        skipped_rows: skipped,
        error_rows: errors,
        start_date,
    };

    info!(
        well = %info.well_id,
        streams = points_by_stream.len(),
        rows = info.rows_used,
        skipped = info.skipped_rows,
        errors = info.error_rows,
        "Production data imported"
    );

    Ok(ProductionImport {
        points_by_stream,
        info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(text: &str, options: &ImportOptions) -> Result<ProductionImport, ImportError> {
        read_csv(Cursor::new(text), "test.csv", options, None)
    }

    #[test]
    fn test_csv_split_quotes() {
        assert_eq!(csv_split(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
        assert_eq!(csv_split(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(csv_split("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_header_detection_long() {
        let map = ColumnMap::from_header("Date,Well Name,Phase,Rate (bbl/d)");
        assert_eq!(map.date, Some(0));
        assert_eq!(map.well, Some(1));
        assert_eq!(map.stream, Some(2));
        assert_eq!(map.rate, Some(3));
        assert!(!map.is_wide());
    }

    #[test]
    fn test_header_detection_wide() {
        let map = ColumnMap::from_header("days,oil_rate,gas rate,Water");
        assert_eq!(map.days, Some(0));
        assert!(map.is_wide());
        assert_eq!(
            map.stream_rates,
            vec![(Stream::Oil, 1), (Stream::Gas, 2), (Stream::Water, 3)]
        );
    }

    #[test]
    fn test_days_column_default_stream() {
        let csv = "days,rate\n0,1000\n30,850\n60,730\n90,640\n";
        let import = read(csv, &ImportOptions::default()).unwrap();
        let oil = import.points(Stream::Oil).unwrap();
        assert_eq!(oil.len(), 4);
        assert_eq!(oil[1].time_days, 30.0);
        assert_eq!(oil[1].rate, 850.0);
        assert_eq!(import.info.well_id, "unknown");
    }

    #[test]
    fn test_dates_measured_from_earliest() {
        let csv = "date,rate\n2024-01-31,900\n2024-01-01,1000\n2024-03-01T00:00:00Z,800\n";
        let import = read(csv, &ImportOptions::default()).unwrap();
        let oil = import.points(Stream::Oil).unwrap();
        assert_eq!(oil[0].time_days, 30.0);
        assert_eq!(oil[1].time_days, 0.0);
        assert_eq!(oil[2].time_days, 60.0);
        assert!(oil.iter().all(|p| p.date.is_some()));
        assert_eq!(import.info.start_date, parse_date("2024-01-01"));
    }

    #[test]
    fn test_long_layout_streams_and_well_filter() {
        let csv = "\
well,stream,days,rate
A-1,oil,0,1000
A-1,gas,0,5000
B-2,oil,0,300
A-1,oil,30,900
A-1,gas,30,4500
";
        let import = read(csv, &ImportOptions::default()).unwrap();
        assert_eq!(import.info.well_id, "A-1");
        assert_eq!(import.points(Stream::Oil).unwrap().len(), 2);
        assert_eq!(import.points(Stream::Gas).unwrap().len(), 2);
        assert_eq!(import.info.skipped_rows, 1);

        let options = ImportOptions {
            well_id: Some("B-2".to_string()),
            ..ImportOptions::default()
        };
        let b = read(csv, &options).unwrap();
        assert_eq!(b.points(Stream::Oil).unwrap().len(), 1);
        assert!(b.points(Stream::Gas).is_none());
    }

    #[test]
    fn test_wide_layout_with_gaps() {
        let csv = "days,oil,gas,water\n0,1000,5000,\n30,900,,20\n60,800,4000,25\n";
        let import = read(csv, &ImportOptions::default()).unwrap();
        assert_eq!(import.points(Stream::Oil).unwrap().len(), 3);
        assert_eq!(import.points(Stream::Gas).unwrap().len(), 2);
        assert_eq!(import.points(Stream::Water).unwrap().len(), 2);
        assert_eq!(import.streams().len(), 3);
    }

    #[test]
    fn test_bad_rows_counted() {
        let csv = "days,rate\n0,1000\n30,abc\nxx,900\n60,\n90,640\n";
        let import = read(csv, &ImportOptions::default()).unwrap();
        assert_eq!(import.info.rows_used, 2);
        assert_eq!(import.info.error_rows, 2);
        assert_eq!(import.info.skipped_rows, 1);
    }

    #[test]
    fn test_rate_unit_conversion() {
        let options = ImportOptions {
            rate_unit: Some("m3/d".to_string()),
            target_rate_unit: Some("bbl/d".to_string()),
            ..ImportOptions::default()
        };
        let import = read("days,rate\n0,100\n", &options).unwrap();
        let rate = import.points(Stream::Oil).unwrap()[0].rate;
        assert!((rate - 628.981).abs() < 1e-2, "100 m3/d should be ~628.98 bbl/d, got {rate}");
    }

    #[test]
    fn test_missing_columns() {
        assert!(matches!(
            read("well,comment\nA,x\n", &ImportOptions::default()),
            Err(ImportError::MissingColumns { .. })
        ));
        assert!(matches!(
            read("", &ImportOptions::default()),
            Err(ImportError::Empty(_))
        ));
        assert!(matches!(
            read("days,rate\n0,\n", &ImportOptions::default()),
            Err(ImportError::NoData { skipped: 1, .. })
        ));
    }

    #[test]
    fn test_import_file_uses_file_stem_as_well() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("WELL-9.csv");
        std::fs::write(&path, "days,rate\n0,1000\n30,900\n").unwrap();
        let import = import_csv(&path, &ImportOptions::default()).unwrap();
        assert_eq!(import.info.well_id, "WELL-9");

        let missing = import_csv(dir.path().join("nope.csv"), &ImportOptions::default());
        assert!(matches!(missing, Err(ImportError::Io { .. })));
    }
}
