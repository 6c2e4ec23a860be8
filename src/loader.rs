//! CSV booking dataset loader and the source-identity keyed cache.
//!
//! Expected CSV columns:
//!   hotel, arrival_date, year, month, season, occupancy_per_hari,
//!   is_holiday, is_event_day, is_canceled, adr, total_tamu, [Name]
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};

use crate::error::{ReportError, Result};
use crate::types::{BookingRecord, RawRow, NO_EVENT, REQUIRED_COLUMNS};
use crate::util::{
    parse_date_safe, parse_f64_safe, parse_flag_safe, parse_i32_safe, parse_u32_safe,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Rows whose event name was missing or blank and got the sentinel.
    pub events_filled: usize,
    /// `Name` was absent from the header and synthesized for every row.
    pub name_synthesized: bool,
}

/// The loaded, normalized booking table. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<BookingRecord>,
}

impl Dataset {
    pub fn new(records: Vec<BookingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[BookingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest arrival date.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.arrival_date).min()?;
        let max = self.records.iter().map(|r| r.arrival_date).max()?;
        Some((min, max))
    }

    /// Hotels in first-seen order.
    pub fn hotels(&self) -> Vec<String> {
        first_seen(self.records.iter().map(|r| r.hotel.as_str()))
    }

    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        set.into_iter().collect()
    }

    pub fn months(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = self.records.iter().map(|r| r.month).collect();
        set.into_iter().collect()
    }

    /// Seasons in first-seen order.
    pub fn seasons(&self) -> Vec<String> {
        first_seen(self.records.iter().map(|r| r.season.as_str()))
    }
}

fn first_seen<'r>(values: impl Iterator<Item = &'r str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}

/// Missing or blank names become the sentinel; everything else is trimmed.
pub fn normalize_event_name(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => NO_EVENT.to_string(),
    }
}

pub fn load_dataset(path: &Path) -> Result<(Dataset, LoadReport)> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ReportError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => ReportError::Io(e),
    })?;
    let (dataset, report) = load_from_reader(file)?;
    tracing::info!(
        path = %path.display(),
        rows = report.total_rows,
        events_filled = report.events_filled,
        "loaded booking dataset"
    );
    Ok((dataset, report))
}

pub fn load_from_reader<R: Read>(reader: R) -> Result<(Dataset, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(ReportError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    let name_synthesized = !headers.iter().any(|h| h.trim() == "Name");
    let headers = StringRecord::from(headers.iter().map(str::trim).collect::<Vec<_>>());

    let mut records = Vec::new();
    let mut events_filled = 0usize;
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let row: RawRow = record.deserialize(Some(&headers))?;
        let parsed = clean_row(row, line)?;
        if !parsed.1 {
            events_filled += 1;
        }
        records.push(parsed.0);
    }

    let report = LoadReport {
        total_rows: records.len(),
        events_filled,
        name_synthesized,
    };
    Ok((Dataset::new(records), report))
}

fn invalid(line: u64, column: &str, value: Option<&str>) -> ReportError {
    ReportError::InvalidValue {
        line,
        column: column.to_string(),
        value: value.unwrap_or_default().to_string(),
    }
}

/// Returns the record plus whether it carried a usable event name.
fn clean_row(row: RawRow, line: u64) -> Result<(BookingRecord, bool)> {
    macro_rules! field {
        ($parse:expr, $name:ident) => {
            $parse(row.$name.as_deref())
                .ok_or_else(|| invalid(line, stringify!($name), row.$name.as_deref()))?
        };
    }

    let arrival_date = field!(parse_date_safe, arrival_date);
    let year = field!(parse_i32_safe, year);
    let month = field!(parse_u32_safe, month);
    let occupancy_per_hari = field!(parse_f64_safe, occupancy_per_hari);
    let is_holiday = field!(parse_flag_safe, is_holiday);
    let is_event_day = field!(parse_flag_safe, is_event_day);
    let is_canceled = field!(parse_flag_safe, is_canceled);
    let adr = field!(parse_f64_safe, adr);
    let total_tamu = field!(parse_u32_safe, total_tamu);

    let hotel = row.hotel.as_deref().map(str::trim).unwrap_or_default();
    if hotel.is_empty() {
        return Err(invalid(line, "hotel", row.hotel.as_deref()));
    }
    let season = row.season.as_deref().map(str::trim).unwrap_or_default();
    if season.is_empty() {
        return Err(invalid(line, "season", row.season.as_deref()));
    }

    let name = normalize_event_name(row.name.as_deref());
    let had_name = row
        .name
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());

    let record = BookingRecord {
        hotel: hotel.to_string(),
        arrival_date,
        year,
        month,
        season: season.to_string(),
        occupancy_per_hari,
        is_holiday,
        is_event_day,
        is_canceled,
        adr,
        total_tamu,
        name,
    };
    Ok((record, had_name))
}

/// Identity of a source file: canonical path, modification time and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceIdentity {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ReportError::SourceNotFound {
                path: path.to_path_buf(),
            },
            _ => ReportError::Io(e),
        })?;
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            path: canonical,
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CachedLoad {
    pub dataset: Arc<Dataset>,
    pub report: LoadReport,
    pub hit: bool,
}

struct CacheEntry {
    identity: SourceIdentity,
    dataset: Arc<Dataset>,
    report: LoadReport,
}

/// Holds at most one dataset, reused while its source identity is unchanged.
#[derive(Default)]
pub struct DatasetCache {
    entry: Option<CacheEntry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<CachedLoad> {
        let identity = SourceIdentity::of(path)?;
        if let Some(entry) = &self.entry {
            if entry.identity == identity {
                tracing::debug!(path = %path.display(), "dataset cache hit");
                return Ok(CachedLoad {
                    dataset: Arc::clone(&entry.dataset),
                    report: entry.report.clone(),
                    hit: true,
                });
            }
            tracing::info!(path = %path.display(), "source changed, reloading dataset");
        }

        let (dataset, report) = load_dataset(path)?;
        let dataset = Arc::new(dataset);
        self.entry = Some(CacheEntry {
            identity,
            dataset: Arc::clone(&dataset),
            report: report.clone(),
        });
        Ok(CachedLoad {
            dataset,
            report,
            hit: false,
        })
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            tracing::debug!("dataset cache invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.entry.is_some()
    }
}
