//! Sources of raw `(week, tag, count)` rows.

use crate::error::{Result, TagcastError};
use crate::ingest::observation::{RawRecord, DEFAULT_COUNT_COLUMN, TAG_COLUMN, WEEK_COLUMN};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Anything that can hand over the raw table.
///
/// Warehouse clients live outside this crate; they implement this trait (or
/// fill a [`MemorySource`]) so the rest of the pipeline never sees them.
pub trait ObservationSource {
    /// Fetch every raw row. Called once per run.
    fn load(&self) -> Result<Vec<RawRecord>>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

/// Reads rows from a headed CSV file.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    count_column: String,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            count_column: DEFAULT_COUNT_COLUMN.to_string(),
        }
    }

    /// Use a different header for the count column.
    pub fn with_count_column(mut self, column: impl Into<String>) -> Self {
        self.count_column = column.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse CSV text from any reader.
    pub fn read_from<R: std::io::Read>(&self, reader: R) -> Result<Vec<RawRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TagcastError::MissingColumn {
                    column: name.to_string(),
                })
        };
        let week_idx = column(WEEK_COLUMN)?;
        let tag_idx = column(TAG_COLUMN)?;
        let count_idx = column(&self.count_column)?;

        let mut records = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result?;
            // Physical line, so blank lines and quoted newlines are counted.
            let line = record
                .position()
                .map_or(i + 2, |p| usize::try_from(p.line()).unwrap_or(usize::MAX));
            let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
            records.push(
                RawRecord::new(line, field(week_idx), field(tag_idx), field(count_idx))
                    .with_count_column(self.count_column.clone()),
            );
        }

        debug!(rows = records.len(), "parsed csv rows");
        Ok(records)
    }
}

impl ObservationSource for CsvSource {
    fn load(&self) -> Result<Vec<RawRecord>> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            TagcastError::Io(format!("failed to open {}: {e}", self.path.display()))
        })?;
        let records = self.read_from(std::io::BufReader::new(file))?;
        info!(path = %self.path.display(), rows = records.len(), "loaded raw table");
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("csv file {}", self.path.display())
    }
}

/// Rows already held in memory, e.g. a query result fetched elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<RawRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    /// Build from `(week, tag, count)` text triples, numbering rows from 1.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>) -> Self {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, (week, tag, count))| RawRecord::new(i + 1, week, tag, count))
            .collect();
        Self { records }
    }
}

impl ObservationSource for MemorySource {
    fn load(&self) -> Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory rows", self.records.len())
    }
}
