//! CSV access and cell-level parsing.
//!
//! The dataset is read in independent streaming passes (one for the outdoor
//! loader, one for the unpivot engine) so the whole file never has to sit in
//! memory; only the header is retained.

use crate::error::LoadError;
use chrono::NaiveDateTime;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Accepted timestamp formats, tried in order. The first is the canonical
/// storage format; the others cover common spreadsheet exports.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

pub struct Dataset {
    path: PathBuf,
    headers: Vec<String>,
}

impl Dataset {
    /// Open the file and read the header row. Row data is not touched here.
    pub fn open(path: &Path) -> Result<Dataset, LoadError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        Ok(Dataset {
            path: path.to_path_buf(),
            headers,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// A fresh pass over the data rows. Each caller gets its own reader, so
    /// passes are independently restartable.
    pub fn records(&self) -> Result<csv::StringRecordsIntoIter<File>, LoadError> {
        Ok(csv::Reader::from_path(&self.path)?.into_records())
    }
}

/// Parse a timestamp cell into its canonical form. `row` is the source file
/// row number (header = row 1), used only for error reporting.
pub fn parse_timestamp(value: &str, row: usize) -> Result<NaiveDateTime, LoadError> {
    let trimmed = value.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }
    Err(LoadError::TimestampParse {
        row,
        value: value.to_string(),
    })
}

/// Parse a measurement cell. Blank and NaN-ish cells become NULL; anything
/// else must be numeric. Zero is a value, not a NULL.
pub fn parse_value(value: &str, column: &str, row: usize) -> Result<Option<f64>, LoadError> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("null")
    {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| LoadError::ValueParse {
            column: column.to_string(),
            row,
            value: value.to_string(),
        })
}
