use core::fmt;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors that can occur while loading the wide-format dataset into the store.
///
/// All of these abort the load; insertion runs inside one transaction per
/// table, so the store is left either fully updated or untouched for that
/// table. Row numbers are as they appear in the source file (the header is
/// row 1).
#[derive(Debug)]
pub enum LoadError {
    /// The store already contains the tables but not our migration history.
    SchemaExists(String),
    /// The store already holds rows and RELOAD was not requested.
    StoreNotEmpty { table: &'static str, rows: i64 },
    /// A header could not be decomposed into a (zone, metric) pair and is
    /// not on the outdoor allowlist.
    UnknownColumnPattern { column: String },
    /// A header resolves to more than one (zone, metric) pair, or two
    /// headers resolve to the same pair.
    AmbiguousColumnMapping { column: String, matches: Vec<String> },
    /// The designated Timestamp column is missing from the header.
    TimestampColumnMissing,
    /// A timestamp cell did not match any accepted format.
    TimestampParse { row: usize, value: String },
    /// A non-blank cell that is not a number (blank/NaN become NULL instead).
    ValueParse { column: String, row: usize, value: String },
    /// A header names a zone or measurement absent from the dimension
    /// lookup. The lookup is built from the same header, so this indicates
    /// an engine bug.
    ReferentialIntegrity { kind: &'static str, name: String },
    Csv(csv::Error),
    Db(diesel::result::Error),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::SchemaExists(detail) => {
                write!(f, "schema already exists in the target store: {}", detail)
            }
            LoadError::StoreNotEmpty { table, rows } => write!(
                f,
                "table {} already holds {} row(s); set RELOAD=true to truncate and reload",
                table, rows
            ),
            LoadError::UnknownColumnPattern { column } => write!(
                f,
                "column \"{}\" matches neither <Zone>_<Metric> nor an outdoor metric",
                column
            ),
            LoadError::AmbiguousColumnMapping { column, matches } => write!(
                f,
                "column \"{}\" maps ambiguously: {}",
                column,
                matches.join(", ")
            ),
            LoadError::TimestampColumnMissing => {
                write!(f, "no Timestamp column found in the header")
            }
            LoadError::TimestampParse { row, value } => {
                write!(f, "row {}: unparseable timestamp \"{}\"", row, value)
            }
            LoadError::ValueParse { column, row, value } => {
                write!(f, "row {}, column \"{}\": unparseable value \"{}\"", row, column, value)
            }
            LoadError::ReferentialIntegrity { kind, name } => {
                write!(f, "{} \"{}\" missing from dimension lookup (engine bug)", kind, name)
            }
            LoadError::Csv(e) => write!(f, "csv error: {}", e),
            LoadError::Db(e) => write!(f, "database error: {}", e),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Csv(e) => Some(e),
            LoadError::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(value: csv::Error) -> Self {
        LoadError::Csv(value)
    }
}

impl From<diesel::result::Error> for LoadError {
    fn from(value: diesel::result::Error) -> Self {
        LoadError::Db(value)
    }
}
