//! Minimal runtime configuration helpers.
//! Defaults match the dataset layout used during development (CSV and
//! database file in the working directory).

use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "net_zero_house_data.db";
pub const DEFAULT_CSV_PATH: &str = "net_zero_house_hourly.csv";
// SQLite caps bind parameters per statement, so batches stay modest; this is
// a throughput knob, not a correctness one.
pub const DEFAULT_INSERT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(250).unwrap();

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path (Diesel treats the path as the URL).
    pub database_url: String,
    /// Wide-format source CSV.
    pub csv_path: PathBuf,
    /// Rows per batched INSERT within each fact-table transaction.
    pub insert_batch_size: NonZeroUsize,
    /// Truncate all four tables before loading instead of aborting when the
    /// store already holds data.
    pub reload: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let csv_path = std::env::var("CSV_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CSV_PATH));

        let insert_batch_size = match std::env::var("INSERT_BATCH_SIZE") {
            Ok(s) if !s.trim().is_empty() => s
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| "INSERT_BATCH_SIZE must be a positive integer".to_string())?,
            _ => DEFAULT_INSERT_BATCH_SIZE,
        };

        let reload = std::env::var("RELOAD")
            .ok()
            .map(|s| matches!(s.as_str(), "1" | "true" | "TRUE"))
            .unwrap_or(false);

        Ok(Config {
            database_url,
            csv_path,
            insert_batch_size,
            reload,
        })
    }
}
