//! Shared helpers for service tests.

use crate::MIGRATIONS;
use diesel::prelude::*;
use diesel::SqliteConnection;
use diesel_migrations::MigrationHarness;

/// A fresh in-memory store with the embedded migrations applied and foreign
/// keys enforced, mirroring the runtime connection setup.
pub fn test_conn() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:").expect("in-memory sqlite");
    conn.run_pending_migrations(MIGRATIONS).expect("apply migrations");
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .expect("enable foreign keys");
    conn
}

/// Build a data record in header order.
pub fn record(cells: &[&str]) -> csv::StringRecord {
    csv::StringRecord::from(cells.to_vec())
}

/// Wrap records the way `csv::Reader::into_records` yields them.
pub fn records(rows: &[csv::StringRecord]) -> impl Iterator<Item = csv::Result<csv::StringRecord>> {
    rows.to_vec().into_iter().map(Ok)
}
