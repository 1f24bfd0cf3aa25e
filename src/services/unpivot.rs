//! Wide-to-long unpivot of the zone columns into `hourly_zone_readings`.
//!
//! The header is resolved into an [`UnpivotPlan`] exactly once: each
//! `<Zone>_<Metric>` column becomes a plan entry carrying its column index
//! and the surrogate keys looked up from the dimension tables. Row
//! processing then never touches the store for resolution; each source row
//! is parsed once and lazily expanded into one fact row per plan entry.

use crate::columns::{self, ColumnKind};
use crate::dataset;
use crate::db::models::NewZoneReading;
use crate::error::LoadError;
use crate::schema;
use crate::services::refs::RefLookup;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::info;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

#[derive(Debug)]
struct PlanEntry {
    column_index: usize,
    column_name: String,
    zone_id: i32,
    measurement_id: i32,
}

/// Header positions and resolved surrogate keys for every (zone, metric)
/// column present in the source. Built once; immutable afterwards.
#[derive(Debug)]
pub struct UnpivotPlan {
    timestamp_index: usize,
    entries: Vec<PlanEntry>,
}

impl UnpivotPlan {
    pub fn from_headers(headers: &[String], refs: &RefLookup) -> Result<UnpivotPlan, LoadError> {
        let mut timestamp_index = None;
        let mut entries = Vec::new();
        // Guards against two source columns resolving to one fact cell.
        let mut seen: BTreeMap<(i32, i32), String> = BTreeMap::new();

        for (index, header) in headers.iter().enumerate() {
            match columns::classify(header)? {
                ColumnKind::Timestamp => timestamp_index = Some(index),
                ColumnKind::Outdoor(_) => {}
                ColumnKind::Zone { zone, metric } => {
                    // The lookup is derived from this same header, so a miss
                    // here is an engine bug, not bad input.
                    let zone_id =
                        *refs
                            .zones
                            .get(&columns::zone_key(&zone))
                            .ok_or(LoadError::ReferentialIntegrity {
                                kind: "zone",
                                name: zone.clone(),
                            })?;
                    let measurement_id =
                        *refs
                            .measurements
                            .get(metric.name)
                            .ok_or(LoadError::ReferentialIntegrity {
                                kind: "measurement",
                                name: metric.name.to_string(),
                            })?;
                    if let Some(previous) = seen.insert((zone_id, measurement_id), header.clone()) {
                        return Err(LoadError::AmbiguousColumnMapping {
                            column: header.clone(),
                            matches: vec![previous],
                        });
                    }
                    entries.push(PlanEntry {
                        column_index: index,
                        column_name: header.clone(),
                        zone_id,
                        measurement_id,
                    });
                }
            }
        }

        Ok(UnpivotPlan {
            timestamp_index: timestamp_index.ok_or(LoadError::TimestampColumnMissing)?,
            entries,
        })
    }

    /// Number of (zone, metric) columns present in the source, and therefore
    /// the number of fact rows emitted per timestamp.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn timestamp_for_row(&self, record: &csv::StringRecord, row: usize) -> Result<NaiveDateTime, LoadError> {
        dataset::parse_timestamp(record.get(self.timestamp_index).unwrap_or_default(), row)
    }

    /// Lazily emit the fact rows for one source row. Blank/NaN cells yield a
    /// row with a NULL value; only genuinely non-numeric cells error.
    fn row_readings<'a>(
        &'a self,
        timestamp: NaiveDateTime,
        record: &'a csv::StringRecord,
        row: usize,
    ) -> impl Iterator<Item = Result<NewZoneReading, LoadError>> + 'a {
        self.entries.iter().map(move |entry| {
            let cell = record.get(entry.column_index).unwrap_or_default();
            let value = dataset::parse_value(cell, &entry.column_name, row)?;
            Ok(NewZoneReading {
                timestamp,
                zone_id: entry.zone_id,
                measurement_id: entry.measurement_id,
                value,
            })
        })
    }
}

/// Stream the data rows through the plan and insert the long-format rows in
/// batches, all inside a single transaction.
pub fn load(
    conn: &mut SqliteConnection,
    plan: &UnpivotPlan,
    records: impl Iterator<Item = csv::Result<csv::StringRecord>>,
    batch_size: NonZeroUsize,
) -> Result<usize, LoadError> {
    use schema::hourly_zone_readings::dsl as R;

    conn.transaction::<_, LoadError, _>(|conn| {
        let mut inserted = 0usize;
        let mut batch: Vec<NewZoneReading> = Vec::with_capacity(batch_size.get());
        for (i, record) in records.enumerate() {
            let row = i + 2;
            let record = record?;
            let timestamp = plan.timestamp_for_row(&record, row)?;
            for reading in plan.row_readings(timestamp, &record, row) {
                batch.push(reading?);
                if batch.len() >= batch_size.get() {
                    inserted += diesel::insert_into(R::hourly_zone_readings)
                        .values(&batch)
                        .execute(conn)?;
                    batch.clear();
                }
            }
        }
        if !batch.is_empty() {
            inserted += diesel::insert_into(R::hourly_zone_readings)
                .values(&batch)
                .execute(conn)?;
        }
        info!(
            "Unpivot: inserted {} reading(s) across {} (zone, measurement) column(s)",
            inserted,
            plan.entry_count()
        );
        Ok(inserted)
    })
}
