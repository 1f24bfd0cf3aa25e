//! Outdoor fact-table loader: one `hourly_outdoor_readings` row per source
//! row, copied verbatim from the house-global columns.

use crate::columns::{self, ColumnKind, OutdoorMetric};
use crate::dataset;
use crate::db::models::NewOutdoorReading;
use crate::error::LoadError;
use crate::schema;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::info;
use std::num::NonZeroUsize;

/// Column positions resolved from the header once, before any row work.
#[derive(Debug)]
pub struct OutdoorPlan {
    timestamp_index: usize,
    columns: Vec<(usize, OutdoorMetric)>,
}

impl OutdoorPlan {
    /// An outdoor metric absent from the header is tolerated (its database
    /// column stays NULL for every row); a missing timestamp is not.
    pub fn from_headers(headers: &[String]) -> Result<OutdoorPlan, LoadError> {
        let mut timestamp_index = None;
        let mut columns = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            match columns::classify(header)? {
                ColumnKind::Timestamp => timestamp_index = Some(index),
                ColumnKind::Outdoor(metric) => columns.push((index, metric)),
                ColumnKind::Zone { .. } => {}
            }
        }
        Ok(OutdoorPlan {
            timestamp_index: timestamp_index.ok_or(LoadError::TimestampColumnMissing)?,
            columns,
        })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn reading_for_row(&self, record: &csv::StringRecord, row: usize) -> Result<NewOutdoorReading, LoadError> {
        let raw_ts = record.get(self.timestamp_index).unwrap_or_default();
        let mut reading = NewOutdoorReading::new(dataset::parse_timestamp(raw_ts, row)?);
        for (index, metric) in &self.columns {
            let cell = record.get(*index).unwrap_or_default();
            let value = dataset::parse_value(cell, metric.header_name(), row)?;
            match metric {
                OutdoorMetric::Cooling => reading.cooling_kw = value,
                OutdoorMetric::Heating => reading.heating_kw = value,
                OutdoorMetric::AirTemperature => reading.air_temperature_c = value,
                OutdoorMetric::RelativeHumidity => reading.relative_humidity_pct = value,
                OutdoorMetric::WindSpeed => reading.wind_speed_ms = value,
                OutdoorMetric::Rain => reading.rain_mm = value,
                OutdoorMetric::SolarRadiation => reading.solar_radiation_wm2 = value,
                OutdoorMetric::Lighting => reading.lighting_lux = value,
                OutdoorMetric::DewPoint => reading.dew_point_c = value,
                OutdoorMetric::HeatIndex => reading.heat_index_c = value,
            }
        }
        Ok(reading)
    }
}

/// Stream the data rows and insert them in batches, all inside a single
/// transaction: the whole table's data lands or none of it does.
pub fn load(
    conn: &mut SqliteConnection,
    plan: &OutdoorPlan,
    records: impl Iterator<Item = csv::Result<csv::StringRecord>>,
    batch_size: NonZeroUsize,
) -> Result<usize, LoadError> {
    use schema::hourly_outdoor_readings::dsl as O;

    conn.transaction::<_, LoadError, _>(|conn| {
        let mut inserted = 0usize;
        let mut batch: Vec<NewOutdoorReading> = Vec::with_capacity(batch_size.get());
        for (i, record) in records.enumerate() {
            // Header is row 1; data rows start at 2.
            let row = i + 2;
            batch.push(plan.reading_for_row(&record?, row)?);
            if batch.len() >= batch_size.get() {
                inserted += diesel::insert_into(O::hourly_outdoor_readings)
                    .values(&batch)
                    .execute(conn)?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            inserted += diesel::insert_into(O::hourly_outdoor_readings)
                .values(&batch)
                .execute(conn)?;
        }
        info!("Outdoor: inserted {} reading(s)", inserted);
        Ok(inserted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::OutdoorReading;
    use crate::services::testing::{record, records, test_conn};
    use diesel::dsl::count_star;

    const BATCH: NonZeroUsize = NonZeroUsize::new(2).unwrap();

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plan_requires_timestamp_column() {
        assert!(matches!(
            OutdoorPlan::from_headers(&headers(&["Air_temperature"])).unwrap_err(),
            LoadError::TimestampColumnMissing
        ));
    }

    #[test]
    fn plan_ignores_zone_columns() {
        let plan = OutdoorPlan::from_headers(&headers(&["Timestamp", "Z1_temp", "Rain", "Cooling"])).unwrap();
        assert_eq!(plan.column_count(), 2);
    }

    #[test]
    fn one_source_row_yields_one_reading_and_no_zone_side_effects() {
        use crate::schema::hourly_outdoor_readings::dsl as O;
        use crate::schema::hourly_zone_readings::dsl as R;
        use crate::schema::zones::dsl as Z;

        let mut conn = test_conn();
        let plan = OutdoorPlan::from_headers(&headers(&["Timestamp", "Air_temperature", "Z1_temp"])).unwrap();
        let rows = [record(&["2023-06-15 12:00:00", "28.3", "24.1"])];
        let inserted = load(&mut conn, &plan, records(&rows), BATCH).unwrap();
        assert_eq!(inserted, 1);

        let stored: Vec<OutdoorReading> = O::hourly_outdoor_readings
            .select(OutdoorReading::as_select())
            .load(&mut conn)
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].air_temperature_c, Some(28.3));
        assert_eq!(stored[0].rain_mm, None);

        let zone_rows: i64 = Z::zones.select(count_star()).first(&mut conn).unwrap();
        let reading_rows: i64 = R::hourly_zone_readings.select(count_star()).first(&mut conn).unwrap();
        assert_eq!((zone_rows, reading_rows), (0, 0));
    }

    #[test]
    fn blank_outdoor_cells_become_null() {
        use crate::schema::hourly_outdoor_readings::dsl as O;

        let mut conn = test_conn();
        let plan = OutdoorPlan::from_headers(&headers(&["Timestamp", "Rain", "Wind_speed"])).unwrap();
        let rows = [
            record(&["2023-01-01 00:00:00", "", "0"]),
            record(&["2023-01-01 01:00:00", "1.2", "NaN"]),
            record(&["2023-01-01 02:00:00", "0.4", "3.1"]),
        ];
        assert_eq!(load(&mut conn, &plan, records(&rows), BATCH).unwrap(), 3);

        let stored: Vec<OutdoorReading> = O::hourly_outdoor_readings
            .select(OutdoorReading::as_select())
            .order(O::timestamp)
            .load(&mut conn)
            .unwrap();
        assert_eq!(stored[0].rain_mm, None);
        assert_eq!(stored[0].wind_speed_ms, Some(0.0));
        assert_eq!(stored[1].wind_speed_ms, None);
        assert_eq!(stored[2].rain_mm, Some(0.4));
    }

    #[test]
    fn timestamp_parse_failure_rolls_back_the_table() {
        use crate::schema::hourly_outdoor_readings::dsl as O;

        let mut conn = test_conn();
        let plan = OutdoorPlan::from_headers(&headers(&["Timestamp", "Rain"])).unwrap();
        let rows = [
            record(&["2023-01-01 00:00:00", "0.1"]),
            record(&["2023-01-01 01:00:00", "0.2"]),
            record(&["not-a-time", "0.3"]),
        ];
        match load(&mut conn, &plan, records(&rows), BATCH).unwrap_err() {
            LoadError::TimestampParse { row, value } => {
                assert_eq!(row, 4);
                assert_eq!(value, "not-a-time");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // The first batch was inserted inside the transaction and must be gone.
        let remaining: i64 = O::hourly_outdoor_readings
            .select(count_star())
            .first(&mut conn)
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
