//! Dimension-table population and the in-memory name→key lookups the fact
//! loaders resolve against.

use crate::columns::{self, ColumnKind};
use crate::db::models as dbm;
use crate::error::LoadError;
use crate::schema;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::info;
use std::collections::BTreeMap;

/// Read-only name→surrogate-key maps, built once after the dimension load
/// and passed by reference to the fact loaders. Zones are keyed by
/// [`columns::zone_key`] so lookups are case-insensitive.
#[derive(Debug)]
pub struct RefLookup {
    pub zones: BTreeMap<String, i32>,
    pub measurements: BTreeMap<String, i32>,
}

/// Derive the distinct zone names from the header, deduplicated
/// case-insensitively (first spelling wins) and sorted by key for
/// deterministic surrogate-key assignment. Every header must classify; a
/// column that fits no pattern aborts the load here, before any row work.
pub fn zone_names_from_headers(headers: &[String]) -> Result<Vec<String>, LoadError> {
    let mut names: BTreeMap<String, String> = BTreeMap::new();
    for header in headers {
        if let ColumnKind::Zone { zone, .. } = columns::classify(header)? {
            names.entry(columns::zone_key(&zone)).or_insert(zone);
        }
    }
    Ok(names.into_values().collect())
}

/// Populate the `zones` and `measurements` tables and build the lookups.
///
/// Zones are inserted in sorted-name order and measurements in catalog
/// order, so re-running against a fresh store assigns identical keys.
pub fn load_dimensions(conn: &mut SqliteConnection, headers: &[String]) -> Result<RefLookup, LoadError> {
    use schema::measurements::dsl as M;
    use schema::zones::dsl as Z;

    let zone_names = zone_names_from_headers(headers)?;
    info!(
        "Dimensions: {} zone(s) derived from header: {}",
        zone_names.len(),
        zone_names.join(", ")
    );

    conn.transaction::<_, LoadError, _>(|conn| {
        let zone_rows: Vec<dbm::NewZone> = zone_names
            .iter()
            .map(|name| dbm::NewZone { zone_name: name.clone() })
            .collect();
        diesel::insert_into(Z::zones).values(&zone_rows).execute(conn)?;

        let measurement_rows: Vec<dbm::NewMeasurement> = columns::ZONE_METRICS
            .iter()
            .map(|m| dbm::NewMeasurement {
                measurement_name: m.name.to_string(),
                unit: m.unit.to_string(),
            })
            .collect();
        diesel::insert_into(M::measurements)
            .values(&measurement_rows)
            .execute(conn)?;
        Ok(())
    })?;

    let zones = Z::zones
        .select(dbm::Zone::as_select())
        .load(conn)?
        .into_iter()
        .map(|z| (columns::zone_key(&z.zone_name), z.id))
        .collect::<BTreeMap<_, _>>();
    let measurements = M::measurements
        .select(dbm::Measurement::as_select())
        .load(conn)?
        .into_iter()
        .map(|m| (m.measurement_name, m.id))
        .collect::<BTreeMap<_, _>>();

    info!(
        "Dimensions: loaded {} zone(s), {} measurement(s)",
        zones.len(),
        measurements.len()
    );
    Ok(RefLookup { zones, measurements })
}

/// Re-run policy: abort with `StoreNotEmpty` naming the first populated
/// table, or truncate everything (facts before dimensions) when a reload was
/// requested. No silent upsert.
pub fn enforce_rerun_policy(conn: &mut SqliteConnection, reload: bool) -> Result<(), LoadError> {
    use schema::hourly_outdoor_readings::dsl as O;
    use schema::hourly_zone_readings::dsl as R;
    use schema::measurements::dsl as M;
    use schema::zones::dsl as Z;

    if reload {
        conn.transaction::<_, LoadError, _>(|conn| {
            let readings = diesel::delete(R::hourly_zone_readings).execute(conn)?;
            let outdoor = diesel::delete(O::hourly_outdoor_readings).execute(conn)?;
            let measurements = diesel::delete(M::measurements).execute(conn)?;
            let zones = diesel::delete(Z::zones).execute(conn)?;
            info!(
                "Reload: truncated store ({} zone reading(s), {} outdoor reading(s), {} measurement(s), {} zone(s))",
                readings, outdoor, measurements, zones
            );
            Ok(())
        })?;
        return Ok(());
    }

    let counts: [(&'static str, i64); 4] = [
        ("zones", Z::zones.count().get_result(conn)?),
        ("measurements", M::measurements.count().get_result(conn)?),
        (
            "hourly_outdoor_readings",
            O::hourly_outdoor_readings.count().get_result(conn)?,
        ),
        (
            "hourly_zone_readings",
            R::hourly_zone_readings.count().get_result(conn)?,
        ),
    ];
    for (table, rows) in counts {
        if rows > 0 {
            return Err(LoadError::StoreNotEmpty { table, rows });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::test_conn;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn derives_sorted_deduplicated_zone_names() {
        let h = headers(&["Timestamp", "Z2_temp", "Z1_temp", "Z1_RH", "Air_temperature"]);
        assert_eq!(zone_names_from_headers(&h).unwrap(), vec!["Z1", "Z2"]);
    }

    #[test]
    fn deduplicates_zone_spellings_case_insensitively() {
        let h = headers(&["Timestamp", "Z1_temp", "z1_RH"]);
        assert_eq!(zone_names_from_headers(&h).unwrap(), vec!["Z1"]);
    }

    #[test]
    fn rejects_header_with_unknown_column() {
        let h = headers(&["Timestamp", "Z1_temp", "mystery"]);
        assert!(matches!(
            zone_names_from_headers(&h).unwrap_err(),
            LoadError::UnknownColumnPattern { column } if column == "mystery"
        ));
    }

    #[test]
    fn key_assignment_is_deterministic_across_fresh_stores() {
        let h = headers(&["Timestamp", "Z10_temp", "Z2_temp", "Z12+13_CO2"]);
        let mut first = test_conn();
        let mut second = test_conn();
        let a = load_dimensions(&mut first, &h).unwrap();
        let b = load_dimensions(&mut second, &h).unwrap();
        assert_eq!(a.zones, b.zones);
        assert_eq!(a.measurements, b.measurements);
        // Sorted order, keys assigned in insert order starting at 1.
        assert_eq!(a.zones["Z10"], 1);
        assert_eq!(a.zones["Z12+13"], 2);
        assert_eq!(a.zones["Z2"], 3);
    }

    #[test]
    fn measurement_catalog_is_fully_loaded() {
        let mut conn = test_conn();
        let lookup = load_dimensions(&mut conn, &headers(&["Timestamp", "Z1_temp"])).unwrap();
        assert_eq!(lookup.measurements.len(), crate::columns::ZONE_METRICS.len());
        assert_eq!(lookup.measurements["temp"], 1);
        assert_eq!(lookup.measurements["Overheating_Risk"], 13);
    }

    #[test]
    fn second_load_aborts_unless_reload_requested() {
        let h = headers(&["Timestamp", "Z1_temp"]);
        let mut conn = test_conn();
        load_dimensions(&mut conn, &h).unwrap();

        assert!(matches!(
            enforce_rerun_policy(&mut conn, false).unwrap_err(),
            LoadError::StoreNotEmpty { table: "zones", .. }
        ));

        enforce_rerun_policy(&mut conn, true).unwrap();
        let lookup = load_dimensions(&mut conn, &h).unwrap();
        assert_eq!(lookup.zones.len(), 1);
    }
}
