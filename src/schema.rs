//! Handwritten Diesel schema declarations used by model structs.
//!
//! The embedded migration defines the actual tables and constraints. This
//! module only provides `diesel::table!` declarations so we can derive
//! Insertable/Queryable in a type-safe way without running
//! `diesel print-schema`.

diesel::table! {
    zones (id) {
        id -> Integer,
        zone_name -> Text,
    }
}

diesel::table! {
    measurements (id) {
        id -> Integer,
        measurement_name -> Text,
        unit -> Text,
    }
}

diesel::table! {
    hourly_outdoor_readings (id) {
        id -> Integer,
        timestamp -> Timestamp,
        cooling_kw -> Nullable<Double>,
        heating_kw -> Nullable<Double>,
        air_temperature_c -> Nullable<Double>,
        relative_humidity_pct -> Nullable<Double>,
        wind_speed_ms -> Nullable<Double>,
        rain_mm -> Nullable<Double>,
        solar_radiation_wm2 -> Nullable<Double>,
        lighting_lux -> Nullable<Double>,
        dew_point_c -> Nullable<Double>,
        heat_index_c -> Nullable<Double>,
    }
}

diesel::table! {
    hourly_zone_readings (id) {
        id -> Integer,
        timestamp -> Timestamp,
        zone_id -> Integer,
        measurement_id -> Integer,
        value -> Nullable<Double>,
    }
}

diesel::joinable!(hourly_zone_readings -> zones (zone_id));
diesel::joinable!(hourly_zone_readings -> measurements (measurement_id));

diesel::allow_tables_to_appear_in_same_query!(
    zones,
    measurements,
    hourly_outdoor_readings,
    hourly_zone_readings,
);
