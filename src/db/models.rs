//! Diesel model structs for the dimension and fact tables.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::zones)]
pub struct Zone {
    pub id: i32,
    pub zone_name: String,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::zones)]
pub struct NewZone {
    pub zone_name: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::measurements)]
pub struct Measurement {
    pub id: i32,
    pub measurement_name: String,
    pub unit: String,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::measurements)]
pub struct NewMeasurement {
    pub measurement_name: String,
    pub unit: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::hourly_outdoor_readings)]
pub struct OutdoorReading {
    pub id: i32,
    pub timestamp: NaiveDateTime,
    pub cooling_kw: Option<f64>,
    pub heating_kw: Option<f64>,
    pub air_temperature_c: Option<f64>,
    pub relative_humidity_pct: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub rain_mm: Option<f64>,
    pub solar_radiation_wm2: Option<f64>,
    pub lighting_lux: Option<f64>,
    pub dew_point_c: Option<f64>,
    pub heat_index_c: Option<f64>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::hourly_outdoor_readings)]
pub struct NewOutdoorReading {
    pub timestamp: NaiveDateTime,
    pub cooling_kw: Option<f64>,
    pub heating_kw: Option<f64>,
    pub air_temperature_c: Option<f64>,
    pub relative_humidity_pct: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub rain_mm: Option<f64>,
    pub solar_radiation_wm2: Option<f64>,
    pub lighting_lux: Option<f64>,
    pub dew_point_c: Option<f64>,
    pub heat_index_c: Option<f64>,
}

impl NewOutdoorReading {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        NewOutdoorReading {
            timestamp,
            cooling_kw: None,
            heating_kw: None,
            air_temperature_c: None,
            relative_humidity_pct: None,
            wind_speed_ms: None,
            rain_mm: None,
            solar_radiation_wm2: None,
            lighting_lux: None,
            dew_point_c: None,
            heat_index_c: None,
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::hourly_zone_readings)]
#[diesel(belongs_to(Zone))]
#[diesel(belongs_to(Measurement))]
pub struct ZoneReading {
    pub id: i32,
    pub timestamp: NaiveDateTime,
    pub zone_id: i32,
    pub measurement_id: i32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::hourly_zone_readings)]
pub struct NewZoneReading {
    pub timestamp: NaiveDateTime,
    pub zone_id: i32,
    pub measurement_id: i32,
    pub value: Option<f64>,
}
