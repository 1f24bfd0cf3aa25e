//! Header classification for the wide-format dataset.
//!
//! Every column is either the timestamp, an outdoor (house-global) metric, or
//! a `<Zone>_<Metric>` pair where `<Metric>` comes from a fixed catalog.
//! Anything else is a hard error; the loader refuses datasets whose shape it
//! does not understand.

use crate::error::LoadError;

pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// A zone-scoped metric and the unit it is stored with.
#[derive(Debug, PartialEq, Eq)]
pub struct ZoneMetric {
    pub name: &'static str,
    pub unit: &'static str,
}

/// Fixed catalog of per-zone metrics, in surrogate-key order.
///
/// Metric names may themselves contain underscores, so zone decomposition
/// matches against these suffixes rather than splitting at the first `_`.
pub const ZONE_METRICS: &[ZoneMetric] = &[
    ZoneMetric { name: "temp", unit: "C" },
    ZoneMetric { name: "RH", unit: "%" },
    ZoneMetric { name: "CO2", unit: "ppm" },
    ZoneMetric { name: "valve_opening", unit: "%" },
    ZoneMetric { name: "window_opening", unit: "%" },
    ZoneMetric { name: "dew_point", unit: "C" },
    ZoneMetric { name: "temp_diff", unit: "C" },
    ZoneMetric { name: "RH_diff", unit: "%" },
    ZoneMetric { name: "Heat_Index", unit: "C" },
    ZoneMetric { name: "CO2_AQI", unit: "AQI" },
    ZoneMetric { name: "Condensation_Risk", unit: "Risk Level" },
    ZoneMetric { name: "Comfortable_Humidity", unit: "Binary (0/1)" },
    ZoneMetric { name: "Overheating_Risk", unit: "Risk Level" },
];

/// House-global columns copied verbatim into `hourly_outdoor_readings`.
///
/// Checked before zone decomposition so that e.g. `Outdoor_Heat_Index` never
/// parses as zone "Outdoor".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutdoorMetric {
    Cooling,
    Heating,
    AirTemperature,
    RelativeHumidity,
    WindSpeed,
    Rain,
    SolarRadiation,
    Lighting,
    DewPoint,
    HeatIndex,
}

impl OutdoorMetric {
    pub const ALL: &[OutdoorMetric] = &[
        OutdoorMetric::Cooling,
        OutdoorMetric::Heating,
        OutdoorMetric::AirTemperature,
        OutdoorMetric::RelativeHumidity,
        OutdoorMetric::WindSpeed,
        OutdoorMetric::Rain,
        OutdoorMetric::SolarRadiation,
        OutdoorMetric::Lighting,
        OutdoorMetric::DewPoint,
        OutdoorMetric::HeatIndex,
    ];

    /// The column name as it appears in the source header.
    pub fn header_name(&self) -> &'static str {
        match self {
            OutdoorMetric::Cooling => "Cooling",
            OutdoorMetric::Heating => "Heating",
            OutdoorMetric::AirTemperature => "Air_temperature",
            OutdoorMetric::RelativeHumidity => "Relative_humidity",
            OutdoorMetric::WindSpeed => "Wind_speed",
            OutdoorMetric::Rain => "Rain",
            OutdoorMetric::SolarRadiation => "Solar_radiation",
            OutdoorMetric::Lighting => "Lighting",
            OutdoorMetric::DewPoint => "outdoor_dew_point",
            OutdoorMetric::HeatIndex => "Outdoor_Heat_Index",
        }
    }

    fn from_header(name: &str) -> Option<OutdoorMetric> {
        OutdoorMetric::ALL
            .iter()
            .copied()
            .find(|m| name.eq_ignore_ascii_case(m.header_name()))
    }
}

/// Canonical lookup key for a zone name. Matching is case-insensitive, so
/// differently-cased spellings of one zone must share a key.
pub fn zone_key(zone: &str) -> String {
    zone.trim().to_ascii_uppercase()
}

/// Tagged classification of a single header.
#[derive(Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Timestamp,
    Outdoor(OutdoorMetric),
    Zone {
        zone: String,
        metric: &'static ZoneMetric,
    },
}

/// Classify one header, normalized by trimming and matched
/// ASCII-case-insensitively. Unknown and ambiguous headers are fatal.
pub fn classify(header: &str) -> Result<ColumnKind, LoadError> {
    let name = header.trim();
    if name.eq_ignore_ascii_case(TIMESTAMP_COLUMN) {
        return Ok(ColumnKind::Timestamp);
    }
    if let Some(metric) = OutdoorMetric::from_header(name) {
        return Ok(ColumnKind::Outdoor(metric));
    }

    let mut candidates: Vec<(String, &'static ZoneMetric)> = Vec::new();
    for metric in ZONE_METRICS {
        // "<zone>_<metric>": the metric is a suffix, the zone is whatever
        // precedes the separating underscore (zone names may contain '+').
        if name.len() <= metric.name.len() + 1 {
            continue;
        }
        let split = name.len() - metric.name.len();
        if !name.is_char_boundary(split) {
            continue;
        }
        let (prefix, suffix) = name.split_at(split);
        if suffix.eq_ignore_ascii_case(metric.name)
            && let Some(zone) = prefix.strip_suffix('_')
            && !zone.is_empty()
        {
            candidates.push((zone.to_string(), metric));
        }
    }

    match candidates.len() {
        0 => Err(LoadError::UnknownColumnPattern {
            column: name.to_string(),
        }),
        1 => {
            let (zone, metric) = candidates.remove(0);
            Ok(ColumnKind::Zone { zone, metric })
        }
        _ => Err(LoadError::AmbiguousColumnMapping {
            column: name.to_string(),
            matches: candidates
                .iter()
                .map(|(zone, metric)| format!("({}, {})", zone, metric.name))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_timestamp_case_insensitively() {
        assert_eq!(classify("Timestamp").unwrap(), ColumnKind::Timestamp);
        assert_eq!(classify(" timestamp ").unwrap(), ColumnKind::Timestamp);
    }

    #[test]
    fn classifies_outdoor_before_zone_decomposition() {
        // Would otherwise decompose as zone "Outdoor" / metric "Heat_Index".
        assert_eq!(
            classify("Outdoor_Heat_Index").unwrap(),
            ColumnKind::Outdoor(OutdoorMetric::HeatIndex)
        );
        assert_eq!(
            classify("outdoor_dew_point").unwrap(),
            ColumnKind::Outdoor(OutdoorMetric::DewPoint)
        );
        assert_eq!(
            classify("Air_temperature").unwrap(),
            ColumnKind::Outdoor(OutdoorMetric::AirTemperature)
        );
    }

    #[test]
    fn decomposes_simple_zone_column() {
        match classify("Z1_temp").unwrap() {
            ColumnKind::Zone { zone, metric } => {
                assert_eq!(zone, "Z1");
                assert_eq!(metric.name, "temp");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn decomposes_zone_names_with_plus() {
        match classify("Z12+13_valve_opening").unwrap() {
            ColumnKind::Zone { zone, metric } => {
                assert_eq!(zone, "Z12+13");
                assert_eq!(metric.name, "valve_opening");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn prefers_longer_metric_suffix() {
        // "Z1_temp_diff" must resolve to (Z1, temp_diff), not (Z1_temp, diff).
        match classify("Z1_temp_diff").unwrap() {
            ColumnKind::Zone { zone, metric } => {
                assert_eq!(zone, "Z1");
                assert_eq!(metric.name, "temp_diff");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
        match classify("Z4_Heat_Index").unwrap() {
            ColumnKind::Zone { zone, metric } => {
                assert_eq!(zone, "Z4");
                assert_eq!(metric.name, "Heat_Index");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn unknown_header_is_fatal() {
        let err = classify("Z1_banana").unwrap_err();
        assert!(matches!(err, LoadError::UnknownColumnPattern { column } if column == "Z1_banana"));
        assert!(matches!(
            classify("temp").unwrap_err(),
            LoadError::UnknownColumnPattern { .. }
        ));
    }

    #[test]
    fn empty_zone_prefix_is_unknown() {
        assert!(matches!(
            classify("_temp").unwrap_err(),
            LoadError::UnknownColumnPattern { .. }
        ));
    }

    #[test]
    fn catalog_suffixes_are_unambiguous() {
        // No metric name may be the `_`-separated suffix of another, or a
        // single header would decompose two ways.
        for a in ZONE_METRICS {
            for b in ZONE_METRICS {
                if a.name != b.name {
                    assert!(
                        !a.name.ends_with(&format!("_{}", b.name)),
                        "{} is a suffix of {}",
                        b.name,
                        a.name
                    );
                }
            }
        }
    }
}
