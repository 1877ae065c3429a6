//! Wire key tables for the parameter and telemetry namespaces.
//!
//! Parameters are addressed by small integer keys, telemetry by dotted tags
//! such as `t.1`. Both tables are fixed; anything the device reports that is
//! not listed here is dropped on decode.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::Value;

use crate::types::{TelemetryValue, WireType};

const PARAMETERS: &[(u16, &str, u8)] = &[
    (0, "startAwayTime", 6),
    (1, "endAwayTime", 6),
    (2, "mode", 2),
    (3, "controlType", 2),
    (4, "manualAir", 1),
    (5, "manualFloorTemperature", 1),
    (6, "awayAirTemperature", 1),
    (7, "awayFloorTemperature", 1),
    (14, "minTempAdvancedMode", 2),
    (15, "maxTempAdvancedMode", 2),
    (17, "power", 4),
    (18, "sensorType", 2),
    (19, "histeresis", 2),
    (20, "airCorrection", 1),
    (21, "floorCorrection", 1),
    (23, "brightness", 2),
    (25, "propKoef", 3),
    (26, "upperLimit", 1),
    (27, "lowerLimit", 1),
    (28, "maxSchedulePeriod", 2),
    (29, "tempTemperature", 2),
    (33, "upperAirLimit", 1),
    (34, "lowerAirLimit", 1),
    (35, "upperU", 4),
    (36, "lowerU", 2),
    (37, "upperP", 2),
    (38, "upperI", 4),
    (39, "middleI", 4),
    (40, "lowerI", 4),
    (41, "tOnDelay", 4),
    (42, "tOffDelay", 2),
    (43, "middleITime", 2),
    (44, "lowerITime", 2),
    (45, "lowVoltageTime", 4),
    (46, "correctionsU", 1),
    (47, "correctionsI", 1),
    (48, "repTimes", 2),
    (49, "powerType", 2),
    (50, "showType", 2),
    (51, "sensorControlNumber", 2),
    (112, "proMode", 7),
    (113, "voltageStableDelay", 7),
    (114, "androidBlock", 7),
    (115, "cloudBlock", 7),
    (116, "useContactorControl", 7),
    (117, "NCContactControl", 7),
    (118, "coolingControlWay", 7),
    (121, "preControl", 7),
    (122, "windowOpenControl", 7),
    (124, "childrenLock", 7),
    (125, "powerOff", 7),
];

const TELEMETRY: &[(&str, &str, Option<u32>)] = &[
    ("t.0", "internalOverheatSensor", Some(16)),
    ("t.1", "floorSensor", Some(16)),
    ("t.2", "airSensor", Some(16)),
    ("t.3", "precipitationSensor", Some(16)),
    ("t.4", "externalObject", Some(16)),
    ("t.5", "currentSetting", Some(16)),
    ("t.6", "correction", Some(16)),
    ("u.0", "maximumVoltage", None),
    ("u.1", "minimumVoltage", None),
    ("u.2", "supplyVoltage", Some(100)),
    ("u.3", "batteryVoltage", Some(10)),
    ("u.4", "upperThreshold", None),
    ("u.5", "lowerThreshold", None),
    ("u.6", "mediumVoltage", None),
    ("i.0", "maximumCurrent", Some(10)),
    ("i.1", "averageCurrent", Some(10)),
    ("i.2", "minimumCurrent", Some(10)),
    ("i.3", "upperCurrentLimit", Some(10)),
    ("i.4", "averageCurrentLimit", Some(10)),
    ("i.5", "lowerCurrentLimit", Some(10)),
    ("w.0", "upperPowerLimit", None),
    ("w.1", "maximumLoadPower", None),
    ("w.2", "averageLoadPower", None),
    ("w.3", "minimumLoadPower", None),
    ("w.4", "maxCosinePhi", Some(100)),
    ("w.5", "avgCosinePhi", Some(100)),
    ("w.6", "minCosinePhi", Some(100)),
    ("r.0", "soilMoistureSensor", None),
    ("p.0", "maxActiveLoadPower", None),
    ("p.1", "avgActiveLoadPower", None),
    ("p.2", "minActiveLoadPower", None),
    ("p.3", "maxReactiveLoadPower", None),
    ("p.4", "avgReactiveLoadPower", None),
    ("p.5", "minReactiveLoadPower", None),
    // floor=0, air=1, extended=2
    ("m.0", "typeOfControl", None),
    // schedule=0, manual=3, away=4, temporary=5
    ("m.1", "typeOfManagement", None),
    ("m.2", "numberPeriodOfSchedule", None),
    // bit 0: cloud changes locked, bit 1: local network changes locked
    ("m.3", "lockType", None),
    ("m.4", "typeOfControlledPower", None),
    ("o.0", "wifiSignalLevel", None),
    ("o.1", "lastReboot", None),
    ("f.0", "loadCondition", None),
    ("f.1", "waitingForLoad", None),
    ("f.2", "actionOnTheFloorLimit", None),
    ("f.3", "floorSensorBreak", None),
    ("f.4", "floorSensorShortCircuit", None),
    ("f.5", "airSensorBreak", None),
    ("f.6", "airSensorShortCircuit", None),
    ("f.7", "preheatingAction", None),
    ("f.8", "openWindowAction", None),
    ("f.9", "internalOverheating", None),
    ("f.10", "batteryLow", None),
    ("f.11", "clockProblem", None),
    ("f.12", "noOverheatingControl", None),
    ("f.13", "proportionalLoadOperation", None),
    ("f.14", "digitalFloorSensor", None),
    ("f.15", "watchdogReboot", None),
];

static PARAM_BY_KEY: LazyLock<HashMap<u16, (&'static str, WireType)>> = LazyLock::new(|| {
    PARAMETERS
        .iter()
        .map(|&(key, name, ty)| (key, (name, WireType(ty))))
        .collect()
});

static PARAM_BY_NAME: LazyLock<HashMap<&'static str, (u16, WireType)>> = LazyLock::new(|| {
    PARAMETERS
        .iter()
        .map(|&(key, name, ty)| (name, (key, WireType(ty))))
        .collect()
});

static TELEMETRY_BY_TAG: LazyLock<HashMap<&'static str, (&'static str, Option<u32>)>> =
    LazyLock::new(|| {
        TELEMETRY
            .iter()
            .map(|&(tag, name, div)| (tag, (name, div)))
            .collect()
    });

static TELEMETRY_BY_NAME: LazyLock<HashMap<&'static str, (&'static str, Option<u32>)>> =
    LazyLock::new(|| {
        TELEMETRY
            .iter()
            .map(|&(tag, name, div)| (name, (tag, div)))
            .collect()
    });

pub fn decode_param_key(key: u16) -> Option<(&'static str, WireType)> {
    PARAM_BY_KEY.get(&key).copied()
}

pub fn encode_param_name(name: &str) -> Option<(u16, WireType)> {
    PARAM_BY_NAME.get(name).copied()
}

pub fn decode_telemetry_tag(tag: &str) -> Option<(&'static str, Option<u32>)> {
    TELEMETRY_BY_TAG.get(tag).copied()
}

pub fn encode_telemetry_name(name: &str) -> Option<(&'static str, Option<u32>)> {
    TELEMETRY_BY_NAME.get(name).copied()
}

/// Interpret a raw telemetry value, which the device sends either as a JSON
/// number or as a numeric string.
pub(crate) fn raw_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn apply_divisor(raw: i64, divisor: Option<u32>) -> TelemetryValue {
    match divisor {
        Some(d) => TelemetryValue::Decimal(raw as f64 / f64::from(d)),
        None => TelemetryValue::Integer(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_param_key_round_trips() {
        for &(key, name, ty) in PARAMETERS {
            let (decoded, wire_type) = decode_param_key(key).unwrap();
            assert_eq!(decoded, name);
            assert_eq!(wire_type, WireType(ty));
            assert_eq!(encode_param_name(decoded), Some((key, WireType(ty))));
        }
    }

    #[test]
    fn every_telemetry_tag_round_trips() {
        for &(tag, name, div) in TELEMETRY {
            assert_eq!(decode_telemetry_tag(tag), Some((name, div)));
            assert_eq!(encode_telemetry_name(name), Some((tag, div)));
        }
    }

    #[test]
    fn tables_have_no_duplicates() {
        assert_eq!(PARAM_BY_KEY.len(), PARAMETERS.len());
        assert_eq!(PARAM_BY_NAME.len(), PARAMETERS.len());
        assert_eq!(TELEMETRY_BY_TAG.len(), TELEMETRY.len());
        assert_eq!(TELEMETRY_BY_NAME.len(), TELEMETRY.len());
    }

    #[test]
    fn unknown_keys_are_absent() {
        assert_eq!(decode_param_key(8), None);
        assert_eq!(decode_param_key(999), None);
        assert_eq!(encode_param_name("notAParameter"), None);
        assert_eq!(decode_telemetry_tag("x.0"), None);
    }

    #[test]
    fn well_known_entries() {
        assert_eq!(decode_param_key(125), Some(("powerOff", WireType(7))));
        assert_eq!(encode_param_name("startAwayTime"), Some((0, WireType(6))));
        assert_eq!(decode_telemetry_tag("t.1"), Some(("floorSensor", Some(16))));
        assert_eq!(decode_telemetry_tag("m.3"), Some(("lockType", None)));
    }

    #[test]
    fn divisor_produces_decimal() {
        assert_eq!(apply_divisor(352, Some(16)), TelemetryValue::Decimal(22.0));
        assert_eq!(apply_divisor(23012, Some(100)), TelemetryValue::Decimal(230.12));
        assert_eq!(apply_divisor(3, None), TelemetryValue::Integer(3));
    }

    #[test]
    fn raw_integer_accepts_numbers_and_strings() {
        assert_eq!(raw_integer(&json!(42)), Some(42));
        assert_eq!(raw_integer(&json!("-7")), Some(-7));
        assert_eq!(raw_integer(&json!("abc")), None);
        assert_eq!(raw_integer(&json!(null)), None);
    }
}
