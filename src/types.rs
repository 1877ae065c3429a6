use std::fmt;

/// Wire encoding discriminant of a parameter. Types 1..=7 carry integers
/// (signed, unsigned, boolean-like); type 0 carries a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireType(pub u8);

impl WireType {
    pub const STRING: WireType = WireType(0);

    pub fn is_integer(&self) -> bool {
        (1..=7).contains(&self.0)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Semantic value of a parameter, typed by its wire type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Int(_) => None,
            ParamValue::Text(s) => Some(s),
        }
    }

    /// Decode a raw wire string according to its wire type.
    pub(crate) fn decode(wire_type: WireType, raw: &str) -> Option<Self> {
        if wire_type.is_integer() {
            raw.trim().parse().ok().map(ParamValue::Int)
        } else {
            Some(ParamValue::Text(raw.to_string()))
        }
    }

    /// Retype a value for `wire_type`. Text on an integer type must parse;
    /// integers on the string type are rendered as text.
    pub(crate) fn coerce(self, wire_type: WireType) -> Option<Self> {
        match self {
            ParamValue::Text(s) if wire_type.is_integer() => ParamValue::decode(wire_type, &s),
            ParamValue::Int(v) if !wire_type.is_integer() => Some(ParamValue::Text(v.to_string())),
            value => Some(value),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Last observed and desired value of one device parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEntry {
    /// Value last reported by the device. `None` until the device reports it.
    pub read_value: Option<ParamValue>,
    pub set_value: ParamValue,
    pub wire_type: WireType,
    /// Reserved; not applied when decoding.
    pub scale_divider: u32,
}

impl ParameterEntry {
    pub(crate) fn observed(value: ParamValue, wire_type: WireType) -> Self {
        Self {
            read_value: Some(value.clone()),
            set_value: value,
            wire_type,
            scale_divider: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.read_value.as_ref() != Some(&self.set_value)
    }
}

/// Decoded telemetry reading. Fields with a divisor become decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryValue {
    Integer(i64),
    Decimal(f64),
}

impl TelemetryValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            TelemetryValue::Integer(v) => v as f64,
            TelemetryValue::Decimal(v) => v,
        }
    }

    /// Integer view; decimals are only returned when they have no fraction.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            TelemetryValue::Integer(v) => Some(v),
            TelemetryValue::Decimal(v) if v.fract() == 0.0 => Some(v as i64),
            TelemetryValue::Decimal(_) => None,
        }
    }
}

impl fmt::Display for TelemetryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryValue::Integer(v) => write!(f, "{v}"),
            TelemetryValue::Decimal(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    Off,
    Schedule,
    Heat,
    Unknown,
}

impl OperatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingMode::Off => "OFF",
            OperatingMode::Schedule => "schedule",
            OperatingMode::Heat => "heat",
            OperatingMode::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeatingState {
    Idle,
    Heating,
    #[default]
    Unknown,
}

impl HeatingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeatingState::Idle => "idle",
            HeatingState::Heating => "heating",
            HeatingState::Unknown => "unknown",
        }
    }
}

/// One-shot message for the host to display to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub notification_id: Option<String>,
}
