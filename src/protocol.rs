use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const API_PATH: &str = "api.cgi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetParameters,
    GetSchedule,
    GetTelemetry,
}

impl Command {
    pub fn code(&self) -> u8 {
        match self {
            Command::GetParameters => 1,
            Command::GetSchedule => 2,
            Command::GetTelemetry => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::GetParameters => "parameters",
            Command::GetSchedule => "schedule",
            Command::GetTelemetry => "telemetry",
        }
    }

    pub fn message(&self) -> Value {
        json!({ "cmd": self.code() })
    }
}

/// One `[key, type, value]` triple as written to the device.
pub type ParamTriple = (u16, u8, String);

pub fn write_message(serial: Option<&str>, updates: &[ParamTriple]) -> Value {
    json!({
        "sn": serial,
        "par": updates,
    })
}

/// Devices report `sn` as a string, but some firmware sends a bare number.
fn serial_number(sn: &Value) -> Option<String> {
    match sn {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct ParametersReply {
    #[serde(default)]
    sn: Option<Value>,
    #[serde(default)]
    pub par: Vec<(u16, u8, String)>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleReply {
    #[serde(default)]
    sn: Option<Value>,
    #[serde(default)]
    pub tt: Option<Value>,
}

impl ParametersReply {
    pub fn serial(&self) -> Option<String> {
        self.sn.as_ref().and_then(serial_number)
    }
}

impl ScheduleReply {
    pub fn serial(&self) -> Option<String> {
        self.sn.as_ref().and_then(serial_number)
    }
}

/// Telemetry replies are a flat object of tags plus the serial number.
pub fn split_telemetry(reply: &Value) -> Option<(Option<String>, &Map<String, Value>)> {
    let fields = reply.as_object()?;
    let serial = fields.get("sn").and_then(serial_number);
    Some((serial, fields))
}
