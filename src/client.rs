use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use crate::codec;
use crate::derive;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{self, Command, ParametersReply, ScheduleReply};
use crate::transport::Transport;
use crate::types::*;
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Telemetry field name to decoded value. Replaced wholesale on every fetch.
pub type TelemetrySnapshot = BTreeMap<String, TelemetryValue>;

type TelemetryCallback = Box<dyn Fn(&TelemetrySnapshot) + Send + Sync>;

pub struct TerneoClientBuilder {
    host: String,
    protocol: String,
    name: Option<String>,
    timeout: Duration,
    refresh_interval: Duration,
    telemetry_callbacks: Vec<TelemetryCallback>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl TerneoClientBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            protocol: "http".to_string(),
            name: None,
            timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            telemetry_callbacks: Vec::new(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn protocol(mut self, proto: &str) -> Self {
        self.protocol = proto.to_string();
        self
    }

    /// Display name. Without one the name is derived from the serial number.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overall read timeout; connecting gets half of it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Minimum time between parameter fetches when nothing is pending.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn on_telemetry(mut self, f: impl Fn(&TelemetrySnapshot) + Send + Sync + 'static) -> Self {
        self.telemetry_callbacks.push(Box::new(f));
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<TerneoClient> {
        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        let transport = Transport::new(&self.protocol, &self.host, self.timeout, logger)?;

        Ok(TerneoClient {
            transport,
            host: self.host,
            name: self.name,
            serial: None,
            params: None,
            telemetry: None,
            schedule: None,
            last_params_fetch: None,
            refresh_interval: self.refresh_interval,
            telemetry_callbacks: self.telemetry_callbacks,
        })
    }
}

/// Local model of one thermostat: every parameter's observed and desired
/// value, the latest telemetry snapshot, and the device identity.
///
/// Parameters only change on the device when [`refresh_parameters`] pushes
/// pending writes. Mutating calls take `&mut self`; share a client across
/// tasks behind a mutex.
///
/// [`refresh_parameters`]: TerneoClient::refresh_parameters
pub struct TerneoClient {
    transport: Transport,
    host: String,
    name: Option<String>,
    serial: Option<String>,
    params: Option<BTreeMap<String, ParameterEntry>>,
    telemetry: Option<TelemetrySnapshot>,
    schedule: Option<Value>,
    last_params_fetch: Option<Instant>,
    refresh_interval: Duration,
    telemetry_callbacks: Vec<TelemetryCallback>,
}

impl TerneoClient {
    pub fn builder(host: impl Into<String>) -> TerneoClientBuilder {
        TerneoClientBuilder::new(host)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn uri(&self) -> &str {
        self.transport.uri()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Configured name, else the last five characters of the serial number,
    /// else the host.
    pub fn name(&self) -> String {
        if let Some(ref name) = self.name {
            return name.clone();
        }
        match self.serial {
            Some(ref sn) => {
                let skip = sn.chars().count().saturating_sub(5);
                sn.chars().skip(skip).collect()
            }
            None => self.host.clone(),
        }
    }

    pub fn last_parameters_fetch(&self) -> Option<Instant> {
        self.last_params_fetch
    }

    // -- Synchronization --

    /// Send every pending parameter in one write request.
    ///
    /// Returns `Ok(false)` without touching the network when nothing is
    /// pending. The reply only has to be valid JSON; read values are left
    /// alone until the next fetch reports what the device applied.
    pub async fn push_pending_parameters(&mut self) -> Result<bool> {
        let Some(ref params) = self.params else {
            return Ok(false);
        };

        let mut updates = Vec::new();
        for (name, entry) in params.iter().filter(|(_, e)| e.is_pending()) {
            match codec::encode_param_name(name) {
                Some((key, _)) => {
                    updates.push((key, entry.wire_type.0, entry.set_value.to_string()));
                }
                None => error!(parameter = %name, "parameter not in codec table, dropping write"),
            }
        }

        if updates.is_empty() {
            return Ok(false);
        }

        info!(host = %self.host, ?updates, "pushing parameter updates");
        let body = protocol::write_message(self.serial.as_deref(), &updates);
        let reply = self.transport.send("write", Some(&body)).await?;
        info!(host = %self.host, %reply, "write acknowledged");
        Ok(true)
    }

    /// Push pending writes, then fetch parameters.
    ///
    /// The fetch is skipped when nothing was pushed and the previous fetch
    /// is younger than the refresh interval. On failure the store is left
    /// exactly as it was.
    pub async fn refresh_parameters(&mut self) -> Result<()> {
        let pushed = self.push_pending_parameters().await?;

        if !pushed
            && let Some(last) = self.last_params_fetch
            && last.elapsed() < self.refresh_interval
        {
            trace!(host = %self.host, "parameters fetched recently, skipping");
            return Ok(());
        }

        let cmd = Command::GetParameters;
        let reply = self.transport.send(cmd.name(), Some(&cmd.message())).await?;
        let reply: ParametersReply = serde_json::from_value(reply).map_err(|e| {
            error!(host = %self.host, error = %e, "malformed parameters reply");
            Error::Decode(e)
        })?;

        let decoded = decode_parameters(&reply.par)?;
        debug!(host = %self.host, count = decoded.len(), "parameters fetched");

        self.merge_parameters(decoded);
        if let Some(serial) = reply.serial() {
            self.serial = Some(serial);
        }
        self.last_params_fetch = Some(Instant::now());
        Ok(())
    }

    /// Fetch telemetry and replace the previous snapshot. Fields missing
    /// from the reply are gone afterwards.
    pub async fn refresh_telemetry(&mut self) -> Result<()> {
        let cmd = Command::GetTelemetry;
        let reply = self.transport.send(cmd.name(), Some(&cmd.message())).await?;
        let (serial, snapshot) = decode_telemetry(&reply).inspect_err(|e| {
            error!(host = %self.host, error = %e, "malformed telemetry reply");
        })?;

        debug!(host = %self.host, count = snapshot.len(), "telemetry fetched");
        if serial.is_some() {
            self.serial = serial;
        }

        for cb in &self.telemetry_callbacks {
            cb(&snapshot);
        }
        self.telemetry = Some(snapshot);
        Ok(())
    }

    /// Fetch the weekly program. It is stored as received and not decoded.
    pub async fn refresh_schedule(&mut self) -> Result<()> {
        let cmd = Command::GetSchedule;
        let reply = self.transport.send(cmd.name(), Some(&cmd.message())).await?;
        let reply: ScheduleReply = serde_json::from_value(reply).map_err(|e| {
            error!(host = %self.host, error = %e, "malformed schedule reply");
            Error::Decode(e)
        })?;

        if let Some(serial) = reply.serial() {
            self.serial = Some(serial);
        }
        self.schedule = reply.tt;
        Ok(())
    }

    fn merge_parameters(&mut self, decoded: Vec<(&'static str, WireType, ParamValue)>) {
        let params = self.params.get_or_insert_with(BTreeMap::new);
        for (name, wire_type, value) in decoded {
            match params.get_mut(name) {
                Some(entry) => entry.read_value = Some(value),
                None => {
                    params.insert(name.to_string(), ParameterEntry::observed(value, wire_type));
                }
            }
        }
    }

    // -- Parameters --

    /// Effective value of a parameter: the desired value, which equals the
    /// observed one unless a write is pending.
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameter_entry(name).map(|e| &e.set_value)
    }

    pub fn parameter_entry(&self, name: &str) -> Option<&ParameterEntry> {
        self.params.as_ref()?.get(name)
    }

    pub fn parameters(&self) -> Option<&BTreeMap<String, ParameterEntry>> {
        self.params.as_ref()
    }

    pub fn pending_parameters(&self) -> impl Iterator<Item = (&str, &ParameterEntry)> {
        self.params
            .iter()
            .flatten()
            .filter(|(_, e)| e.is_pending())
            .map(|(name, e)| (name.as_str(), e))
    }

    fn int_parameter(&self, name: &str) -> Option<i64> {
        self.parameter(name).and_then(ParamValue::as_int)
    }

    /// Record a desired value, sent on the next [`refresh_parameters`].
    ///
    /// Rejected until parameters have been fetched at least once, and for
    /// names the device does not know.
    ///
    /// [`refresh_parameters`]: TerneoClient::refresh_parameters
    pub fn write_parameter(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        let Some(ref mut params) = self.params else {
            warn!(host = %self.host, parameter = name, "write before first parameter fetch");
            return Err(Error::NotReady);
        };
        let Some((_, codec_type)) = codec::encode_param_name(name) else {
            error!(host = %self.host, parameter = name, "unknown parameter");
            return Err(Error::UnknownField(name.to_string()));
        };

        // The device-reported type wins over the table's once we have seen it.
        let wire_type = params.get(name).map_or(codec_type, |e| e.wire_type);
        let raw = value.into();
        let Some(value) = raw.clone().coerce(wire_type) else {
            error!(host = %self.host, parameter = name, %raw, %wire_type, "value does not fit wire type");
            return Err(Error::Protocol(format!(
                "parameter {name}: {raw:?} does not fit wire type {wire_type}"
            )));
        };

        debug!(host = %self.host, parameter = name, %value, "parameter set");
        match params.get_mut(name) {
            Some(entry) => entry.set_value = value,
            None => {
                params.insert(
                    name.to_string(),
                    ParameterEntry {
                        read_value: None,
                        set_value: value,
                        wire_type,
                        scale_divider: 0,
                    },
                );
            }
        }
        Ok(())
    }

    // -- Telemetry --

    pub fn telemetry(&self, name: &str) -> Option<TelemetryValue> {
        self.telemetry.as_ref()?.get(name).copied()
    }

    pub fn telemetry_snapshot(&self) -> Option<&TelemetrySnapshot> {
        self.telemetry.as_ref()
    }

    pub fn schedule(&self) -> Option<&Value> {
        self.schedule.as_ref()
    }

    fn int_telemetry(&self, name: &str) -> Option<i64> {
        self.telemetry(name).and_then(|v| v.as_i64())
    }

    // -- Derived state --

    pub fn operating_mode(&self) -> OperatingMode {
        derive::operating_mode(self.int_parameter("powerOff"), self.int_parameter("mode"))
    }

    pub fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<()> {
        info!(host = %self.host, mode = mode.as_str(), "set mode");
        match mode {
            OperatingMode::Off => self.write_parameter("powerOff", 1),
            OperatingMode::Heat => {
                self.write_parameter("powerOff", 0)?;
                self.write_parameter("mode", 1)
            }
            OperatingMode::Schedule => {
                self.write_parameter("powerOff", 0)?;
                self.write_parameter("mode", 0)
            }
            OperatingMode::Unknown => Err(Error::InvalidMode(mode.as_str().to_string())),
        }
    }

    pub fn heating_state(&self) -> HeatingState {
        derive::heating_state(self.int_telemetry("loadCondition"))
    }

    pub fn is_away(&self) -> bool {
        self.is_away_at(derive::now_since_2000())
    }

    /// Away check against an explicit device-clock time (seconds since 2000).
    pub fn is_away_at(&self, now: i64) -> bool {
        derive::is_away(
            self.int_parameter("startAwayTime"),
            self.int_parameter("endAwayTime"),
            now,
        )
    }

    pub fn set_home(&mut self) -> Result<()> {
        self.write_parameter("startAwayTime", derive::HOME_SENTINEL)?;
        self.write_parameter("endAwayTime", derive::HOME_SENTINEL)
    }

    pub fn set_away(&mut self, duration: Duration) -> Result<()> {
        let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        self.set_away_at(derive::now_since_2000(), secs)
    }

    pub fn set_away_at(&mut self, now: i64, duration_secs: i64) -> Result<()> {
        let (start, end) = derive::away_window(now, duration_secs);
        self.write_parameter("startAwayTime", start)?;
        self.write_parameter("endAwayTime", end)
    }

    pub fn remote_control_enabled(&self) -> bool {
        derive::remote_control_enabled(self.int_telemetry("lockType"))
    }

    fn setpoint_parameter(&self) -> &'static str {
        if self.is_away() {
            "awayFloorTemperature"
        } else {
            "manualFloorTemperature"
        }
    }

    /// Floor setpoint in whole °C for the current away state.
    pub fn target_temperature(&self) -> Option<i64> {
        self.int_parameter(self.setpoint_parameter())
    }

    pub fn set_target_temperature(&mut self, celsius: i64) -> Result<()> {
        let name = self.setpoint_parameter();
        self.write_parameter(name, celsius)
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.telemetry("floorSensor").map(|v| v.as_f64())
    }

    pub fn lower_temperature_limit(&self) -> Option<i64> {
        self.int_parameter("lowerLimit")
    }

    pub fn upper_temperature_limit(&self) -> Option<i64> {
        self.int_parameter("upperLimit")
    }
}

/// Decode `[key, type, value]` triples. Unknown keys are skipped; a value
/// that does not parse for its wire type fails the whole batch.
fn decode_parameters(
    triples: &[(u16, u8, String)],
) -> Result<Vec<(&'static str, WireType, ParamValue)>> {
    let mut decoded = Vec::with_capacity(triples.len());
    for (key, ty, raw) in triples {
        let Some((name, _)) = codec::decode_param_key(*key) else {
            trace!(key, "ignoring unknown parameter key");
            continue;
        };
        let wire_type = WireType(*ty);
        let value = ParamValue::decode(wire_type, raw).ok_or_else(|| {
            Error::Protocol(format!("parameter {name} ({key}): {raw:?} is not an integer"))
        })?;
        decoded.push((name, wire_type, value));
    }
    Ok(decoded)
}

fn decode_telemetry(reply: &Value) -> Result<(Option<String>, TelemetrySnapshot)> {
    let (serial, fields) = protocol::split_telemetry(reply)
        .ok_or_else(|| Error::Protocol("telemetry reply is not an object".to_string()))?;

    let mut snapshot = TelemetrySnapshot::new();
    for (tag, raw) in fields {
        let Some((name, divisor)) = codec::decode_telemetry_tag(tag) else {
            continue;
        };
        let value = codec::raw_integer(raw)
            .ok_or_else(|| Error::Protocol(format!("telemetry {tag}: {raw} is not an integer")))?;
        snapshot.insert(name.to_string(), codec::apply_divisor(value, divisor));
    }
    Ok((serial, snapshot))
}
