//! Climate-entity view of a [`TerneoClient`] for home automation hosts.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::client::TerneoClient;
use crate::config::ThermostatConfig;
use crate::types::*;
use crate::{Error, Result};

/// Length of the away window started by [`Preset::Away`].
pub const AWAY_PRESET_DURATION: Duration = Duration::from_secs(24 * 3600);

pub const NOTIFICATION_TITLE: &str = "TerneoAX";

type NotificationCallback = Box<dyn Fn(&Notification) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedFeatures(u32);

impl SupportedFeatures {
    pub const TARGET_TEMPERATURE: u32 = 1;
    pub const PRESET_MODE: u32 = 16;

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    Heat,
    Off,
}

impl HvacMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Heat => "heat",
            HvacMode::Off => "off",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "heat" => Some(HvacMode::Heat),
            "off" => Some(HvacMode::Off),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacAction {
    Idle,
    Heating,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Home,
    Away,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Home => "home",
            Preset::Away => "away",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "home" => Some(Preset::Home),
            "away" => Some(Preset::Away),
            _ => None,
        }
    }
}

const HVAC_MODES: &[HvacMode] = &[HvacMode::Heat, HvacMode::Off];
const PRESETS: &[Preset] = &[Preset::Home, Preset::Away];

pub struct Thermostat {
    client: TerneoClient,
    notification_sent: bool,
    notification_callbacks: Vec<NotificationCallback>,
}

impl Thermostat {
    pub fn new(client: TerneoClient) -> Self {
        Self {
            client,
            notification_sent: false,
            notification_callbacks: Vec::new(),
        }
    }

    pub fn from_config(config: &ThermostatConfig) -> Result<Self> {
        Ok(Self::new(config.client_builder()?.build()?))
    }

    /// Called once, the first time the device reports that changes over the
    /// local network are locked.
    pub fn on_notification(mut self, f: impl Fn(&Notification) + Send + Sync + 'static) -> Self {
        self.notification_callbacks.push(Box::new(f));
        self
    }

    pub fn client(&self) -> &TerneoClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut TerneoClient {
        &mut self.client
    }

    /// One poll cycle: parameters (pushing pending writes first), then
    /// telemetry. Telemetry is fetched even when the parameter step fails;
    /// the first error is returned.
    pub async fn update(&mut self) -> Result<()> {
        info!(host = %self.client.host(), "update");

        let params = self.client.refresh_parameters().await;
        if let Err(ref e) = params {
            error!(host = %self.client.host(), error = %e, "failed to update params");
        }

        let telemetry = self.client.refresh_telemetry().await;
        match telemetry {
            Err(ref e) => {
                error!(host = %self.client.host(), error = %e, "failed to update telemetry");
            }
            Ok(()) => self.check_remote_control(),
        }

        info!(host = %self.client.host(), "update done");
        params.and(telemetry)
    }

    fn check_remote_control(&mut self) {
        if self.notification_sent || self.client.remote_control_enabled() {
            return;
        }

        let serial = self.client.serial_number().map(str::to_string);
        let notification = Notification {
            title: NOTIFICATION_TITLE.to_string(),
            message: format!(
                "Please enable remote control on {} [{}] serial number: {} ",
                self.client.host(),
                self.client.name(),
                serial.as_deref().unwrap_or("unknown"),
            ),
            notification_id: serial,
        };

        warn!(host = %self.client.host(), "remote control disabled on device");
        for cb in &self.notification_callbacks {
            cb(&notification);
        }
        self.notification_sent = true;
    }

    // -- Properties --

    pub fn name(&self) -> String {
        self.client.name()
    }

    pub fn supported_features(&self) -> SupportedFeatures {
        SupportedFeatures(SupportedFeatures::TARGET_TEMPERATURE | SupportedFeatures::PRESET_MODE)
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    pub fn precision(&self) -> f64 {
        0.1
    }

    pub fn target_temperature_step(&self) -> f64 {
        1.0
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        HVAC_MODES
    }

    pub fn preset_modes(&self) -> &'static [Preset] {
        PRESETS
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.client.current_temperature()
    }

    pub fn min_temp(&self) -> Option<f64> {
        self.client.lower_temperature_limit().map(|t| t as f64)
    }

    pub fn max_temp(&self) -> Option<f64> {
        self.client.upper_temperature_limit().map(|t| t as f64)
    }

    /// Schedule mode is reported as off; only manual heating counts as heat.
    pub fn hvac_mode(&self) -> HvacMode {
        match self.client.operating_mode() {
            OperatingMode::Heat => HvacMode::Heat,
            _ => HvacMode::Off,
        }
    }

    pub fn hvac_action(&self) -> HvacAction {
        match self.client.heating_state() {
            HeatingState::Idle => HvacAction::Idle,
            HeatingState::Heating => HvacAction::Heating,
            HeatingState::Unknown => HvacAction::Off,
        }
    }

    pub fn extra_state_attributes(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([("hvac_mode", self.client.heating_state().as_str().to_string())])
    }

    /// Only reported while heating manually.
    pub fn target_temperature(&self) -> Option<f64> {
        if self.client.operating_mode() != OperatingMode::Heat {
            return None;
        }
        self.client.target_temperature().map(|t| t as f64)
    }

    pub fn preset_mode(&self) -> Preset {
        if self.client.is_away() {
            Preset::Away
        } else {
            Preset::Home
        }
    }

    // -- Setters. Changes reach the device on the next update. --

    pub fn set_hvac_mode(&mut self, mode: HvacMode) -> Result<()> {
        info!(host = %self.client.host(), mode = mode.as_str(), "set hvac mode");
        let result = match mode {
            HvacMode::Heat => self.client.set_operating_mode(OperatingMode::Heat),
            HvacMode::Off => self.client.set_operating_mode(OperatingMode::Off),
        };
        if let Err(ref e) = result {
            error!(mode = mode.as_str(), error = %e, "failed to change the operation mode");
        }
        result
    }

    /// Set the floor setpoint, switching mode first when one is given.
    /// Fractions are truncated to whole degrees.
    pub fn set_temperature(&mut self, temperature: f64, mode: Option<HvacMode>) -> Result<()> {
        let current = self.hvac_mode();
        let mode = mode.unwrap_or(current);
        info!(mode = mode.as_str(), temperature, "set temperature");

        if mode != current {
            self.set_hvac_mode(mode)?;
        }

        if mode != HvacMode::Heat {
            error!(
                mode = mode.as_str(),
                "the thermostat is not in a mode that supports target temperature"
            );
            return Err(Error::InvalidMode(mode.as_str().to_string()));
        }

        self.client
            .set_target_temperature(temperature.trunc() as i64)
            .inspect_err(|e| error!(error = %e, "failed to change the temperature"))
    }

    pub fn set_preset_mode(&mut self, preset: Preset) -> Result<()> {
        info!(host = %self.client.host(), preset = preset.as_str(), "set home/away");
        let result = match preset {
            Preset::Away => self.client.set_away(AWAY_PRESET_DURATION),
            Preset::Home => self.client.set_home(),
        };
        if let Err(ref e) = result {
            error!(preset = preset.as_str(), error = %e, "failed to change the home/away state");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> Thermostat {
        Thermostat::new(TerneoClient::builder("127.0.0.1:9").build().unwrap())
    }

    #[test]
    fn static_properties() {
        let t = offline();
        let features = t.supported_features();
        assert!(features.contains(SupportedFeatures::TARGET_TEMPERATURE));
        assert!(features.contains(SupportedFeatures::PRESET_MODE));
        assert_eq!(features.bits(), 17);
        assert_eq!(t.temperature_unit(), TemperatureUnit::Celsius);
        assert_eq!(t.precision(), 0.1);
        assert_eq!(t.target_temperature_step(), 1.0);
        assert_eq!(t.hvac_modes(), &[HvacMode::Heat, HvacMode::Off]);
        assert_eq!(t.preset_modes(), &[Preset::Home, Preset::Away]);
    }

    #[test]
    fn unfetched_device_reads_as_off_and_home() {
        let t = offline();
        assert_eq!(t.hvac_mode(), HvacMode::Off);
        assert_eq!(t.hvac_action(), HvacAction::Off);
        assert_eq!(t.preset_mode(), Preset::Home);
        assert_eq!(t.target_temperature(), None);
        assert_eq!(t.extra_state_attributes()["hvac_mode"], "unknown");
    }

    #[test]
    fn setters_before_fetch_fail() {
        let mut t = offline();
        assert!(matches!(t.set_hvac_mode(HvacMode::Heat), Err(Error::NotReady)));
        assert!(matches!(t.set_preset_mode(Preset::Away), Err(Error::NotReady)));
    }

    #[test]
    fn name_round_trips() {
        for mode in [HvacMode::Heat, HvacMode::Off] {
            assert_eq!(HvacMode::from_name(mode.as_str()), Some(mode));
        }
        for preset in [Preset::Home, Preset::Away] {
            assert_eq!(Preset::from_name(preset.as_str()), Some(preset));
        }
        assert_eq!(Preset::from_name("eco"), None);
    }
}
