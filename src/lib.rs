mod client;
pub mod codec;
mod config;
pub mod derive;
mod diff;
mod error;
mod logger;
mod protocol;
mod thermostat;
mod transport;
mod types;

pub use client::{
    TelemetrySnapshot, TerneoClient, TerneoClientBuilder, DEFAULT_REFRESH_INTERVAL,
    DEFAULT_TIMEOUT,
};
pub use config::ThermostatConfig;
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use thermostat::{
    HvacAction, HvacMode, Preset, SupportedFeatures, TemperatureUnit, Thermostat,
    AWAY_PRESET_DURATION, NOTIFICATION_TITLE,
};
pub use types::*;
