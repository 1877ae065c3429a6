//! Semantic state computed from raw parameter and telemetry values.
//!
//! Everything here is a pure function of its inputs; the client feeds in the
//! current store contents and, where time matters, the current device clock.

use chrono::Utc;

use crate::types::{HeatingState, OperatingMode};

/// Unix timestamp of 2000-01-01T00:00:00Z, the origin of the device clock.
pub const EPOCH_2000_UNIX: i64 = 946_684_800;

/// Value written to both away bounds to clear the away window. Opaque
/// firmware marker; keep it bit-for-bit.
pub const HOME_SENTINEL: i64 = 536_112_000;

/// Away windows start this many seconds in the past so the device considers
/// them active immediately.
pub const AWAY_BACKDATE_SECS: i64 = 10;

/// Seconds since 2000-01-01T00:00:00Z.
pub fn now_since_2000() -> i64 {
    Utc::now().timestamp() - EPOCH_2000_UNIX
}

/// `powerOff` wins over `mode`.
pub fn operating_mode(power_off: Option<i64>, mode: Option<i64>) -> OperatingMode {
    if power_off == Some(1) {
        return OperatingMode::Off;
    }
    match mode {
        Some(0) => OperatingMode::Schedule,
        Some(1) => OperatingMode::Heat,
        _ => OperatingMode::Unknown,
    }
}

pub fn heating_state(load_condition: Option<i64>) -> HeatingState {
    match load_condition {
        Some(0) => HeatingState::Idle,
        Some(1) => HeatingState::Heating,
        _ => HeatingState::Unknown,
    }
}

/// Strict on both bounds; an unset bound means no away window.
pub fn is_away(start: Option<i64>, end: Option<i64>, now: i64) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => start < now && now < end,
        _ => false,
    }
}

/// `(startAwayTime, endAwayTime)` for an away window of `duration_secs`.
pub fn away_window(now: i64, duration_secs: i64) -> (i64, i64) {
    (
        now.saturating_sub(AWAY_BACKDATE_SECS),
        now.saturating_add(duration_secs),
    )
}

/// Bit `0b10` of `lockType` blocks changes over the local network. Missing
/// telemetry counts as enabled.
pub fn remote_control_enabled(lock_type: Option<i64>) -> bool {
    match lock_type {
        Some(flags) => flags & 0b10 == 0,
        None => true,
    }
}
