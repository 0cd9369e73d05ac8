//! Models for the energy-controller REST API.
//!
//! Scope: types only, no client code.
//!
//! Notes
//! - Field names follow the backend's snake_case JSON, except where the backend
//!   itself uses camelCase (`accessToken`).
//! - Date/time fields use `chrono` (`DateTime<Utc>`).
//! - Optional request fields are skipped when unset so partial payloads only carry
//!   what the caller chose to change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =====================
// Scalar ID newtype wrappers
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TelemetryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =====================
// Enums
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

/// Aggregation window for telemetry summaries.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    #[default]
    Day,
    Week,
    Month,
}

impl SummaryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryPeriod::Day => "day",
            SummaryPeriod::Week => "week",
            SummaryPeriod::Month => "month",
        }
    }
}

impl FromStr for SummaryPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(SummaryPeriod::Day),
            "week" => Ok(SummaryPeriod::Week),
            "month" => Ok(SummaryPeriod::Month),
            other => Err(format!("unknown summary period: {} (expected day, week or month)", other)),
        }
    }
}

// =====================
// Devices
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(default)]
    pub power_state: Option<bool>,
    /// Free-form JSON string holding device-specific configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

/// User-settable device fields, used for both create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<bool>,
}

impl DevicePayload {
    pub fn named(name: impl Into<String>) -> Self {
        DevicePayload {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Result of a synchronous live read against the physical device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveReading {
    pub power: f64,
}

// =====================
// Telemetry
// =====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub id: TelemetryId,
    pub device_id: DeviceId,
    pub timestamp: DateTime<Utc>,
    /// Watts
    pub power: f64,
    /// Volts
    #[serde(default)]
    pub voltage: Option<f64>,
    /// Amps
    #[serde(default)]
    pub current: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTelemetry {
    pub device_id: DeviceId,
    pub power: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    pub device_id: DeviceId,
    pub period: SummaryPeriod,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub count: u64,
    pub min_power: f64,
    pub avg_power: f64,
    pub max_power: f64,
    pub total_energy_kwh: f64,
    #[serde(default)]
    pub avg_voltage: Option<f64>,
    #[serde(default)]
    pub avg_current: Option<f64>,
}

// =====================
// Simulator
// =====================

/// Server-side defaults applied by the simulator endpoints.
pub const SIM_DEFAULT_BASE_POWER_W: f64 = 150.0;
pub const SIM_DEFAULT_VARIATION: f64 = 0.15;
pub const SIM_DEFAULT_BASE_VOLTAGE_V: f64 = 220.0;
pub const SIM_DEFAULT_BULK_COUNT: u32 = 24;
pub const SIM_MAX_BULK_COUNT: u32 = 100;
pub const SIM_DEFAULT_INTERVAL_SEC: u32 = 300;

/// Overrides for the server-side generator. Unset fields are left to the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_power: Option<f64>,
    /// Fraction of `base_power`, e.g. 0.15 for +/-15%.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_voltage: Option<f64>,
    /// Bulk mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Bulk mode only; spacing between generated historical readings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_sec: Option<u32>,
}

/// The configuration the server ends up using for a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSimulatorConfig {
    pub base_power: f64,
    pub variation: f64,
    pub base_voltage: f64,
    pub count: u32,
    pub interval_sec: u32,
}

impl SimulatorConfig {
    /// Mirror the server's defaulting and clamping for bulk generation.
    /// Non-positive counts and intervals fall back to the defaults; counts are capped.
    pub fn resolved_bulk(&self) -> ResolvedSimulatorConfig {
        let count = match self.count {
            Some(0) | None => SIM_DEFAULT_BULK_COUNT,
            Some(c) => c.min(SIM_MAX_BULK_COUNT),
        };
        let interval_sec = match self.interval_sec {
            Some(0) | None => SIM_DEFAULT_INTERVAL_SEC,
            Some(i) => i,
        };
        ResolvedSimulatorConfig {
            base_power: self.base_power.unwrap_or(SIM_DEFAULT_BASE_POWER_W),
            variation: self.variation.unwrap_or(SIM_DEFAULT_VARIATION),
            base_voltage: self.base_voltage.unwrap_or(SIM_DEFAULT_BASE_VOLTAGE_V),
            count,
            interval_sec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkSimulation {
    #[serde(default)]
    pub message: Option<String>,
    pub device_id: DeviceId,
    pub readings_created: u32,
    #[serde(default)]
    pub base_power: Option<f64>,
    #[serde(default)]
    pub variation: Option<f64>,
    #[serde(default)]
    pub interval_sec: Option<u32>,
}

// =====================
// Auth
// =====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub user: User,
}
