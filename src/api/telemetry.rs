use crate::client::{ApiClient, ClientError};
use crate::models::energy::{DeviceId, NewTelemetry, SummaryPeriod, TelemetryId, TelemetryReading, TelemetrySummary};

pub const DEFAULT_TELEMETRY_LIMIT: u32 = 100;

impl ApiClient {
    /// Readings across the caller's devices, or for one device when `device_id` is set.
    /// The server returns newest first; that order is not checked here.
    pub fn list_telemetry(
        &self,
        device_id: Option<DeviceId>,
        limit: Option<u32>,
    ) -> Result<Vec<TelemetryReading>, ClientError> {
        let mut q = Vec::new();
        if let Some(id) = device_id {
            q.push(("device_id", id.to_string()));
        }
        q.push(("limit", limit.unwrap_or(DEFAULT_TELEMETRY_LIMIT).to_string()));
        self.get_json("/telemetry", &q)
    }

    pub fn device_telemetry(&self, id: DeviceId, limit: Option<u32>) -> Result<Vec<TelemetryReading>, ClientError> {
        let q = [("limit", limit.unwrap_or(DEFAULT_TELEMETRY_LIMIT).to_string())];
        self.get_json(&format!("/devices/{}/telemetry", id), &q)
    }

    /// One reading per device, the most recent each.
    pub fn latest_telemetry(&self) -> Result<Vec<TelemetryReading>, ClientError> {
        self.get_json("/telemetry/latest", &[])
    }

    pub fn device_latest_telemetry(&self, id: DeviceId) -> Result<TelemetryReading, ClientError> {
        self.get_json(&format!("/devices/{}/telemetry/latest", id), &[])
    }

    pub fn telemetry_summary(&self, id: DeviceId, period: SummaryPeriod) -> Result<TelemetrySummary, ClientError> {
        let q = [("period", period.as_str().to_string())];
        self.get_json(&format!("/devices/{}/telemetry/summary", id), &q)
    }

    pub fn create_telemetry(&self, reading: &NewTelemetry) -> Result<TelemetryReading, ClientError> {
        self.post_json("/telemetry", reading)
    }

    pub fn delete_telemetry(&self, id: TelemetryId) -> Result<(), ClientError> {
        self.delete(&format!("/telemetry/{}", id))
    }
}
