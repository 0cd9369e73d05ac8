use crate::client::{ApiClient, ClientError};
use crate::models::energy::{BulkSimulation, DeviceId, SimulatorConfig, TelemetryReading};

impl ApiClient {
    /// Generate and store one simulated reading server-side.
    /// With no config the body is `{}` and the server defaults apply.
    pub fn simulate_telemetry(
        &self,
        id: DeviceId,
        config: Option<&SimulatorConfig>,
    ) -> Result<TelemetryReading, ClientError> {
        let default = SimulatorConfig::default();
        self.post_json(&format!("/simulator/generate/{}", id), config.unwrap_or(&default))
    }

    /// Generate a run of historical readings ending now.
    pub fn simulate_bulk_telemetry(
        &self,
        id: DeviceId,
        config: Option<&SimulatorConfig>,
    ) -> Result<BulkSimulation, ClientError> {
        let default = SimulatorConfig::default();
        self.post_json(&format!("/simulator/bulk/{}", id), config.unwrap_or(&default))
    }
}
