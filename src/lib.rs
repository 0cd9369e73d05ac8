//! Client for the energy-controller backend: typed REST calls, the shared session,
//! and the per-device preference caches kept in local storage.

pub mod models {
    pub mod energy;
}

pub mod api {
    pub mod auth;
    pub mod devices;
    pub mod simulator;
    pub mod telemetry;
}
pub mod client;
pub mod config;
pub mod dotenv;
pub mod session;
pub mod storage;
pub mod settings {
    pub mod cache;
    pub mod simulation;
    pub mod thresholds;
}
