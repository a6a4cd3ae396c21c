// ── Device domain types ──

use serde::{Deserialize, Serialize};

use super::device_id::DeviceId;

/// One device as reported by the controller, after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub name: String,
    pub online: bool,
    pub status: DeviceStatus,
    pub info: HardwareInfo,
}

/// Live output state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub output: bool,
    /// Brightness on the controller's 0-100 scale.
    pub led: u8,
    /// Power draw in watts.
    pub power_watts: f64,
}

/// Hardware metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub model: String,
    pub firmware: String,
}

impl DeviceRecord {
    /// Power draw in kilowatts.
    pub fn power_kilowatts(&self) -> f64 {
        self.status.power_watts / 1000.0
    }
}
