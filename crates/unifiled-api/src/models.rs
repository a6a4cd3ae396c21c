// Controller response and request types
//
// Models for the UniFi LED controller's JSON API. Fields use
// `#[serde(default)]` liberally because firmware versions disagree on
// which keys are present; validation happens in `unifiled-core`.

use serde::{Deserialize, Serialize};

// ── Auth ─────────────────────────────────────────────────────────────

/// Body of `POST /v1/login`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from `POST /v1/login`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
}

// ── Device ───────────────────────────────────────────────────────────

/// Device object from `GET /v1/devices`.
///
/// ```json
/// { "id": "...", "name": "Hallway", "isOnline": true, "type": "LED",
///   "status": { "output": true, "led": 80, "power": 1500 },
///   "info": { "model": "ULED-INSTANT", "version": "1.4.8" } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedDevice {
    /// Empty when the controller omits it; rejected during validation.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub status: Option<LedStatus>,
    #[serde(default)]
    pub info: Option<LedInfo>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Live output state nested inside `LedDevice`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedStatus {
    #[serde(default)]
    pub output: Option<bool>,
    /// Brightness on the controller's 0-100 scale.
    #[serde(default)]
    pub led: Option<i64>,
    /// Power draw in watts.
    #[serde(default)]
    pub power: Option<f64>,
}

/// Hardware metadata nested inside `LedDevice`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedInfo {
    #[serde(default)]
    pub model: Option<String>,
    /// Firmware version.
    #[serde(default)]
    pub version: Option<String>,
}

impl LedDevice {
    pub fn output(&self) -> Option<bool> {
        self.status.as_ref().and_then(|s| s.output)
    }

    pub fn led(&self) -> Option<i64> {
        self.status.as_ref().and_then(|s| s.led)
    }

    pub fn power(&self) -> Option<f64> {
        self.status.as_ref().and_then(|s| s.power)
    }
}

// ── Commands ─────────────────────────────────────────────────────────

/// Body of `PUT /v1/devices/{id}`.
///
/// The controller takes every command value as a string:
/// `{"command": "config-output", "value": "1"}`.
#[derive(Debug, Serialize)]
pub(crate) struct DeviceCommand<'a> {
    pub command: &'a str,
    pub value: String,
}
