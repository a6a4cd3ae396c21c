// Device endpoints
//
// Reads go through `GET /v1/devices` (the controller has no per-device
// read); writes go through `PUT /v1/devices/{id}` with a
// `{"command", "value"}` body.

use tracing::{debug, warn};

use crate::client::LedClient;
use crate::error::Error;
use crate::models::{DeviceCommand, LedDevice};

impl LedClient {
    /// List every device known to the controller.
    ///
    /// Each element is decoded on its own; an element that does not match
    /// the device shape is skipped with a warning.
    /// `GET /v1/devices`
    pub async fn list_devices(&self) -> Result<Vec<LedDevice>, Error> {
        let url = self.api_url("devices")?;
        debug!("listing devices");
        let raw: Vec<serde_json::Value> = self.get(url).await?;
        Ok(raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<LedDevice>(value) {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!(error = %e, "skipping undecodable device record");
                    None
                }
            })
            .collect())
    }

    /// Get a single device by id.
    ///
    /// Filters the device list. Returns `None` if no device matches.
    pub async fn get_device(&self, id: &str) -> Result<Option<LedDevice>, Error> {
        let devices = self.list_devices().await?;
        Ok(devices.into_iter().find(|d| d.id == id))
    }

    /// Like [`get_device`](Self::get_device), but absence is an error.
    async fn require_device(&self, id: &str) -> Result<LedDevice, Error> {
        self.get_device(id).await?.ok_or_else(|| Error::Api {
            status: 404,
            message: format!("device {id} not reported by controller"),
        })
    }

    /// Switch a device's output on or off.
    ///
    /// `PUT /v1/devices/{id}` with `{"command": "config-output", "value": "1"}`
    pub async fn set_device_output(&self, id: &str, on: bool) -> Result<(), Error> {
        let url = self.device_url(id)?;
        debug!(id, on, "setting device output");
        let body = DeviceCommand {
            command: "config-output",
            value: if on { "1" } else { "0" }.to_owned(),
        };
        self.put(url, &body).await
    }

    /// Set a device's brightness on the controller's 0-100 scale.
    ///
    /// Values above 100 are clamped.
    /// `PUT /v1/devices/{id}` with `{"command": "config-brightness", "value": "50"}`
    pub async fn set_device_brightness(&self, id: &str, brightness: u8) -> Result<(), Error> {
        let url = self.device_url(id)?;
        let brightness = brightness.min(100);
        debug!(id, brightness, "setting device brightness");
        let body = DeviceCommand {
            command: "config-brightness",
            value: brightness.to_string(),
        };
        self.put(url, &body).await
    }

    // ── Per-field reads ──────────────────────────────────────────────

    /// Whether the light's output is on. A missing status reads as off.
    pub async fn light_state(&self, id: &str) -> Result<bool, Error> {
        Ok(self.require_device(id).await?.output().unwrap_or(false))
    }

    /// The light's brightness on the 0-100 scale, clamped into range.
    pub async fn light_brightness(&self, id: &str) -> Result<u8, Error> {
        let led = self.require_device(id).await?.led().unwrap_or(0).clamp(0, 100);
        Ok(u8::try_from(led).unwrap_or(100))
    }

    /// Whether the controller currently sees the device online.
    pub async fn light_available(&self, id: &str) -> Result<bool, Error> {
        Ok(self.require_device(id).await?.is_online)
    }
}
