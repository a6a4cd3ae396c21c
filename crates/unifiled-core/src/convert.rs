// ── API-to-domain conversion ──
//
// Bridges raw `unifiled_api` device payloads into validated
// `DeviceRecord`s. Missing optional blocks fall back to defaults; values
// that cannot be represented (blank id, brightness outside 0-100) reject
// the record.

use unifiled_api::LedDevice;

use crate::error::CoreError;
use crate::model::{DeviceId, DeviceRecord, DeviceStatus, HardwareInfo};

/// Placeholder for model / firmware the controller did not report.
const UNKNOWN: &str = "unknown";

impl TryFrom<LedDevice> for DeviceRecord {
    type Error = CoreError;

    fn try_from(raw: LedDevice) -> Result<Self, Self::Error> {
        // Kept verbatim; only the emptiness check trims.
        let id = raw.id.as_str();
        if id.trim().is_empty() {
            return Err(CoreError::InvalidDeviceRecord {
                identifier: "<empty>".into(),
                reason: "device id is empty".into(),
            });
        }
        if matches!(id, "." | "..") {
            return Err(CoreError::InvalidDeviceRecord {
                identifier: id.to_owned(),
                reason: "device id is a relative path segment".into(),
            });
        }

        let led = match raw.led() {
            None => 0,
            Some(led) => u8::try_from(led)
                .ok()
                .filter(|l| *l <= 100)
                .ok_or_else(|| CoreError::InvalidDeviceRecord {
                    identifier: id.to_owned(),
                    reason: format!("brightness {led} outside 0-100"),
                })?,
        };

        let power_watts = raw.power().unwrap_or(0.0);
        if !power_watts.is_finite() || power_watts < 0.0 {
            return Err(CoreError::InvalidDeviceRecord {
                identifier: id.to_owned(),
                reason: format!("power {power_watts} is not a non-negative number"),
            });
        }

        let status = DeviceStatus {
            output: raw.output().unwrap_or(false),
            led,
            power_watts,
        };

        let info = raw.info.unwrap_or_default();
        let info = HardwareInfo {
            model: info.model.unwrap_or_else(|| UNKNOWN.into()),
            firmware: info.version.unwrap_or_else(|| UNKNOWN.into()),
        };

        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| id.to_owned());

        Ok(DeviceRecord {
            id: DeviceId::new(id),
            name,
            online: raw.is_online,
            status,
            info,
        })
    }
}
