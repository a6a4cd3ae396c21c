// ── Host entity contract ──
//
// What a home-automation host sees for each controller device: an
// `Entity` with identity, availability and device metadata, refined into
// a dimmable `Light` or a numeric `Sensor`.

pub mod light;
pub mod sensor;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{DeviceId, DeviceRecord};

pub use light::{LedLight, LightState};
pub use sensor::{PowerSensor, SensorState};

/// Integration domain used in device registry identifiers.
pub const DOMAIN: &str = "unifiled";

/// Manufacturer reported for every device.
pub const MANUFACTURER: &str = "Ubiquiti Networks";

/// Registry metadata for the physical device behind an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// `(domain, device id)` pairs identifying the device.
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
}

impl From<&DeviceRecord> for DeviceInfo {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            identifiers: vec![(DOMAIN.to_owned(), record.id.to_string())],
            name: record.name.clone(),
            manufacturer: MANUFACTURER.to_owned(),
            model: record.info.model.clone(),
            sw_version: record.info.firmware.clone(),
        }
    }
}

/// Optional light capabilities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LightFeature {
    Brightness,
}

/// Capability set common to every entity.
pub trait Entity: Send {
    fn name(&self) -> &str;

    /// Stable identifier, derived solely from the controller device id.
    fn unique_id(&self) -> &DeviceId;

    fn available(&self) -> bool;

    fn device_info(&self) -> &DeviceInfo;

    /// When state was last read from the controller.
    fn last_updated(&self) -> Option<DateTime<Utc>>;

    /// Pull fresh state from the controller.
    ///
    /// On failure the last-known state is kept, the entity is marked
    /// unavailable, and the error is returned for the caller to log.
    fn update(&mut self) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// A dimmable on/off light.
pub trait Light: Entity {
    fn is_on(&self) -> bool;

    /// Brightness on the host's 0-255 scale.
    fn brightness(&self) -> u8;

    fn supported_features(&self) -> &[LightFeature];

    /// Turn the light on, at `brightness` (0-255) or full brightness.
    fn turn_on(&self, brightness: Option<u8>) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn turn_off(&self) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// A read-only numeric sensor.
pub trait Sensor: Entity {
    fn state(&self) -> f64;

    fn unit_of_measurement(&self) -> &'static str;
}
