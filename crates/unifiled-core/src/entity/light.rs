// ── LED light adapter ──
//
// Maps one controller device onto the host `Light` contract. State is held
// on the host's 0-255 brightness scale and refreshed only by `update`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::{DeviceInfo, Entity, Light, LightFeature};
use crate::controller::ControllerApi;
use crate::error::CoreError;
use crate::model::{DeviceId, DeviceRecord};
use crate::scale;

const FEATURES: &[LightFeature] = &[LightFeature::Brightness];

/// Point-in-time view of a light, published by its worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightState {
    pub unique_id: DeviceId,
    pub name: String,
    pub is_on: bool,
    /// Host scale, 0-255.
    pub brightness: u8,
    pub available: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A dimmable UniFi LED panel.
pub struct LedLight<C> {
    client: Arc<C>,
    id: DeviceId,
    name: String,
    is_on: bool,
    brightness: u8,
    available: bool,
    device_info: DeviceInfo,
    last_updated: Option<DateTime<Utc>>,
}

impl<C: ControllerApi> LedLight<C> {
    /// Build a light from a device snapshot. No controller I/O.
    pub fn new(record: &DeviceRecord, client: Arc<C>) -> Self {
        Self {
            client,
            id: record.id.clone(),
            name: record.name.clone(),
            is_on: record.status.output,
            brightness: scale::to_255(record.status.led),
            available: record.online,
            device_info: DeviceInfo::from(record),
            last_updated: Some(Utc::now()),
        }
    }

    pub fn snapshot(&self) -> LightState {
        LightState {
            unique_id: self.id.clone(),
            name: self.name.clone(),
            is_on: self.is_on,
            brightness: self.brightness,
            available: self.available,
            last_updated: self.last_updated,
        }
    }

    fn apply(&mut self, record: &DeviceRecord) {
        self.is_on = record.status.output;
        self.brightness = scale::to_255(record.status.led);
        self.available = record.online;
        self.last_updated = Some(Utc::now());
    }
}

impl<C: ControllerApi> Entity for LedLight<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn unique_id(&self) -> &DeviceId {
        &self.id
    }

    fn available(&self) -> bool {
        self.available
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    async fn update(&mut self) -> Result<(), CoreError> {
        let result = match self.client.device(&self.id).await {
            Ok(Some(record)) => {
                self.apply(&record);
                debug!(
                    light = %self.id,
                    is_on = self.is_on,
                    brightness = self.brightness,
                    available = self.available,
                    "light updated"
                );
                return Ok(());
            }
            Ok(None) => Err(CoreError::DeviceNotFound {
                identifier: self.id.to_string(),
            }),
            Err(e) => Err(e),
        };

        self.available = false;
        if let Err(ref e) = result {
            warn!(light = %self.id, error = %e, "light update failed; keeping last-known state");
        }
        result
    }
}

impl<C: ControllerApi> Light for LedLight<C> {
    fn is_on(&self) -> bool {
        self.is_on
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }

    fn supported_features(&self) -> &[LightFeature] {
        FEATURES
    }

    async fn turn_on(&self, brightness: Option<u8>) -> Result<(), CoreError> {
        let level = scale::to_100(brightness.unwrap_or(u8::MAX));
        debug!(light = %self.id, level, "turning light on");

        // Two separate requests; a failure after the first is not rolled back.
        let result = async {
            self.client.set_device_brightness(&self.id, level).await?;
            self.client.set_device_output(&self.id, true).await
        }
        .await;

        if let Err(ref e) = result {
            warn!(light = %self.id, error = %e, "turn on failed");
        }
        result
    }

    async fn turn_off(&self) -> Result<(), CoreError> {
        debug!(light = %self.id, "turning light off");
        let result = self.client.set_device_output(&self.id, false).await;
        if let Err(ref e) = result {
            warn!(light = %self.id, error = %e, "turn off failed");
        }
        result
    }
}
