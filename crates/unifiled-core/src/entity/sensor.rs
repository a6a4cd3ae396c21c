// ── Power sensor adapter ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::{DeviceInfo, Entity, Sensor};
use crate::controller::ControllerApi;
use crate::error::CoreError;
use crate::model::{DeviceId, DeviceRecord};

/// Unit reported for power readings.
pub const POWER_UNIT: &str = "kW";

/// Point-in-time view of a sensor, published by its worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: DeviceId,
    pub name: String,
    pub state: f64,
    pub unit: &'static str,
    pub available: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Power draw of one device, in kilowatts.
pub struct PowerSensor<C> {
    client: Arc<C>,
    id: DeviceId,
    name: String,
    state: f64,
    available: bool,
    device_info: DeviceInfo,
    last_updated: Option<DateTime<Utc>>,
}

impl<C: ControllerApi> PowerSensor<C> {
    pub fn new(record: &DeviceRecord, client: Arc<C>) -> Self {
        Self {
            client,
            id: record.id.clone(),
            name: record.name.clone(),
            state: record.power_kilowatts(),
            available: record.online,
            device_info: DeviceInfo::from(record),
            last_updated: Some(Utc::now()),
        }
    }

    pub fn snapshot(&self) -> SensorState {
        SensorState {
            unique_id: self.id.clone(),
            name: self.name.clone(),
            state: self.state,
            unit: POWER_UNIT,
            available: self.available,
            last_updated: self.last_updated,
        }
    }
}

impl<C: ControllerApi> Entity for PowerSensor<C> {
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
        let devices = match self.client.list_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                self.available = false;
                warn!(sensor = %self.id, error = %e, "sensor update failed; keeping last value");
                return Err(e);
            }
        };

        let Some(record) = devices.iter().find(|d| d.id == self.id) else {
            // The device left the controller; the last reading is retained.
            self.available = false;
            warn!(sensor = %self.id, "device no longer reported by controller");
            return Err(CoreError::DeviceNotFound {
                identifier: self.id.to_string(),
            });
        };

        self.state = record.power_kilowatts();
        self.available = record.online;
        self.last_updated = Some(Utc::now());
        debug!(sensor = %self.id, state = self.state, "sensor updated");
        Ok(())
    }
}

impl<C: ControllerApi> Sensor for PowerSensor<C> {
    fn state(&self) -> f64 {
        self.state
    }

    fn unit_of_measurement(&self) -> &'static str {
        POWER_UNIT
    }
}
