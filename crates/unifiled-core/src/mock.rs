// In-memory controller that records every mutating call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::controller::ControllerApi;
use crate::error::CoreError;
use crate::model::{DeviceId, DeviceRecord, DeviceStatus, HardwareInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Output(String, bool),
    Brightness(String, u8),
}

pub(crate) struct MockController {
    devices: Mutex<Vec<DeviceRecord>>,
    calls: Mutex<Vec<Call>>,
    authenticated: AtomicBool,
    offline: AtomicBool,
}

impl MockController {
    pub(crate) fn new(devices: Vec<DeviceRecord>) -> Self {
        Self {
            devices: Mutex::new(devices),
            calls: Mutex::new(Vec::new()),
            authenticated: AtomicBool::new(true),
            offline: AtomicBool::new(false),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_devices(&self, devices: Vec<DeviceRecord>) {
        *self.devices.lock().unwrap_or_else(PoisonError::into_inner) = devices;
    }

    pub(crate) fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::SeqCst);
    }

    /// Make every request fail as if the controller were unreachable.
    pub(crate) fn set_offline(&self, value: bool) {
        self.offline.store(value, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), CoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CoreError::ConnectionFailed {
                url: "https://mock:20443".into(),
                reason: "connection refused".into(),
            });
        }
        Ok(())
    }

    /// Log the call and apply it to the stored device, like a controller would.
    fn record(&self, call: Call) {
        {
            let mut devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
            match &call {
                Call::Output(id, on) => {
                    if let Some(d) = devices.iter_mut().find(|d| d.id.as_str() == id) {
                        d.status.output = *on;
                    }
                }
                Call::Brightness(id, level) => {
                    if let Some(d) = devices.iter_mut().find(|d| d.id.as_str() == id) {
                        d.status.led = *level;
                    }
                }
            }
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl ControllerApi for MockController {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, CoreError> {
        self.check_online()?;
        Ok(self
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn set_device_output(&self, id: &DeviceId, on: bool) -> Result<(), CoreError> {
        self.check_online()?;
        self.record(Call::Output(id.to_string(), on));
        Ok(())
    }

    async fn set_device_brightness(&self, id: &DeviceId, brightness: u8) -> Result<(), CoreError> {
        self.check_online()?;
        self.record(Call::Brightness(id.to_string(), brightness));
        Ok(())
    }
}

/// A device record with the given live values.
pub(crate) fn record(id: &str, online: bool, output: bool, led: u8, power: f64) -> DeviceRecord {
    DeviceRecord {
        id: DeviceId::new(id),
        name: format!("Panel {id}"),
        online,
        status: DeviceStatus {
            output,
            led,
            power_watts: power,
        },
        info: HardwareInfo {
            model: "ULED-PANEL".into(),
            firmware: "1.2.3".into(),
        },
    }
}
