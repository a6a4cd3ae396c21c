//! Device model, host entity adapters, and polling workers for UniFi LED
//! controllers.
//!
//! This crate sits between `unifiled-api` and the CLI:
//!
//! - **[`ControllerApi`]**: The seam the adapters talk to. [`Controller`]
//!   implements it over the HTTP client, validating raw device payloads
//!   into [`DeviceRecord`]s and logging in again when a session expires.
//!
//! - **Entities** ([`entity`]): [`LedLight`] and [`PowerSensor`] map one
//!   device record onto the host's [`Light`] and [`Sensor`] contracts,
//!   converting brightness between the controller's 0-100 scale and the
//!   host's 0-255 scale.
//!
//! - **[`platform`]**: Connects, enumerates devices once, and builds one
//!   light and one power sensor per device. Setup failures are split into
//!   retryable ([`SetupError::NotReady`]) and permanent
//!   ([`SetupError::Invalid`]).
//!
//! - **[`Supervisor`]**: Runs each entity in its own task, polling on an
//!   interval and publishing snapshots over `watch` channels.

pub mod config;
pub mod controller;
pub mod convert;
pub mod entity;
pub mod error;
pub mod model;
pub mod platform;
pub mod worker;

#[cfg(test)]
pub(crate) mod mock;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, TlsVerification};
pub use controller::{Controller, ControllerApi};
pub use entity::{
    DeviceInfo, Entity, LedLight, Light, LightFeature, LightState, PowerSensor, Sensor,
    SensorState,
};
pub use error::{CoreError, SetupError};
pub use model::{DeviceId, DeviceRecord, DeviceStatus, HardwareInfo};
pub use platform::{Platform, RetryPolicy};
pub use worker::{LightHandle, SensorHandle, Supervisor};

pub use unifiled_api::scale;
