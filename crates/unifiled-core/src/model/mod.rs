// ── Domain model ──
//
// Validated, strongly-typed views of what the controller reports. Raw
// `unifiled_api` payloads are converted in `crate::convert`; nothing past
// that boundary sees an untyped JSON map.

pub mod device;
pub mod device_id;

pub use device::{DeviceRecord, DeviceStatus, HardwareInfo};
pub use device_id::DeviceId;
