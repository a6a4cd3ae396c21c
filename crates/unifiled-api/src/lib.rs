// unifiled-api: Async Rust client for the UniFi LED controller API

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod scale;
pub mod transport;

pub use client::LedClient;
pub use error::Error;
pub use models::{LedDevice, LedInfo, LedStatus};
pub use transport::{TlsMode, TransportConfig};
