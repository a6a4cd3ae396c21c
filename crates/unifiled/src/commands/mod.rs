//! Command handlers: bridge CLI args -> core platform -> output formatting.

pub mod config_cmd;
pub mod lights;
pub mod sensors;
pub mod watch;

use unifiled_core::platform::{self, Platform};
use unifiled_core::Controller;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// Resolve the controller config from flags + profile, log in, and build
/// the entity platform.
pub async fn connect(global: &GlobalOpts) -> Result<Platform<Controller>, CliError> {
    let controller_config = config::build_controller_config(global)?;
    tracing::debug!(url = %controller_config.url, "setting up platform");
    Ok(platform::setup(&controller_config).await?)
}
