//! Sensor command handlers.

use tabled::Tabled;

use unifiled_core::{PowerSensor, SensorState};

use crate::cli::{GlobalOpts, SensorsArgs, SensorsCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Online")]
    online: String,
}

pub async fn handle(args: SensorsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let platform = super::connect(global).await?;
    let color = output::should_color(global.color);

    match args.command {
        SensorsCommand::List => {
            let states: Vec<SensorState> =
                platform.sensors().iter().map(PowerSensor::snapshot).collect();
            let out = output::render_list(
                global.output,
                &states,
                |s| SensorRow {
                    id: s.unique_id.to_string(),
                    name: s.name.clone(),
                    power: format!("{:.3} {}", s.state, s.unit),
                    online: output::online(s.available, color),
                },
                |s| format!("{}\t{}", s.unique_id, s.state),
            )?;
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
