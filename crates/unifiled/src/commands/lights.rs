//! Light command handlers.

use tabled::Tabled;
use tracing::warn;

use unifiled_core::{Controller, Entity, LedLight, Light, LightState};

use crate::cli::{GlobalOpts, LightsArgs, LightsCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LightRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Brightness")]
    brightness: u8,
    #[tabled(rename = "Online")]
    online: String,
}

impl LightRow {
    fn new(s: &LightState, color: bool) -> Self {
        Self {
            id: s.unique_id.to_string(),
            name: s.name.clone(),
            state: output::on_off(s.is_on, color),
            brightness: s.brightness,
            online: output::online(s.available, color),
        }
    }
}

fn detail(s: &LightState) -> String {
    [
        format!("ID:         {}", s.unique_id),
        format!("Name:       {}", s.name),
        format!("State:      {}", if s.is_on { "on" } else { "off" }),
        format!("Brightness: {}", s.brightness),
        format!("Online:     {}", if s.available { "yes" } else { "no" }),
    ]
    .join("\n")
}

fn line(s: &LightState) -> String {
    format!(
        "{}\t{}\t{}",
        s.unique_id,
        if s.is_on { "on" } else { "off" },
        s.brightness
    )
}

fn find<'a>(
    lights: &'a mut [LedLight<Controller>],
    id: &str,
) -> Result<&'a mut LedLight<Controller>, CliError> {
    lights
        .iter_mut()
        .find(|l| l.unique_id().as_str() == id)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "light".into(),
            identifier: id.into(),
            list_command: "lights list".into(),
        })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: LightsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut platform = super::connect(global).await?;
    let color = output::should_color(global.color);

    let rendered = match args.command {
        LightsCommand::List => {
            let states: Vec<LightState> = platform.lights().iter().map(LedLight::snapshot).collect();
            output::render_list(global.output, &states, |s| LightRow::new(s, color), line)?
        }

        LightsCommand::On { id, brightness } => {
            let light = find(platform.lights_mut(), &id)?;
            light.turn_on(brightness).await?;
            refresh(light).await;
            output::render_single(global.output, &light.snapshot(), detail, line)?
        }

        LightsCommand::Off { id } => {
            let light = find(platform.lights_mut(), &id)?;
            light.turn_off().await?;
            refresh(light).await;
            output::render_single(global.output, &light.snapshot(), detail, line)?
        }
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Re-read state after a command; the command itself already succeeded.
async fn refresh(light: &mut LedLight<Controller>) {
    if let Err(e) = light.update().await {
        warn!(error = %e, "could not refresh light state after command");
    }
}
