//! `watch`: run the supervisor and print every published state change.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use unifiled_core::platform::setup_with_retry;
use unifiled_core::{LightState, RetryPolicy, SensorState, Supervisor};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let controller_config = config::build_controller_config(global)?;
    let interval = args
        .interval
        .map_or(controller_config.scan_interval, Duration::from_secs);

    let cancel = CancellationToken::new();
    let signal = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, shutting down");
            }
            cancel.cancel();
        })
    };

    let policy = RetryPolicy {
        max_attempts: args.attempts,
        ..RetryPolicy::default()
    };
    let platform = match setup_with_retry(&controller_config, &policy, &cancel).await {
        Ok(platform) => platform,
        Err(_) if cancel.is_cancelled() => return Ok(()),
        Err(e) => {
            signal.abort();
            return Err(e.into());
        }
    };

    let supervisor = Supervisor::start(platform, interval);
    info!(
        lights = supervisor.lights().len(),
        sensors = supervisor.sensors().len(),
        interval_secs = interval.as_secs(),
        "watching controller"
    );

    let format = global.output;
    let color = output::should_color(global.color);
    let mut printers = Vec::new();
    for light in supervisor.lights() {
        printers.push(print_changes(light.subscribe(), cancel.clone(), move |s| {
            light_line(s, format, color)
        }));
    }
    for sensor in supervisor.sensors() {
        printers.push(print_changes(sensor.subscribe(), cancel.clone(), move |s| {
            sensor_line(s, format)
        }));
    }

    cancel.cancelled().await;
    supervisor.shutdown().await;
    for printer in printers {
        let _ = printer.await;
    }
    Ok(())
}

/// Print the current snapshot from `rx`, then each new one, until
/// cancelled or the worker exits.
fn print_changes<T, F>(
    rx: watch::Receiver<T>,
    cancel: CancellationToken,
    render: F,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> String + Send + 'static,
{
    tokio::spawn(forward_changes(rx, cancel, render, |line| {
        output::print_output(&line, false);
    }))
}

async fn forward_changes<T, F, E>(
    mut rx: watch::Receiver<T>,
    cancel: CancellationToken,
    render: F,
    mut emit: E,
) where
    F: Fn(&T) -> String,
    E: FnMut(String),
{
    // Workers skip their first tick, so nothing else is published for a
    // full interval.
    let initial = render(&rx.borrow_and_update());
    emit(initial);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = render(&rx.borrow_and_update());
                emit(line);
            }
        }
    }
}

fn timestamp(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map_or_else(|| "-".into(), |t| t.format("%H:%M:%S").to_string())
}

/// One record per line for JSON; one `---` document per snapshot for YAML.
fn structured<T: Serialize>(s: &T, format: OutputFormat) -> Option<String> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            Some(serde_json::to_string(s).unwrap_or_default())
        }
        OutputFormat::Yaml => Some(
            serde_yaml::to_string(s)
                .map(|doc| format!("---\n{}", doc.trim_end()))
                .unwrap_or_default(),
        ),
        OutputFormat::Table | OutputFormat::Plain => None,
    }
}

fn light_line(s: &LightState, format: OutputFormat, color: bool) -> String {
    structured(s, format).unwrap_or_else(|| {
        format!(
            "{} light  {} ({}) {} brightness={} online={}",
            timestamp(s.last_updated),
            s.unique_id,
            s.name,
            output::on_off(s.is_on, color),
            s.brightness,
            output::online(s.available, color),
        )
    })
}

fn sensor_line(s: &SensorState, format: OutputFormat) -> String {
    structured(s, format).unwrap_or_else(|| {
        format!(
            "{} sensor {} ({}) {:.3} {} online={}",
            timestamp(s.last_updated),
            s.unique_id,
            s.name,
            s.state,
            s.unit,
            output::online(s.available, false),
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::sync::mpsc;
    use unifiled_core::DeviceId;

    use super::*;

    fn hallway() -> LightState {
        LightState {
            unique_id: DeviceId::from("dev-1"),
            name: "Hallway".into(),
            is_on: true,
            brightness: 128,
            available: true,
            last_updated: None,
        }
    }

    #[test]
    fn yaml_lines_are_yaml_documents() {
        let line = light_line(&hallway(), OutputFormat::Yaml, false);
        assert!(line.starts_with("---\n"), "got: {line}");
        assert!(line.contains("unique_id: dev-1"));
        assert!(line.contains("brightness: 128"));
        assert!(!line.contains('{'));
    }

    #[test]
    fn json_lines_are_single_line_records() {
        let line = light_line(&hallway(), OutputFormat::Json, false);
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["brightness"], 128);
    }

    #[test]
    fn text_lines_show_state() {
        let line = light_line(&hallway(), OutputFormat::Plain, false);
        assert_eq!(line, "- light  dev-1 (Hallway) on brightness=128 online=yes");
    }

    #[tokio::test]
    async fn current_snapshot_is_emitted_before_any_change() {
        let (state_tx, state_rx) = watch::channel(1_u8);
        let (line_tx, mut line_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(forward_changes(
            state_rx,
            cancel.clone(),
            u8::to_string,
            move |line| {
                let _ = line_tx.send(line);
            },
        ));

        assert_eq!(line_rx.recv().await.unwrap(), "1");

        state_tx.send_replace(2);
        assert_eq!(line_rx.recv().await.unwrap(), "2");

        cancel.cancel();
        task.await.unwrap();
    }
}
