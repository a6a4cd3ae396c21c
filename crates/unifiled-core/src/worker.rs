// ── Entity workers ──
//
// One tokio task per entity. Each task owns its adapter outright, polls it
// on a fixed interval, and publishes a snapshot on a `watch` channel after
// every update. Light commands arrive over an `mpsc` channel with a
// `oneshot` reply, so a command and a poll never run on one entity at the
// same time. Failures stay inside the task that hit them.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::controller::ControllerApi;
use crate::entity::{Entity, LedLight, Light, LightState, PowerSensor, SensorState};
use crate::error::CoreError;
use crate::model::DeviceId;
use crate::platform::Platform;

const COMMAND_BUFFER: usize = 16;

/// Shortest accepted poll interval.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(1);

// ── Commands ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum LightCommand {
    TurnOn { brightness: Option<u8> },
    TurnOff,
    Refresh,
}

struct LightEnvelope {
    command: LightCommand,
    response_tx: oneshot::Sender<Result<(), CoreError>>,
}

type RefreshEnvelope = oneshot::Sender<Result<(), CoreError>>;

// ── Handles ──────────────────────────────────────────────────────

/// Handle to a running light worker. Cheap to clone.
#[derive(Clone)]
pub struct LightHandle {
    id: DeviceId,
    command_tx: mpsc::Sender<LightEnvelope>,
    state_rx: watch::Receiver<LightState>,
}

impl LightHandle {
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Turn the light on at `brightness` (0-255), or full brightness.
    pub async fn turn_on(&self, brightness: Option<u8>) -> Result<(), CoreError> {
        self.send(LightCommand::TurnOn { brightness }).await
    }

    pub async fn turn_off(&self) -> Result<(), CoreError> {
        self.send(LightCommand::TurnOff).await
    }

    /// Poll the controller now instead of waiting for the next tick.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.send(LightCommand::Refresh).await
    }

    /// The most recently published snapshot.
    pub fn state(&self) -> LightState {
        self.state_rx.borrow().clone()
    }

    /// A receiver that is notified of snapshots published from now on.
    pub fn subscribe(&self) -> watch::Receiver<LightState> {
        let mut rx = self.state_rx.clone();
        rx.borrow_and_update();
        rx
    }

    async fn send(&self, command: LightCommand) -> Result<(), CoreError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(LightEnvelope {
                command,
                response_tx: tx,
            })
            .await
            .map_err(|_| self.stopped())?;
        rx.await.map_err(|_| self.stopped())?
    }

    fn stopped(&self) -> CoreError {
        CoreError::WorkerStopped {
            identifier: self.id.to_string(),
        }
    }
}

/// Handle to a running sensor worker. Cheap to clone.
#[derive(Clone)]
pub struct SensorHandle {
    id: DeviceId,
    refresh_tx: mpsc::Sender<RefreshEnvelope>,
    state_rx: watch::Receiver<SensorState>,
}

impl SensorHandle {
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Poll the controller now instead of waiting for the next tick.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let stopped = || CoreError::WorkerStopped {
            identifier: self.id.to_string(),
        };
        let (tx, rx) = oneshot::channel();
        self.refresh_tx.send(tx).await.map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())?
    }

    pub fn state(&self) -> SensorState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SensorState> {
        let mut rx = self.state_rx.clone();
        rx.borrow_and_update();
        rx
    }
}

// ── Supervisor ───────────────────────────────────────────────────

/// Owns the worker tasks for every entity of one platform.
pub struct Supervisor {
    lights: Vec<LightHandle>,
    sensors: Vec<SensorHandle>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Spawn one worker per entity. Must be called inside a tokio runtime.
    ///
    /// `scan_interval` is raised to [`MIN_SCAN_INTERVAL`] if shorter.
    pub fn start<C: ControllerApi>(platform: Platform<C>, scan_interval: Duration) -> Self {
        let interval = scan_interval.max(MIN_SCAN_INTERVAL);
        let cancel = CancellationToken::new();
        let (_client, lights, sensors) = platform.into_parts();

        let mut tasks = Vec::with_capacity(lights.len() + sensors.len());
        let mut light_handles = Vec::with_capacity(lights.len());
        let mut sensor_handles = Vec::with_capacity(sensors.len());

        for light in lights {
            let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
            let (state_tx, state_rx) = watch::channel(light.snapshot());
            light_handles.push(LightHandle {
                id: light.unique_id().clone(),
                command_tx,
                state_rx,
            });
            tasks.push(tokio::spawn(light_task(
                light,
                command_rx,
                state_tx,
                interval,
                cancel.clone(),
            )));
        }

        for sensor in sensors {
            let (refresh_tx, refresh_rx) = mpsc::channel(COMMAND_BUFFER);
            let (state_tx, state_rx) = watch::channel(sensor.snapshot());
            sensor_handles.push(SensorHandle {
                id: sensor.unique_id().clone(),
                refresh_tx,
                state_rx,
            });
            tasks.push(tokio::spawn(sensor_task(
                sensor,
                refresh_rx,
                state_tx,
                interval,
                cancel.clone(),
            )));
        }

        debug!(
            workers = tasks.len(),
            interval_secs = interval.as_secs(),
            "supervisor started"
        );

        Self {
            lights: light_handles,
            sensors: sensor_handles,
            cancel,
            tasks,
        }
    }

    pub fn lights(&self) -> &[LightHandle] {
        &self.lights
    }

    pub fn sensors(&self) -> &[SensorHandle] {
        &self.sensors
    }

    pub fn light(&self, id: &DeviceId) -> Option<&LightHandle> {
        self.lights.iter().find(|h| &h.id == id)
    }

    pub fn sensor(&self, id: &DeviceId) -> Option<&SensorHandle> {
        self.sensors.iter().find(|h| &h.id == id)
    }

    /// Token that stops every worker when cancelled.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Stop every worker and wait for them to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
        debug!("supervisor stopped");
    }
}

// ── Tasks ────────────────────────────────────────────────────────

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn light_task<C: ControllerApi>(
    mut light: LedLight<C>,
    mut rx: mpsc::Receiver<LightEnvelope>,
    state_tx: watch::Sender<LightState>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = ticker(interval);
    ticker.tick().await; // construction snapshot is fresh

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(envelope) = rx.recv() => {
                let result = run_light_command(&mut light, envelope.command).await;
                state_tx.send_replace(light.snapshot());
                let _ = envelope.response_tx.send(result);
            }
            _ = ticker.tick() => {
                // update() logs its own failures
                let _ = light.update().await;
                state_tx.send_replace(light.snapshot());
            }
        }
    }

    debug!(light = %light.unique_id(), "light worker exiting");
}

/// Apply a command, then re-read state so the snapshot reflects it.
async fn run_light_command<C: ControllerApi>(
    light: &mut LedLight<C>,
    command: LightCommand,
) -> Result<(), CoreError> {
    match command {
        LightCommand::TurnOn { brightness } => light.turn_on(brightness).await?,
        LightCommand::TurnOff => light.turn_off().await?,
        LightCommand::Refresh => return light.update().await,
    }
    let _ = light.update().await;
    Ok(())
}

async fn sensor_task<C: ControllerApi>(
    mut sensor: PowerSensor<C>,
    mut rx: mpsc::Receiver<RefreshEnvelope>,
    state_tx: watch::Sender<SensorState>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = ticker(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(response_tx) = rx.recv() => {
                let result = sensor.update().await;
                state_tx.send_replace(sensor.snapshot());
                let _ = response_tx.send(result);
            }
            _ = ticker.tick() => {
                let _ = sensor.update().await;
                state_tx.send_replace(sensor.snapshot());
            }
        }
    }

    debug!(sensor = %sensor.unique_id(), "sensor worker exiting");
}
