// ── Platform setup ──
//
// Connects to a controller, enumerates its devices once, and builds one
// light and one power sensor per device. A controller that cannot be
// reached or rejects the credentials is `SetupError::NotReady`, which the
// host answers by trying again later.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ControllerConfig;
use crate::controller::{Controller, ControllerApi};
use crate::entity::{LedLight, PowerSensor};
use crate::error::{CoreError, SetupError};

/// The entities created for one controller.
pub struct Platform<C> {
    client: Arc<C>,
    lights: Vec<LedLight<C>>,
    sensors: Vec<PowerSensor<C>>,
}

impl<C: ControllerApi> Platform<C> {
    /// Build entities from an already-connected controller.
    ///
    /// Lists devices exactly once; every adapter shares `client`.
    pub async fn from_controller(client: Arc<C>) -> Result<Self, SetupError> {
        if !client.is_authenticated() {
            return Err(SetupError::NotReady(CoreError::AuthenticationFailed {
                message: "controller session is not authenticated".into(),
            }));
        }

        let devices = client.list_devices().await?;

        let lights: Vec<_> = devices
            .iter()
            .map(|record| LedLight::new(record, Arc::clone(&client)))
            .collect();
        let sensors: Vec<_> = devices
            .iter()
            .map(|record| PowerSensor::new(record, Arc::clone(&client)))
            .collect();

        info!(
            lights = lights.len(),
            sensors = sensors.len(),
            "platform set up"
        );

        Ok(Self {
            client,
            lights,
            sensors,
        })
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn lights(&self) -> &[LedLight<C>] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [LedLight<C>] {
        &mut self.lights
    }

    pub fn sensors(&self) -> &[PowerSensor<C>] {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut [PowerSensor<C>] {
        &mut self.sensors
    }

    /// Split into the shared client and the entity lists.
    pub fn into_parts(self) -> (Arc<C>, Vec<LedLight<C>>, Vec<PowerSensor<C>>) {
        (self.client, self.lights, self.sensors)
    }
}

/// Connect to the configured controller and build its entities.
pub async fn setup(config: &ControllerConfig) -> Result<Platform<Controller>, SetupError> {
    let controller = Controller::new(config.clone()).map_err(SetupError::Invalid)?;
    controller.connect().await?;
    Platform::from_controller(Arc::new(controller)).await
}

/// [`setup`] with capped exponential back-off on [`SetupError::NotReady`].
pub async fn setup_with_retry(
    config: &ControllerConfig,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Platform<Controller>, SetupError> {
    retry_setup(policy, cancel, || setup(config)).await
}

// ── Retry ────────────────────────────────────────────────────────

/// Back-off schedule for setup retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Default: 5.
    pub max_attempts: u32,

    /// Delay after the first failure. Default: 2s.
    pub initial_delay: Duration,

    /// Upper bound on the delay. Default: 60s.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Run `attempt` until it succeeds, fails permanently, exhausts the
/// policy, or `cancel` fires. Cancellation returns the last error.
pub async fn retry_setup<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T, SetupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SetupError>>,
{
    let mut retry: u32 = 0;

    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !err.is_retryable() || retry + 1 >= policy.max_attempts.max(1) {
            return Err(err);
        }

        let delay = policy.delay(retry);
        warn!(
            error = %err,
            attempt = retry + 1,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "controller not ready; retrying setup"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(err),
            () = tokio::time::sleep(delay) => {}
        }

        retry += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entity::{Entity, Light, Sensor};
    use crate::mock::{MockController, record};

    fn not_ready() -> SetupError {
        SetupError::NotReady(CoreError::Timeout)
    }

    #[tokio::test]
    async fn one_light_and_one_sensor_per_device() {
        let mock = Arc::new(MockController::new(vec![
            record("a", true, true, 100, 1500.0),
            record("b", false, false, 0, 0.0),
        ]));

        let platform = Platform::from_controller(mock).await.unwrap();

        let light_ids: Vec<_> = platform.lights().iter().map(|l| l.unique_id().as_str()).collect();
        let sensor_ids: Vec<_> = platform.sensors().iter().map(|s| s.unique_id().as_str()).collect();
        assert_eq!(light_ids, vec!["a", "b"]);
        assert_eq!(sensor_ids, vec!["a", "b"]);

        assert!(platform.lights()[0].is_on());
        assert_eq!(platform.lights()[0].brightness(), 255);
        assert!(!platform.lights()[1].available());
        assert!((platform.sensors()[0].state() - 1.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn entities_share_one_client() {
        let mock = Arc::new(MockController::new(vec![record("a", true, true, 100, 0.0)]));
        let platform = Platform::from_controller(Arc::clone(&mock)).await.unwrap();
        assert!(Arc::ptr_eq(platform.client(), &mock));
        // test handle + platform + one light + one sensor
        assert_eq!(Arc::strong_count(&mock), 4);
    }

    #[tokio::test]
    async fn unauthenticated_controller_is_not_ready() {
        let mock = MockController::new(vec![record("a", true, true, 100, 0.0)]);
        mock.set_authenticated(false);

        let err = Platform::from_controller(Arc::new(mock)).await.err().unwrap();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn unreachable_controller_is_not_ready() {
        let mock = MockController::new(Vec::new());
        mock.set_offline(true);

        let err = Platform::from_controller(Arc::new(mock)).await.err().unwrap();
        assert!(matches!(err, SetupError::NotReady(CoreError::ConnectionFailed { .. })));
    }

    #[test]
    fn delay_doubles_up_to_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(5));
        assert_eq!(policy.delay(40), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_ready() {
        let calls = AtomicU32::new(0);
        let result = retry_setup(&RetryPolicy::default(), &CancellationToken::new(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err(not_ready()) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        let result: Result<(), _> = retry_setup(&policy, &CancellationToken::new(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(not_ready()) }
        })
        .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_setup(&RetryPolicy::default(), &CancellationToken::new(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SetupError::Invalid(CoreError::Config {
                    message: "bad url".into(),
                }))
            }
        })
        .await;

        assert!(!result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_retrying() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_setup(&RetryPolicy::default(), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(not_ready()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
