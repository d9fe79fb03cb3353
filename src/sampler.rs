use tokio::time::{self, Instant, MissedTickBehavior};
use tokio::{select, task};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::db::{Store, StoreError, Timestamp};
use crate::gpu_sensor::ReadTemperature;

/// Outcome of one sampling attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub timestamp: Timestamp,
    pub temperature: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub interval: Duration,
    pub duration: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            duration: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Elapsed,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSummary {
    pub ticks: u64,
    pub captured: u64,
    pub stop: StopReason,
}

/// Reads the sensor once and persists the value if there is one.
///
/// A missing value is logged and reported in the returned [`Tick`]; only a
/// store failure is an error.
pub async fn sample_once<S>(sensor: &Arc<S>, store: &Store) -> Result<Tick, StoreError>
where
    S: ReadTemperature + Send + Sync + 'static,
{
    let timestamp = Timestamp::now();

    let sensor = sensor.clone();
    let temperature = match task::spawn_blocking(move || sensor.read()).await {
        Ok(temperature) => temperature,
        Err(err) => {
            log::warn!("Sensor read task failed: {err}");
            None
        }
    };

    match temperature {
        Some(value) => {
            let reading = store.insert(timestamp, value)?;
            log::info!("GPU Temperature: {value}°C (reading #{})", reading.id);
        }
        None => log::warn!("No GPU temperature captured at {timestamp}"),
    }

    Ok(Tick {
        timestamp,
        temperature,
    })
}

/// Samples every `config.interval` until `config.duration` has elapsed or
/// `shutdown` completes, whichever comes first.
pub async fn monitor<S, F>(
    sensor: Arc<S>,
    store: &Store,
    config: MonitorConfig,
    shutdown: F,
) -> Result<MonitorSummary, StoreError>
where
    S: ReadTemperature + Send + Sync + 'static,
    F: Future<Output = ()>,
{
    log::info!(
        "Starting temperature monitoring for {:?} with {:?} intervals",
        config.duration,
        config.interval
    );

    // `time::interval` panics on a zero period.
    let period = config.interval.max(Duration::from_millis(1));
    let mut measurement_timer = time::interval(period);
    measurement_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // A duration past the end of the clock means run until interrupted.
    let started = Instant::now();
    let deadline = started.checked_add(config.duration);
    let expiry = time::sleep_until(deadline.unwrap_or(started));
    tokio::pin!(expiry);
    tokio::pin!(shutdown);

    let mut ticks = 0;
    let mut captured = 0;

    let stop = loop {
        select! {
            biased;

            _ = &mut shutdown => break StopReason::Interrupted,
            _ = &mut expiry, if deadline.is_some() => break StopReason::Elapsed,
            _ = measurement_timer.tick() => {
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    break StopReason::Elapsed;
                }

                let tick = sample_once(&sensor, store).await?;

                ticks += 1;
                if tick.temperature.is_some() {
                    captured += 1;
                }
            }
        }
    };

    Ok(MonitorSummary {
        ticks,
        captured,
        stop,
    })
}
