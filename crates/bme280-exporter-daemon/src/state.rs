//! Application state management.

use bme280_exporter_hw::Reading;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::config::ReadErrorPolicy;
use crate::sensors::EnvironmentSensor;

/// Failure to obtain a reading for a scrape.
#[derive(Debug, Error)]
pub enum SenseError {
    /// The sensor itself reported an error.
    #[error("sensor read failed: {0}")]
    Sensor(#[from] bme280_exporter_hw::Error),

    /// The blocking read task panicked or was cancelled.
    #[error("sensor task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Shared state handed to every request handler.
pub struct AppState {
    /// The single sensor handle. The lock serializes bus access between
    /// overlapping scrapes.
    sensor: Arc<Mutex<Box<dyn EnvironmentSensor>>>,
    sensor_name: String,
    policy: ReadErrorPolicy,
    read_errors: AtomicU64,
    fatal_tx: mpsc::Sender<String>,
}

impl AppState {
    /// Creates the state. `fatal_tx` is signalled when a read error should
    /// bring the daemon down.
    pub fn new(
        sensor: Box<dyn EnvironmentSensor>,
        policy: ReadErrorPolicy,
        fatal_tx: mpsc::Sender<String>,
    ) -> Self {
        Self {
            sensor_name: sensor.name(),
            sensor: Arc::new(Mutex::new(sensor)),
            policy,
            read_errors: AtomicU64::new(0),
            fatal_tx,
        }
    }

    /// Returns the sensor's name.
    pub fn sensor_name(&self) -> &str {
        &self.sensor_name
    }

    /// Takes a fresh reading on a blocking thread.
    pub async fn sense(&self) -> Result<Reading, SenseError> {
        let sensor = self.sensor.clone();
        let reading = tokio::task::spawn_blocking(move || {
            // sense() keeps no partial state, so a poisoned lock is still usable
            let mut sensor = sensor.lock().unwrap_or_else(|e| e.into_inner());
            sensor.sense()
        })
        .await??;

        debug!("Read {}", reading);
        Ok(reading)
    }

    /// Records a failed read and applies the configured policy.
    pub fn read_failed(&self, e: &SenseError) {
        let total = self.read_errors.fetch_add(1, Ordering::Relaxed) + 1;
        warn!("Failed to read {}: {} ({} errors so far)", self.sensor_name, e, total);

        if self.policy == ReadErrorPolicy::Exit {
            error!("Read errors are fatal, shutting down");
            // A full channel means shutdown is already underway
            let _ = self.fatal_tx.try_send(e.to_string());
        }
    }

    /// Number of failed reads since startup.
    pub fn read_errors(&self) -> u64 {
        self.read_errors.load(Ordering::Relaxed)
    }
}
