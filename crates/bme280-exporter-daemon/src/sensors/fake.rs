//! Scripted sensor used in tests.

use super::EnvironmentSensor;
use bme280_exporter_hw::{Error, Reading, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fake sensor returning scripted readings. `None` entries fail with
/// [`Error::NotReady`].
pub struct FakeSensor {
    script: VecDeque<Option<Reading>>,
    fallback: Option<Reading>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeSensor {
    fn with_script(script: Vec<Option<Reading>>, fallback: Option<Reading>) -> Self {
        Self {
            script: script.into(),
            fallback,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always returns `reading`.
    pub fn returning(reading: Reading) -> Self {
        Self::with_script(Vec::new(), Some(reading))
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self::with_script(Vec::new(), None)
    }

    /// Returns the scripted results in order, then fails.
    pub fn scripted(script: Vec<Option<Reading>>) -> Self {
        Self::with_script(script, None)
    }

    /// Holds the sensor for `delay` on every read.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Counter of `sense` calls.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Highest number of overlapping `sense` calls seen.
    pub fn max_in_flight(&self) -> Arc<AtomicUsize> {
        self.max_in_flight.clone()
    }
}

impl EnvironmentSensor for FakeSensor {
    fn name(&self) -> String {
        "fake".to_string()
    }

    fn sense(&mut self) -> Result<Reading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let next = self.script.pop_front().unwrap_or(self.fallback);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        next.ok_or(Error::NotReady)
    }
}
