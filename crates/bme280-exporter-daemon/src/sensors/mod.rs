//! Environmental sensors.
//!
//! The daemon talks to its sensor through [`EnvironmentSensor`] so the web
//! layer can be exercised without hardware.

#[cfg(test)]
pub mod fake;

use anyhow::{Context, Result};
use bme280_exporter_hw::{bus, LinuxBme280, Reading};
use tracing::info;

use crate::config::SensorConfig;

/// Trait for sensors that produce temperature, humidity and pressure.
pub trait EnvironmentSensor: Send {
    /// Returns a human-readable name, e.g. "BME280 at 0x76".
    fn name(&self) -> String;

    /// Takes one fresh reading. Blocks for the duration of the bus
    /// transaction.
    fn sense(&mut self) -> bme280_exporter_hw::Result<Reading>;
}

impl EnvironmentSensor for LinuxBme280 {
    fn name(&self) -> String {
        format!("BME280 at 0x{:02X}", self.address())
    }

    fn sense(&mut self) -> bme280_exporter_hw::Result<Reading> {
        Ok(Reading::from(self.measure()?))
    }
}

/// Opens the configured bus and initializes the sensor on it.
pub fn open(config: &SensorConfig) -> Result<Box<dyn EnvironmentSensor>> {
    let address = config.address()?;
    let options = config.options()?;

    let device = bus::open_sensor(&config.bus, address, options)
        .with_context(|| format!("Failed to open sensor at 0x{:02X}", address))?;

    info!("Sensor ready: {} ({})", EnvironmentSensor::name(&device), options);
    Ok(Box::new(device))
}
