//! BME280 / BMP280 sensor handle.
//!
//! Wraps the `bme280` driver together with the delay source it needs, so
//! callers can take a measurement without passing the delay around.

use bme280::i2c::BME280;
use bme280::Measurements;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use tracing::{debug, info};

use crate::{Options, Result};

/// Sensor on an I2C bus, configured for forced-mode measurements.
///
/// The chip performs one conversion per [`Bme280::measure`] call and returns
/// to sleep on its own afterwards.
pub struct Bme280<I, D> {
    device: BME280<I>,
    delay: D,
    address: u8,
    options: Options,
}

impl<I, D> Bme280<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Detects, resets and configures the sensor at `address`.
    pub fn new(bus: I, mut delay: D, address: u8, options: Options) -> Result<Self> {
        let mut device = BME280::new(bus, address);
        device.init_with_config(&mut delay, options.into())?;
        info!("Initialized sensor at 0x{:02X} ({})", address, options);

        Ok(Self {
            device,
            delay,
            address,
            options,
        })
    }

    /// Performs one forced-mode measurement.
    pub fn measure(&mut self) -> Result<Measurements<I::Error>> {
        let measurements = self.device.measure(&mut self.delay)?;
        debug!(
            "Measured {:.2}°C {:.2}%RH {:.0}Pa",
            measurements.temperature, measurements.humidity, measurements.pressure
        );
        Ok(measurements)
    }

    /// Returns the I2C address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Returns the measurement settings.
    pub fn options(&self) -> &Options {
        &self.options
    }
}
