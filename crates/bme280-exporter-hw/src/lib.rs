//! BME280 Exporter Hardware Library
//!
//! Bosch BME280 (and BMP280) environmental sensors attached to a Linux I2C
//! bus, driven through the `bme280` crate. Measurements are taken in forced
//! mode, one per call.

pub mod bus;
pub mod error;
pub mod options;
pub mod reading;
pub mod sensor;

pub use error::{Error, Result};
pub use options::{Filter, Options, Oversampling};
pub use reading::Reading;
pub use sensor::Bme280;

/// Sensor on a Linux i2c-dev bus.
pub type LinuxBme280 = Bme280<linux_embedded_hal::I2cdev, linux_embedded_hal::Delay>;

/// I2C address with SDO pulled to ground.
pub const PRIMARY_ADDRESS: u8 = 0x76;

/// I2C address with SDO pulled to VDDIO.
pub const SECONDARY_ADDRESS: u8 = 0x77;
