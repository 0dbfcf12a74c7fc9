//! Error types for the BME280 hardware library.

use embedded_hal::i2c::{Error as _, ErrorKind};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the sensor.
#[derive(Error, Debug)]
pub enum Error {
    /// No I2C character device was found under /dev.
    #[error("no I2C bus found (looked for /dev/i2c-*)")]
    BusNotFound,

    /// The I2C character device could not be opened.
    #[error("failed to open I2C bus {path}: {reason}")]
    BusOpen { path: String, reason: String },

    /// An I2C transaction failed.
    #[error("I2C bus error: {0:?}")]
    Bus(ErrorKind),

    /// The chip id register holds an id we don't know how to drive.
    #[error("unsupported chip (expected BME280 id 0x60 or BMP280 id 0x58)")]
    UnsupportedChip,

    /// The device was used before its calibration was read.
    #[error("device not ready")]
    NotReady,

    /// The device returned data that can't be compensated.
    #[error("invalid data from device: {0}")]
    InvalidData(String),

    /// I2C address could not be parsed.
    #[error("invalid I2C address: {0}")]
    InvalidAddress(String),

    /// Oversampling setting could not be parsed.
    #[error("invalid oversampling: {0}")]
    InvalidOversampling(String),

    /// IIR filter setting could not be parsed.
    #[error("invalid filter coefficient: {0}")]
    InvalidFilter(String),
}

impl<E: embedded_hal::i2c::Error> From<bme280::Error<E>> for Error {
    fn from(e: bme280::Error<E>) -> Self {
        match e {
            bme280::Error::Bus(e) => Error::Bus(e.kind()),
            bme280::Error::UnsupportedChip => Error::UnsupportedChip,
            bme280::Error::NoCalibrationData | bme280::Error::Delay => Error::NotReady,
            bme280::Error::InvalidData => {
                Error::InvalidData("unexpected register contents".to_string())
            }
            bme280::Error::CompensationFailed => {
                Error::InvalidData("compensation failed".to_string())
            }
        }
    }
}
