//! Measurement settings.

use crate::{Error, Result};
use std::str::FromStr;

/// Oversampling setting for one measurement channel.
///
/// Every channel is always measured; the driver has no setting for skipping
/// one, so "skip" is rejected when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Oversampling {
    X1,
    X2,
    #[default]
    X4,
    X8,
    X16,
}

impl Oversampling {
    /// Number of samples averaged per measurement.
    pub fn factor(&self) -> u32 {
        match self {
            Oversampling::X1 => 1,
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
            Oversampling::X8 => 8,
            Oversampling::X16 => 16,
        }
    }
}

impl FromStr for Oversampling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "x1" | "1" => Ok(Oversampling::X1),
            "x2" | "2" => Ok(Oversampling::X2),
            "x4" | "4" => Ok(Oversampling::X4),
            "x8" | "8" => Ok(Oversampling::X8),
            "x16" | "16" => Ok(Oversampling::X16),
            _ => Err(Error::InvalidOversampling(s.to_string())),
        }
    }
}

impl std::fmt::Display for Oversampling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.factor())
    }
}

impl From<Oversampling> for bme280::Oversampling {
    fn from(os: Oversampling) -> Self {
        match os {
            Oversampling::X1 => bme280::Oversampling::Oversampling1X,
            Oversampling::X2 => bme280::Oversampling::Oversampling2X,
            Oversampling::X4 => bme280::Oversampling::Oversampling4X,
            Oversampling::X8 => bme280::Oversampling::Oversampling8X,
            Oversampling::X16 => bme280::Oversampling::Oversampling16X,
        }
    }
}

/// IIR filter coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    Off,
    F2,
    F4,
    F8,
    F16,
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Ok(Filter::Off),
            "2" => Ok(Filter::F2),
            "4" => Ok(Filter::F4),
            "8" => Ok(Filter::F8),
            "16" => Ok(Filter::F16),
            _ => Err(Error::InvalidFilter(s.to_string())),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::Off => write!(f, "off"),
            Filter::F2 => write!(f, "2"),
            Filter::F4 => write!(f, "4"),
            Filter::F8 => write!(f, "8"),
            Filter::F16 => write!(f, "16"),
        }
    }
}

impl From<Filter> for bme280::IIRFilter {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Off => bme280::IIRFilter::Off,
            Filter::F2 => bme280::IIRFilter::Coefficient2,
            Filter::F4 => bme280::IIRFilter::Coefficient4,
            Filter::F8 => bme280::IIRFilter::Coefficient8,
            Filter::F16 => bme280::IIRFilter::Coefficient16,
        }
    }
}

/// Per-channel oversampling and filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    pub temperature: Oversampling,
    pub pressure: Oversampling,
    pub humidity: Oversampling,
    pub filter: Filter,
}

impl std::fmt::Display for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "temperature {}, pressure {}, humidity {}, filter {}",
            self.temperature, self.pressure, self.humidity, self.filter
        )
    }
}

impl From<Options> for bme280::Configuration {
    fn from(options: Options) -> Self {
        bme280::Configuration::default()
            .with_temperature_oversampling(options.temperature.into())
            .with_pressure_oversampling(options.pressure.into())
            .with_humidity_oversampling(options.humidity.into())
            .with_iir_filter(options.filter.into())
    }
}
