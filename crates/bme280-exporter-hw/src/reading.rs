//! Compensated sensor readings.

/// One environmental reading, as produced by a single forced measurement.
///
/// Values are rounded to fixed-point units; the accessors convert them to
/// the units exposed as metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reading {
    /// Temperature in hundredths of a degree Celsius.
    pub temperature: i32,
    /// Relative humidity in hundredths of a percent.
    pub humidity: u32,
    /// Pressure in pascals.
    pub pressure: u32,
}

impl Reading {
    /// Temperature in degrees Celsius.
    pub fn celsius(&self) -> f64 {
        f64::from(self.temperature) / 100.0
    }

    /// Relative humidity in percent.
    pub fn relative_humidity(&self) -> f64 {
        f64::from(self.humidity) / 100.0
    }

    /// Pressure in hectopascals.
    pub fn hectopascals(&self) -> f64 {
        f64::from(self.pressure) / 100.0
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.2}°C {:.2}%RH {:.2}hPa",
            self.celsius(),
            self.relative_humidity(),
            self.hectopascals()
        )
    }
}

impl<E> From<bme280::Measurements<E>> for Reading {
    fn from(m: bme280::Measurements<E>) -> Self {
        Self {
            temperature: (m.temperature * 100.0).round() as i32,
            humidity: (m.humidity * 100.0).round() as u32,
            pressure: m.pressure.round() as u32,
        }
    }
}
