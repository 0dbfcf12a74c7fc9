//! Prometheus exposition of sensor readings.
//!
//! A fresh registry is built for every scrape, so each exposed value comes
//! from the reading taken for that scrape.

use bme280_exporter_hw::Reading;
use prometheus::{Encoder, Gauge, Registry, TextEncoder};

/// Temperature gauge name.
pub const TEMPERATURE: &str = "bme280_temperature";

/// Humidity gauge name.
pub const HUMIDITY: &str = "bme280_humidity";

/// Pressure gauge name.
pub const PRESSURE: &str = "bme280_pressure";

/// Content type of the text exposition format.
pub fn content_type() -> &'static str {
    prometheus::TEXT_FORMAT
}

/// Name, help text and value of each exported gauge.
fn gauges(reading: &Reading) -> [(&'static str, &'static str, f64); 3] {
    [
        (TEMPERATURE, "Temperature in degrees Celsius", reading.celsius()),
        (HUMIDITY, "Relative humidity %", reading.relative_humidity()),
        (PRESSURE, "Pressure in hPa", reading.hectopascals()),
    ]
}

/// Encodes a reading as three gauges in the text exposition format.
pub fn encode(reading: &Reading) -> prometheus::Result<String> {
    let registry = Registry::new();
    for (name, help, value) in gauges(reading) {
        let gauge = Gauge::new(name, help)?;
        gauge.set(value);
        registry.register(Box::new(gauge))?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
