//! Configuration management.

use anyhow::{Context, Result};
use bme280_exporter_hw::{bus, Filter, Options, Oversampling};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server listen address (e.g., ":9529" or "127.0.0.1:9529")
    #[serde(default = "default_listen")]
    pub listen: String,

    /// What to do when the sensor can't be read during a scrape
    #[serde(default)]
    pub on_read_error: ReadErrorPolicy,

    /// Sensor configuration
    #[serde(default)]
    pub sensor: SensorConfig,
}

/// Handling of sensor read failures during a scrape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReadErrorPolicy {
    /// Answer the scrape with 503 and keep serving
    #[default]
    FailRequest,
    /// Answer the scrape with 503, then shut down with a non-zero exit code
    Exit,
}

/// Sensor device configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// I2C bus device path or "auto" for the first available bus
    #[serde(default = "default_bus")]
    pub bus: String,

    /// I2C address ("0x76", "0x77", "primary" or "secondary")
    #[serde(default = "default_address")]
    pub address: String,

    /// Temperature oversampling (x1, x2, x4, x8, x16)
    #[serde(default = "default_oversampling")]
    pub temperature_oversampling: String,

    /// Pressure oversampling
    #[serde(default = "default_oversampling")]
    pub pressure_oversampling: String,

    /// Humidity oversampling
    #[serde(default = "default_oversampling")]
    pub humidity_oversampling: String,

    /// IIR filter coefficient (off, 2, 4, 8, 16)
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            address: default_address(),
            temperature_oversampling: default_oversampling(),
            pressure_oversampling: default_oversampling(),
            humidity_oversampling: default_oversampling(),
            filter: default_filter(),
        }
    }
}

// Default value functions
fn default_listen() -> String {
    ":9529".to_string()
}

fn default_bus() -> String {
    bus::AUTO.to_string()
}

fn default_address() -> String {
    "0x76".to_string()
}

fn default_oversampling() -> String {
    Oversampling::default().to_string()
}

fn default_filter() -> String {
    Filter::default().to_string()
}

impl SensorConfig {
    /// Parses the configured I2C address.
    pub fn address(&self) -> Result<u8> {
        bus::parse_address(&self.address).context("Invalid sensor address")
    }

    /// Parses the configured measurement settings.
    pub fn options(&self) -> Result<Options> {
        Ok(Options {
            temperature: self
                .temperature_oversampling
                .parse::<Oversampling>()
                .context("Invalid temperature oversampling")?,
            pressure: self
                .pressure_oversampling
                .parse::<Oversampling>()
                .context("Invalid pressure oversampling")?,
            humidity: self
                .humidity_oversampling
                .parse::<Oversampling>()
                .context("Invalid humidity oversampling")?,
            filter: self.filter.parse::<Filter>().context("Invalid filter")?,
        })
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Resolves the listen address. A bare ":port" means the IPv6 wildcard,
    /// which also accepts IPv4 connections on dual-stack hosts.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let listen = if self.listen.starts_with(':') {
            format!("[::]{}", self.listen)
        } else {
            self.listen.clone()
        };
        listen
            .to_socket_addrs()
            .with_context(|| format!("Invalid listen address: {}", self.listen))?
            .next()
            .with_context(|| format!("Listen address resolved to nothing: {}", self.listen))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            on_read_error: ReadErrorPolicy::default(),
            sensor: SensorConfig::default(),
        }
    }
}
