//! Linux I2C bus discovery.

use crate::{Bme280, Error, LinuxBme280, Options, Result, PRIMARY_ADDRESS, SECONDARY_ADDRESS};
use linux_embedded_hal::{Delay, I2cdev};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory holding the i2c-dev character devices.
const DEV_DIR: &str = "/dev";

/// Bus path meaning "first bus found".
pub const AUTO: &str = "auto";

/// Lists I2C character devices in `dir`, ordered by bus number.
fn buses_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut buses: Vec<(u32, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let number = name.to_str()?.strip_prefix("i2c-")?.parse().ok()?;
            Some((number, entry.path()))
        })
        .collect();

    buses.sort_by_key(|(number, _)| *number);
    buses.into_iter().map(|(_, path)| path).collect()
}

/// Lists the I2C buses available on this host.
pub fn find_buses() -> Vec<PathBuf> {
    buses_in(Path::new(DEV_DIR))
}

/// Resolves a configured bus path, picking the first bus for "auto".
pub fn resolve_bus(path: &str) -> Result<PathBuf> {
    if path.is_empty() || path.eq_ignore_ascii_case(AUTO) {
        let buses = find_buses();
        debug!("Found I2C buses: {:?}", buses);
        return buses.into_iter().next().ok_or(Error::BusNotFound);
    }
    Ok(PathBuf::from(path))
}

/// Opens an I2C bus by path ("auto" opens the first available bus).
pub fn open_bus(path: &str) -> Result<I2cdev> {
    let path = resolve_bus(path)?;
    let bus = I2cdev::new(&path).map_err(|e| Error::BusOpen {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    info!("Opened I2C bus {}", path.display());
    Ok(bus)
}

/// Opens the bus at `path` and initializes the sensor at `address` on it.
pub fn open_sensor(path: &str, address: u8, options: Options) -> Result<LinuxBme280> {
    let bus = open_bus(path)?;
    Bme280::new(bus, Delay, address, options)
}

/// Parses an I2C address: hex ("0x76"), decimal ("118"), or
/// "primary"/"secondary".
pub fn parse_address(s: &str) -> Result<u8> {
    let s = s.trim();
    let parsed = match s.to_lowercase().as_str() {
        "primary" => Ok(PRIMARY_ADDRESS),
        "secondary" => Ok(SECONDARY_ADDRESS),
        lower => match lower.strip_prefix("0x") {
            Some(hex) => u8::from_str_radix(hex, 16),
            None => lower.parse(),
        },
    };

    match parsed {
        // 7-bit addressing
        Ok(address) if address <= 0x7F => Ok(address),
        _ => Err(Error::InvalidAddress(s.to_string())),
    }
}
