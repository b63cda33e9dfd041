use std::path::{Path, PathBuf};

/// Root of the kernel's power-supply class devices.
pub const POWER_SUPPLY_PATH: &str = "/sys/class/power_supply";

pub const CURRENT_NOW: &str = "current_now";
pub const VOLTAGE_NOW: &str = "voltage_now";
pub const CAPACITY: &str = "capacity";

/// The three attribute files the sampler reads.
///
/// Current and voltage come from the charger device, capacity from the battery device. On most
/// laptops both names point at the same `BAT0`-style directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPaths {
    pub current: PathBuf,
    pub voltage: PathBuf,
    pub capacity: PathBuf,
}

impl TelemetryPaths {
    pub fn new(root: impl AsRef<Path>, charger: &str, battery: &str) -> Self {
        let root = root.as_ref();
        Self {
            current: root.join(charger).join(CURRENT_NOW),
            voltage: root.join(charger).join(VOLTAGE_NOW),
            capacity: root.join(battery).join(CAPACITY),
        }
    }

    /// Paths under the standard sysfs root.
    pub fn sysfs(charger: &str, battery: &str) -> Self {
        Self::new(POWER_SUPPLY_PATH, charger, battery)
    }
}
