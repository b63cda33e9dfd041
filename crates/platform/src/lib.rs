//! Linux power-supply telemetry for batlog.
//!
//! The kernel exposes each power-supply device as a directory under
//! `/sys/class/power_supply`, with one small text file per attribute. This crate derives the
//! attribute paths the sampler needs, reads them through the [`TelemetrySource`] trait, and
//! enumerates the available devices.
//!
//! # Example
//!
//! ```no_run
//! use batlog_platform::{SysfsSource, TelemetryPaths, TelemetrySource};
//!
//! let paths = TelemetryPaths::sysfs("BAT0", "BAT0");
//! let mut source = SysfsSource::new();
//! let capacity = source.read_value(&paths.capacity)?;
//! println!("Capacity: {}%", capacity);
//! # Ok::<(), std::io::Error>(())
//! ```

mod paths;
mod source;
mod sysfs;
mod types;

pub use paths::{TelemetryPaths, CAPACITY, CURRENT_NOW, POWER_SUPPLY_PATH, VOLTAGE_NOW};
pub use source::{strip_newline, TelemetrySource};
pub use sysfs::{find_battery, list_supplies, DiscoveryError, PowerSupply, SysfsSource};
pub use types::SupplyKind;
