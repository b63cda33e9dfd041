use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::paths::{CAPACITY, CURRENT_NOW, VOLTAGE_NOW};
use crate::source::{strip_newline, TelemetrySource};
use crate::types::SupplyKind;

/// Upper bound on how much of an attribute is read. Power-supply attributes are short integers.
const MAX_VALUE_BYTES: u64 = 64;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("power-supply root {0:?} does not exist")]
    RootMissing(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads attributes straight from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysfsSource;

impl SysfsSource {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetrySource for SysfsSource {
    fn read_value(&mut self, path: &Path) -> io::Result<String> {
        let file = File::open(path)?;
        let mut buf = Vec::with_capacity(MAX_VALUE_BYTES as usize);
        file.take(MAX_VALUE_BYTES).read_to_end(&mut buf)?;

        let raw = String::from_utf8_lossy(&buf);
        let value = strip_newline(&raw).to_string();
        trace!(path = ?path, value = %value, "Read attribute");
        Ok(value)
    }
}

/// A device directory under the power-supply root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerSupply {
    pub name: String,
    pub path: PathBuf,
    pub kind: SupplyKind,
    pub has_current: bool,
    pub has_voltage: bool,
    pub has_capacity: bool,
}

impl PowerSupply {
    fn probe(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().into_owned();
        let kind = fs::read_to_string(path.join("type"))
            .map(|t| SupplyKind::from_attr(&t))
            .unwrap_or_default();

        Some(Self {
            name,
            kind,
            has_current: path.join(CURRENT_NOW).is_file(),
            has_voltage: path.join(VOLTAGE_NOW).is_file(),
            has_capacity: path.join(CAPACITY).is_file(),
            path,
        })
    }

    /// Whether the device can serve as the charger (`-c`) source.
    pub fn can_supply_charger(&self) -> bool {
        self.has_current && self.has_voltage
    }

    /// Whether the device can serve as the battery (`-b`) source.
    pub fn can_supply_battery(&self) -> bool {
        self.has_capacity
    }
}

/// List every device under `root`, sorted by name.
pub fn list_supplies(root: impl AsRef<Path>) -> Result<Vec<PowerSupply>, DiscoveryError> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(DiscoveryError::RootMissing(root.to_path_buf()));
    }

    let entries = fs::read_dir(root).map_err(|source| DiscoveryError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut supplies: Vec<PowerSupply> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(PowerSupply::probe)
        .collect();
    supplies.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(supplies)
}

/// First device whose `type` is `Battery`, if any.
pub fn find_battery(root: impl AsRef<Path>) -> Option<PowerSupply> {
    list_supplies(root)
        .ok()?
        .into_iter()
        .find(|supply| supply.kind.is_battery())
}
