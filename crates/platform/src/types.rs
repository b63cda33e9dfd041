//! Shared types for power-supply telemetry.

use std::fmt;

/// Kind of a power-supply device, as reported by its `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupplyKind {
    /// A battery pack (reports `capacity`)
    Battery,
    /// AC adapter / mains charger
    Mains,
    /// USB power delivery port
    Usb,
    /// Uninterruptible power supply
    Ups,
    /// Wireless charging pad
    Wireless,
    /// Type attribute missing or not recognised
    #[default]
    Unknown,
}

impl SupplyKind {
    /// Returns a human-readable label for the supply kind.
    pub fn label(&self) -> &'static str {
        match self {
            SupplyKind::Battery => "Battery",
            SupplyKind::Mains => "Mains",
            SupplyKind::Usb => "USB",
            SupplyKind::Ups => "UPS",
            SupplyKind::Wireless => "Wireless",
            SupplyKind::Unknown => "Unknown",
        }
    }

    /// Parse the raw `type` attribute. Matching ignores case and surrounding whitespace.
    pub fn from_attr(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("battery") {
            SupplyKind::Battery
        } else if raw.eq_ignore_ascii_case("mains") {
            SupplyKind::Mains
        } else if raw.to_ascii_lowercase().starts_with("usb") {
            SupplyKind::Usb
        } else if raw.eq_ignore_ascii_case("ups") {
            SupplyKind::Ups
        } else if raw.eq_ignore_ascii_case("wireless") {
            SupplyKind::Wireless
        } else {
            SupplyKind::Unknown
        }
    }

    /// Returns true if the device is a battery.
    pub fn is_battery(&self) -> bool {
        matches!(self, SupplyKind::Battery)
    }
}

impl fmt::Display for SupplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
