//! Telemetry source trait and value normalisation.

use std::io;
use std::path::Path;

/// Strip a single trailing newline from a raw attribute value.
///
/// Only values longer than one byte are touched. A one-byte value, including a bare `"\n"`,
/// is returned unchanged.
pub fn strip_newline(raw: &str) -> &str {
    if raw.len() > 1 {
        raw.strip_suffix('\n').unwrap_or(raw)
    } else {
        raw
    }
}

/// Something that can produce the current value of a telemetry attribute.
///
/// Implementations open the attribute, read it and release it within a single call, so no
/// handle outlives the read. Values come back as raw text with [`strip_newline`] applied;
/// callers decide how to interpret them.
pub trait TelemetrySource {
    /// Read the attribute at `path`.
    fn read_value(&mut self, path: &Path) -> io::Result<String>;
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn read_value(&mut self, path: &Path) -> io::Result<String> {
        (**self).read_value(path)
    }
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for &mut T {
    fn read_value(&mut self, path: &Path) -> io::Result<String> {
        (**self).read_value(path)
    }
}
