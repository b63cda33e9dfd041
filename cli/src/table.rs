//! Fixed-width ASCII table rendering for the capture log.

const LONG_BORDER: &str = "+----------+-------------+-------------+-------------+\n";
const SHORT_BORDER: &str = "+----------+------+------+------+\n";

const MICRO_PER_UNIT: f64 = 1_000_000.0;

/// Output layout, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    /// Raw micro-unit readings in wide columns
    #[default]
    Long,
    /// Amps and volts with two decimals in narrow columns
    Short,
}

impl TableFormat {
    pub fn from_short_flag(short: bool) -> Self {
        if short {
            TableFormat::Short
        } else {
            TableFormat::Long
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TableFormat::Long => "long",
            TableFormat::Short => "short",
        }
    }

    fn border(&self) -> &'static str {
        match self {
            TableFormat::Long => LONG_BORDER,
            TableFormat::Short => SHORT_BORDER,
        }
    }

    /// Banner written before the first row of a process run.
    ///
    /// Starts with a blank line so runs appended to the same file stay apart.
    pub fn header(&self) -> String {
        let titles = match self {
            TableFormat::Long => "|   Time   | Current(uA) | Voltage(uV) | Capacity(%) |\n",
            TableFormat::Short => "|   Time   | C(A) | V(V) | C(%) |\n",
        };
        format!("\n{border}{titles}{border}", border = self.border())
    }

    /// One data row followed by its closing border.
    pub fn row(&self, sample: &Sample) -> String {
        let line = match self {
            TableFormat::Long => format!(
                "| {:>8} | {:>11} | {:>11} | {:>11} |\n",
                sample.time, sample.current, sample.voltage, sample.capacity
            ),
            TableFormat::Short => format!(
                "| {:>8} | {} | {} | {:>4} |\n",
                sample.time,
                format_base_units(micro_to_base(&sample.current)),
                format_base_units(micro_to_base(&sample.voltage)),
                sample.capacity
            ),
        };
        format!("{}{}", line, self.border())
    }
}

/// One reading, formatted and dropped within a single iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// `HH:MM:SS`, UTC
    pub time: String,
    pub current: String,
    pub voltage: String,
    pub capacity: String,
}

/// Integer prefix of `raw`, the way C's `atoi` reads it.
///
/// Leading whitespace and one sign are accepted, parsing stops at the first non-digit, and
/// anything unparseable (empty, garbage, overflow) yields 0.
pub fn lenient_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<i64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) => 0,
    }
}

/// Convert a raw micro-unit reading (uA, uV) to base units (A, V).
pub fn micro_to_base(raw: &str) -> f64 {
    lenient_int(raw) as f64 / MICRO_PER_UNIT
}

/// Two decimals. Values that round to zero print as `0.00`, never `-0.00`.
pub fn format_base_units(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    if formatted == "-0.00" {
        "0.00".to_string()
    } else {
        formatted
    }
}
