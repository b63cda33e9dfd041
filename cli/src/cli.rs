use std::path::PathBuf;

use clap::Parser;

/// Append battery capacity, current and voltage to a log whenever capacity changes
///
/// Reads <root>/<charger>/{current_now,voltage_now} and <root>/<battery>/capacity,
/// where <root> is /sys/class/power_supply.
#[derive(Debug, Parser)]
#[command(name = "batlog", version, verbatim_doc_comment)]
pub struct Cli {
    /// Echo every recorded sample to the console
    #[arg(short, long)]
    pub verbose: bool,

    /// Short table: current in A, voltage in V
    #[arg(short, long)]
    pub short: bool,

    /// Capture interval in seconds [default: 1]
    #[arg(short = 't', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Output file, opened in append mode [default: ./batlog.txt]
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Charger device name, source of current and voltage [default: battery]
    #[arg(short, long, value_name = "NAME")]
    pub charger: Option<String>,

    /// Battery device name, source of capacity [default: battery]
    #[arg(short, long, value_name = "NAME")]
    pub battery: Option<String>,

    /// List power-supply devices and exit
    #[arg(short, long)]
    pub list: bool,

    /// Config file [default: <config dir>/batlog/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Power-supply root directory
    #[arg(long, value_name = "DIR", hide = true)]
    pub root: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}
