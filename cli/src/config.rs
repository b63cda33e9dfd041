use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use batlog_platform::{TelemetryPaths, POWER_SUPPLY_PATH};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::cli::Cli;
use crate::table::TableFormat;

pub const DEFAULT_OUTPUT: &str = "./batlog.txt";
pub const DEFAULT_DEVICE: &str = "battery";
pub const DEFAULT_INTERVAL_SECS: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("interval must be at least 1 second")]
    ZeroInterval,

    #[error("{role} device name {name:?} must be a single non-empty path component")]
    InvalidDevice { role: &'static str, name: String },

    #[error("output path must not be empty")]
    EmptyOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "off" | "none" => LogLevel::Off,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }

    pub fn as_tracing_level(&self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub interval_secs: u64,
    pub output: PathBuf,
    pub charger: String,
    pub battery: String,
    pub verbose: bool,
    pub short: bool,
    pub log_level: LogLevel,
    pub log_to_file: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            output: PathBuf::from(DEFAULT_OUTPUT),
            charger: DEFAULT_DEVICE.to_string(),
            battery: DEFAULT_DEVICE.to_string(),
            verbose: false,
            short: false,
            log_level: LogLevel::Info,
            log_to_file: false,
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("batlog")
}

pub fn runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("batlog")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

impl UserConfig {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply command-line flags on top of the file values. Flags always win.
    pub fn merge_with_args(&mut self, cli: &Cli) {
        if let Some(secs) = cli.interval {
            self.interval_secs = secs;
        }
        if let Some(ref output) = cli.output {
            self.output = output.clone();
        }
        if let Some(ref charger) = cli.charger {
            self.charger = charger.clone();
        }
        if let Some(ref battery) = cli.battery {
            self.battery = battery.clone();
        }
        if cli.verbose {
            self.verbose = true;
        }
        if cli.short {
            self.short = true;
        }
        if let Some(ref level) = cli.log_level {
            self.log_level = LogLevel::from_str(level);
        }
    }

    /// Validate and freeze into the configuration the sampler runs with.
    pub fn into_sampler_config(self, root: Option<&Path>) -> Result<SamplerConfig, ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        validate_device("charger", &self.charger)?;
        validate_device("battery", &self.battery)?;
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutput);
        }

        let root = root
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(POWER_SUPPLY_PATH));
        let paths = TelemetryPaths::new(&root, &self.charger, &self.battery);

        Ok(SamplerConfig {
            interval: Duration::from_secs(self.interval_secs),
            output: self.output,
            charger: self.charger,
            battery: self.battery,
            verbose: self.verbose,
            format: TableFormat::from_short_flag(self.short),
            root,
            paths,
        })
    }
}

fn validate_device(role: &'static str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(ConfigError::InvalidDevice {
            role,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Validated, immutable configuration for one capture run.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    pub interval: Duration,
    pub output: PathBuf,
    pub charger: String,
    pub battery: String,
    pub verbose: bool,
    pub format: TableFormat,
    pub root: PathBuf,
    pub paths: TelemetryPaths,
}
