//! The capture loop.
//!
//! Each iteration reads the battery capacity and, only when its text differs from the last
//! recorded value, reads current and voltage and appends one table row to the output file.
//! Every failure is local to its iteration: it is logged, nothing is written, and the next
//! tick tries again.

use std::fs::OpenOptions;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use batlog_platform::{TelemetryPaths, TelemetrySource};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::SamplerConfig;
use crate::table::{Sample, TableFormat};

/// Baseline before anything has been recorded. No real reading compares equal to it.
pub const UNSET_CAPACITY: &str = "-1";

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("telemetry source {path:?} unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output file {path:?} unavailable: {source}")]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SampleError {
    pub fn path(&self) -> &Path {
        match self {
            SampleError::SourceUnavailable { path, .. } => path,
            SampleError::SinkUnavailable { path, .. } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, SampleError>;

/// What a single iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Recorded(Sample),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SamplerStats {
    pub iterations: u64,
    pub recorded: u64,
    pub failed: u64,
}

pub struct Sampler<S> {
    source: S,
    paths: TelemetryPaths,
    output: PathBuf,
    format: TableFormat,
    verbose: bool,
    clock: fn() -> DateTime<Utc>,
    last_capacity: String,
    header_written: bool,
    stats: SamplerStats,
}

impl<S: TelemetrySource> Sampler<S> {
    pub fn new(config: &SamplerConfig, source: S) -> Self {
        Self {
            source,
            paths: config.paths.clone(),
            output: config.output.clone(),
            format: config.format,
            verbose: config.verbose,
            clock: Utc::now,
            last_capacity: UNSET_CAPACITY.to_string(),
            header_written: false,
            stats: SamplerStats::default(),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    #[cfg(test)]
    pub fn last_capacity(&self) -> &str {
        &self.last_capacity
    }

    #[cfg(test)]
    pub fn header_written(&self) -> bool {
        self.header_written
    }

    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    #[cfg(test)]
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Run one iteration.
    ///
    /// State (`last_capacity`, `header_written`) only changes once the record has been
    /// appended, so a failed iteration leaves the pending capacity change to be retried.
    pub fn sample_once(&mut self) -> Result<Outcome> {
        let capacity = read_source(&mut self.source, &self.paths.capacity)?;

        if self.verbose {
            println!("capacity: {} => {} ?", self.last_capacity, capacity);
        }

        if capacity == self.last_capacity {
            return Ok(Outcome::Unchanged);
        }

        let current = read_source(&mut self.source, &self.paths.current)?;
        let voltage = read_source(&mut self.source, &self.paths.voltage)?;

        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output)
            .map_err(|source| SampleError::SinkUnavailable {
                path: self.output.clone(),
                source,
            })?;

        let sample = Sample {
            time: (self.clock)().format("%H:%M:%S").to_string(),
            current,
            voltage,
            capacity,
        };

        let mut record = String::new();
        if !self.header_written {
            record.push_str(&self.format.header());
        }
        record.push_str(&self.format.row(&sample));

        out.write_all(record.as_bytes())
            .map_err(|source| SampleError::SinkUnavailable {
                path: self.output.clone(),
                source,
            })?;

        self.header_written = true;
        self.last_capacity.clone_from(&sample.capacity);

        if self.verbose {
            println!("time_now:    {}", sample.time);
            println!("current_now: {}", sample.current);
            println!("voltage_now: {}", sample.voltage);
            println!("capacity:    {}", sample.capacity);
        }

        debug!(
            time = %sample.time,
            current = %sample.current,
            voltage = %sample.voltage,
            capacity = %sample.capacity,
            "Recorded sample"
        );

        Ok(Outcome::Recorded(sample))
    }

    /// One iteration with failures logged and swallowed.
    pub fn poll(&mut self) -> Option<Sample> {
        self.stats.iterations += 1;

        match self.sample_once() {
            Ok(Outcome::Recorded(sample)) => {
                self.stats.recorded += 1;
                Some(sample)
            }
            Ok(Outcome::Unchanged) => None,
            Err(e) => {
                self.stats.failed += 1;
                warn!(path = ?e.path(), "{}", e);
                None
            }
        }
    }

    /// Poll every `interval` until `shutdown` resolves, then hand the sampler back.
    ///
    /// Shutdown is only observed between iterations, never in the middle of one.
    pub async fn run<F>(mut self, interval: Duration, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.poll();

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }

        self
    }
}

fn read_source<S: TelemetrySource>(source: &mut S, path: &Path) -> Result<String> {
    source
        .read_value(path)
        .map_err(|source| SampleError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::fs;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    use super::*;
    use crate::config::UserConfig;

    const LONG_HEADER: &str = "\n\
        +----------+-------------+-------------+-------------+\n\
        |   Time   | Current(uA) | Voltage(uV) | Capacity(%) |\n\
        +----------+-------------+-------------+-------------+\n";
    const LONG_BORDER: &str = "+----------+-------------+-------------+-------------+\n";

    /// Capacity follows a script (`None` = attribute missing) and repeats its last value once
    /// the script runs out. Current and voltage are fixed and can be switched off.
    struct ScriptedSource {
        paths: TelemetryPaths,
        capacity: VecDeque<Option<&'static str>>,
        repeat: Option<&'static str>,
        current: Option<&'static str>,
        voltage: Option<&'static str>,
        exhausted: Option<oneshot::Sender<()>>,
    }

    impl ScriptedSource {
        fn new(paths: &TelemetryPaths, capacity: &[Option<&'static str>]) -> Self {
            Self {
                paths: paths.clone(),
                capacity: capacity.iter().copied().collect(),
                repeat: None,
                current: Some("123456"),
                voltage: Some("4123456"),
                exhausted: None,
            }
        }

        fn notify_when_exhausted(mut self, tx: oneshot::Sender<()>) -> Self {
            self.exhausted = Some(tx);
            self
        }
    }

    fn missing(path: &Path) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, format!("{:?} not found", path))
    }

    impl TelemetrySource for ScriptedSource {
        fn read_value(&mut self, path: &Path) -> io::Result<String> {
            let value = if path == self.paths.capacity {
                match self.capacity.pop_front() {
                    Some(next) => {
                        self.repeat = next;
                        if self.capacity.is_empty() {
                            if let Some(tx) = self.exhausted.take() {
                                let _ = tx.send(());
                            }
                        }
                        next
                    }
                    None => self.repeat,
                }
            } else if path == self.paths.current {
                self.current
            } else if path == self.paths.voltage {
                self.voltage
            } else {
                None
            };

            value.map(str::to_string).ok_or_else(|| missing(path))
        }
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 14, 3, 9).unwrap()
    }

    fn config(dir: &TempDir, short: bool) -> SamplerConfig {
        UserConfig {
            output: dir.path().join("log.txt"),
            charger: "BAT0".to_string(),
            battery: "BAT0".to_string(),
            short,
            ..UserConfig::default()
        }
        .into_sampler_config(Some(dir.path()))
        .unwrap()
    }

    fn sampler(config: &SamplerConfig, script: &[Option<&'static str>]) -> Sampler<ScriptedSource> {
        Sampler::new(config, ScriptedSource::new(&config.paths, script)).with_clock(fixed_clock)
    }

    fn long_row(capacity: &str) -> String {
        format!(
            "| 14:03:09 |      123456 |     4123456 | {:>11} |\n{}",
            capacity, LONG_BORDER
        )
    }

    #[test]
    fn test_repeat_reading_is_not_recorded_again() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let mut sampler = sampler(&config, &[Some("50"), Some("50"), Some("49")]);

        assert!(matches!(sampler.sample_once().unwrap(), Outcome::Recorded(_)));
        assert_eq!(sampler.sample_once().unwrap(), Outcome::Unchanged);
        assert!(matches!(sampler.sample_once().unwrap(), Outcome::Recorded(_)));

        let log = fs::read_to_string(&config.output).unwrap();
        let expected = format!("{}{}{}", LONG_HEADER, long_row("50"), long_row("49"));
        assert_eq!(log, expected);
        assert_eq!(sampler.last_capacity(), "49");
    }

    #[test]
    fn test_rows_equal_string_transitions() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let script = [
            Some("50"),
            Some("50"),
            Some("49"),
            Some("49"),
            Some("49"),
            Some("48"),
            Some("50"),
            Some("50"),
        ];
        let mut sampler = sampler(&config, &script);

        for _ in 0..script.len() {
            sampler.poll();
        }

        let stats = sampler.stats();
        assert_eq!(stats.iterations, 8);
        assert_eq!(stats.recorded, 4);
        assert_eq!(stats.failed, 0);

        let log = fs::read_to_string(&config.output).unwrap();
        assert_eq!(log.matches("|   Time   |").count(), 1);
        assert_eq!(log.matches("| 14:03:09 |").count(), 4);
        assert!(log.starts_with(LONG_HEADER));
    }

    #[test]
    fn test_capacity_compared_as_text() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let mut sampler = sampler(&config, &[Some("5"), Some("05"), Some("5")]);

        for _ in 0..3 {
            sampler.poll();
        }

        assert_eq!(sampler.stats().recorded, 3);
    }

    #[test]
    fn test_missing_capacity_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let mut sampler = sampler(&config, &[None, None, None, None]);

        for _ in 0..4 {
            assert_eq!(sampler.poll(), None);
        }

        assert!(!config.output.exists());
        assert_eq!(sampler.last_capacity(), UNSET_CAPACITY);
        assert!(!sampler.header_written());
        assert_eq!(
            sampler.stats(),
            SamplerStats {
                iterations: 4,
                recorded: 0,
                failed: 4,
            }
        );
    }

    #[test]
    fn test_capacity_error_names_the_path() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let mut sampler = sampler(&config, &[None]);

        let err = sampler.sample_once().unwrap_err();
        assert!(matches!(err, SampleError::SourceUnavailable { .. }));
        assert_eq!(err.path(), config.paths.capacity.as_path());
    }

    #[test]
    fn test_current_outage_defers_the_change() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let mut sampler = sampler(&config, &[Some("80"), Some("80")]);
        sampler.source_mut().current = None;

        let err = sampler.sample_once().unwrap_err();
        assert_eq!(err.path(), config.paths.current.as_path());
        assert_eq!(sampler.last_capacity(), UNSET_CAPACITY);
        assert!(!config.output.exists());

        sampler.source_mut().current = Some("123456");
        assert!(matches!(sampler.sample_once().unwrap(), Outcome::Recorded(_)));

        let log = fs::read_to_string(&config.output).unwrap();
        assert_eq!(log, format!("{}{}", LONG_HEADER, long_row("80")));
    }

    #[test]
    fn test_voltage_outage_defers_the_change() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let mut sampler = sampler(&config, &[Some("80"), Some("80")]);
        sampler.source_mut().voltage = None;

        let err = sampler.sample_once().unwrap_err();
        assert_eq!(err.path(), config.paths.voltage.as_path());
        assert_eq!(sampler.last_capacity(), UNSET_CAPACITY);

        sampler.source_mut().voltage = Some("4123456");
        assert!(matches!(sampler.sample_once().unwrap(), Outcome::Recorded(_)));
        assert_eq!(sampler.last_capacity(), "80");
    }

    #[test]
    fn test_unwritable_output_defers_the_change() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir, false);
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        config.output = blocked.clone();

        let mut sampler = sampler(&config, &[Some("70")]);
        let err = sampler.sample_once().unwrap_err();

        assert!(matches!(err, SampleError::SinkUnavailable { .. }));
        assert_eq!(err.path(), blocked.as_path());
        assert_eq!(sampler.last_capacity(), UNSET_CAPACITY);
        assert!(!sampler.header_written());
    }

    #[test]
    fn test_header_written_once_per_run() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        fs::write(&config.output, "previous run\n").unwrap();

        let mut sampler = sampler(&config, &[Some("3"), Some("2"), Some("1")]);
        for _ in 0..3 {
            sampler.poll();
        }

        let log = fs::read_to_string(&config.output).unwrap();
        assert!(log.starts_with("previous run\n\n+----------+"));
        assert_eq!(log.matches("|   Time   |").count(), 1);
        assert!(sampler.header_written());
    }

    #[test]
    fn test_new_sampler_writes_a_fresh_header() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);

        let mut first = sampler(&config, &[Some("60")]);
        first.poll();
        let mut second = sampler(&config, &[Some("60")]);
        second.poll();

        let log = fs::read_to_string(&config.output).unwrap();
        assert_eq!(log.matches("|   Time   |").count(), 2);
        assert_eq!(log.matches("|          60 |").count(), 2);
    }

    #[test]
    fn test_short_format_record() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, true);
        let mut sampler = sampler(&config, &[Some("85")]);
        sampler.source_mut().current = Some("1500000");
        sampler.source_mut().voltage = Some("-1");

        sampler.poll();

        let log = fs::read_to_string(&config.output).unwrap();
        assert_eq!(
            log,
            "\n\
             +----------+------+------+------+\n\
             |   Time   | C(A) | V(V) | C(%) |\n\
             +----------+------+------+------+\n\
             | 14:03:09 | 1.50 | 0.00 |   85 |\n\
             +----------+------+------+------+\n"
        );
    }

    #[test]
    fn test_recorded_sample_fields() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let mut sampler = sampler(&config, &[Some("42")]);

        assert_eq!(
            sampler.poll(),
            Some(Sample {
                time: "14:03:09".to_string(),
                current: "123456".to_string(),
                voltage: "4123456".to_string(),
                capacity: "42".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_run_records_transitions_until_shutdown() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let (tx, rx) = oneshot::channel();
        let source = ScriptedSource::new(&config.paths, &[Some("50"), Some("50"), Some("49")])
            .notify_when_exhausted(tx);
        let sampler = Sampler::new(&config, source).with_clock(fixed_clock);

        let sampler = sampler
            .run(Duration::from_millis(1), async {
                let _ = rx.await;
            })
            .await;

        let stats = sampler.stats();
        assert_eq!(stats.iterations, 3);
        assert_eq!(stats.recorded, 2);

        let log = fs::read_to_string(&config.output).unwrap();
        assert_eq!(
            log,
            format!("{}{}{}", LONG_HEADER, long_row("50"), long_row("49"))
        );
    }

    #[tokio::test]
    async fn test_run_survives_missing_capacity() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, false);
        let (tx, rx) = oneshot::channel();
        let source = ScriptedSource::new(&config.paths, &[None, None, None, None, None])
            .notify_when_exhausted(tx);

        let sampler = Sampler::new(&config, source)
            .run(Duration::from_millis(1), async {
                let _ = rx.await;
            })
            .await;

        assert_eq!(sampler.stats().iterations, 5);
        assert_eq!(sampler.stats().failed, 5);
        assert_eq!(sampler.stats().recorded, 0);
        assert!(!config.output.exists());
    }
}
