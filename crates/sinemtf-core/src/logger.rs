//! Stderr logger for the command-line tool and tests.
//!
//! A line reads `[  1.234s  INFO sinemtf_mtf] MTF = 0.9931 lpmm=5 fiducial=7`:
//! time since installation, level, emitting crate, message, then the
//! structured fields the record carries. Pipeline stages attach the frame's
//! fiducial id and the tile frequency as `log` key-values, so per-frame
//! output can be grepped without parsing messages.
//!
//! Records from crates outside the workspace (image decoders, png) are held
//! to [`LogConfig::dependency_level`].

use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::OnceLock;
use std::time::Instant;

use log::kv::{self, Key, Value, VisitSource};
use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_TARGET_PREFIX: &str = "sinemtf";

/// Level filters of the stderr logger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter for the `sinemtf*` crates.
    pub level: LevelFilter,
    /// Filter for everything else.
    pub dependency_level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            dependency_level: LevelFilter::Warn,
        }
    }
}

struct FrameLogger {
    config: LogConfig,
    started: Instant,
}

impl FrameLogger {
    fn filter_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET_PREFIX) {
            self.config.level
        } else {
            self.config.dependency_level
        }
    }
}

impl Log for FrameLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(self.started.elapsed().as_secs_f64(), record);
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Appends ` key=value` for every structured field of a record.
struct FieldWriter<'a>(&'a mut String);

impl<'kvs> VisitSource<'kvs> for FieldWriter<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
        let _ = write!(self.0, " {key}={value}");
        Ok(())
    }
}

fn format_record(elapsed_s: f64, record: &Record) -> String {
    let target = record.target();
    let krate = target.split("::").next().unwrap_or(target);
    let mut line = format!(
        "[{:7.3}s {:>5} {}] {}",
        elapsed_s,
        record.level(),
        krate,
        record.args()
    );
    let _ = record.key_values().visit(&mut FieldWriter(&mut line));
    line
}

static LOGGER: OnceLock<FrameLogger> = OnceLock::new();

/// Install the stderr logger. Only the first call takes effect.
pub fn init_logger(config: LogConfig) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| FrameLogger {
            config,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(config.level.max(config.dependency_level));
    }
    Ok(())
}

/// [`init_logger`] with `level` for the workspace crates and `Warn` for the rest.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_logger(LogConfig {
        level,
        ..LogConfig::default()
    })
}

/// Install a `tracing` subscriber honouring `RUST_LOG` (default `info`).
///
/// Span close events carry the time spent in each pipeline stage.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_span_events(FmtSpan::CLOSE);
    if json {
        let _ = builder.json().flatten_event(true).finish().try_init();
    } else {
        let _ = builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
