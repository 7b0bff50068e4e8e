//! Logger used by the `rbx` binary for the library's `log!` statements.

use clap::ValueEnum;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fmt;
use std::io::{self, IsTerminal, Write};

/// Verbosity selected on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Off => write!(f, "off"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Writes `level: message` lines to stderr
#[derive(Debug, Default)]
pub struct CliLogger;

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let (label, colour) = match record.level() {
            Level::Error => ("error", "\x1b[1;31m"),
            Level::Warn => ("warn", "\x1b[1;33m"),
            Level::Info => ("info", "\x1b[1;34m"),
            Level::Debug => ("debug", "\x1b[1;34m"),
            Level::Trace => ("trace", "\x1b[1;35m"),
        };

        let mut err = io::stderr().lock();
        let _ = if err.is_terminal() {
            writeln!(err, "{}{}\x1b[0m: {}", colour, label, record.args())
        } else {
            writeln!(err, "{}: {}", label, record.args())
        };
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: CliLogger = CliLogger;

/// Install the logger; later calls keep the first logger
pub fn init(level: LogLevel) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level.filter());
    }
}
