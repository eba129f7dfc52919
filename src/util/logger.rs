use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Writes log records to stderr as `[level] message`.
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    pub fn new(verbose: bool) -> StderrLogger {
        StderrLogger {
            level: if verbose { LevelFilter::Debug } else { LevelFilter::Warn },
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Installs the logger as the global `log` backend. Can only succeed once per process.
    pub fn init(verbose: bool) -> Result<(), SetLoggerError> {
        let logger = StderrLogger::new(verbose);
        let level = logger.level();

        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let label = match record.level() {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };

        eprintln!("[{}] {}", label, record.args());
    }

    fn flush(&self) {}
}
