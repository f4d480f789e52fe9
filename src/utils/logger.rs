//! Logger utility for application-wide logging
//!
//! A `log::Log` implementation that mirrors every record to a log file and
//! to the console. Used by the binary when a log file is configured;
//! otherwise `env_logger` is installed instead.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

/// File + console logger
pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
    level: LevelFilter,
}

impl Logger {
    /// Creates a new logger instance
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file, truncated on open
    /// * `level` - Most verbose level written
    ///
    /// # Returns
    ///
    /// A new Logger instance or an error if the file cannot be created
    pub fn new(log_file: &Path, level: LevelFilter) -> io::Result<Self> {
        let file = File::create(log_file)?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
            level,
        })
    }

    /// Appends one line to the log file
    pub fn write_line(&self, message: &str) -> io::Result<()> {
        let mut guard = self.file.lock().map_err(|_| io::Error::other("log file lock poisoned"))?;
        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Installs a file logger as the global `log` backend
    pub fn init_global_logger(log_file: &Path, level: LevelFilter) -> io::Result<()> {
        let global_logger = Logger::new(log_file, level)?;

        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = self.write_line(&message);

            eprintln!("{}", message);
        }
    }

    fn flush(&self) {
        // Already flushing in write_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_records_reach_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bandtrace.log");
        let logger = Logger::new(&path, LevelFilter::Info).unwrap();

        logger.log(&Record::builder().level(Level::Info).args(format_args!("band 3 done")).build());
        logger.log(&Record::builder().level(Level::Debug).args(format_args!("hidden")).build());

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[INFO] band 3 done\n");
    }
}
