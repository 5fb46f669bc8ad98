//! Engine-wide services
//!
//! Holds the process-wide logger used by the `engine_*` macros. Rendering
//! objects themselves are never global: the device, swapchain and renderer are
//! created and passed explicitly by the application.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())))
}

// ===== PUBLIC API =====

/// Entry point for engine-wide services
pub struct Engine;

impl Engine {
    /// Engine name reported to the graphics driver
    pub const NAME: &'static str = "Voxel";

    /// Engine version as (major, minor, patch)
    pub const VERSION: (u32, u32, u32) = (0, 1, 0);

    /// Replace the active logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use voxel_engine::voxel::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Restore the colored console logger
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::new());
        }
    }

    /// Log a message without source location (used by `engine_info!` and friends)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log a message with file:line (used by `engine_error!` and `engine_err!`)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
