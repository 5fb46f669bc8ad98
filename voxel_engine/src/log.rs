//! Engine logging
//!
//! All subsystems report through the `engine_*` macros, which forward to the
//! logger installed in `Engine`. Applications replace the default console
//! logger with `Engine::set_logger`.

use chrono::{DateTime, Local};
use colored::*;
use std::time::SystemTime;

/// Destination for engine log entries
///
/// # Example
///
/// ```no_run
/// use voxel_engine::voxel::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::sync::Mutex<std::fs::File>,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// A single log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,

    pub timestamp: SystemTime,

    /// Emitting component (e.g. "voxel::Swapchain", "voxel::vulkan")
    pub source: String,

    pub message: String,

    /// Source file, only set for ERROR entries
    pub file: Option<&'static str>,

    /// Source line, only set for ERROR entries
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the console logger
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Colored console logger
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
///
/// Entries below `min_severity` are dropped.
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    pub fn new() -> Self {
        Self { min_severity: LogSeverity::Trace }
    }

    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    /// Render an entry without colors
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                entry.severity.label(),
                entry.source,
                entry.message,
                file,
                line
            ),
            _ => format!(
                "[{}] [{}] [{}] {}",
                timestamp,
                entry.severity.label(),
                entry.source,
                entry.message
            ),
        }
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.severity < self.min_severity {
            return;
        }

        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let label = entry.severity.label();
        let severity_str = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };
        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            eprintln!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            );
        } else {
            println!("[{}] [{}] [{}] {}", timestamp, severity_str, source, entry.message);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::voxel::Engine::log(
            $crate::voxel::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
///
/// # Example
///
/// ```no_run
/// # use voxel_engine::engine_debug;
/// engine_debug!("voxel::Renderer", "Swapchain out of date, recreating");
/// ```
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::voxel::Engine::log(
            $crate::voxel::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::voxel::Engine::log(
            $crate::voxel::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::voxel::Engine::log(
            $crate::voxel::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::voxel::Engine::log_detailed(
            $crate::voxel::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR message and build the matching `Error::BackendError`
///
/// # Example
///
/// ```no_run
/// # use voxel_engine::engine_err;
/// # use voxel_engine::voxel::Result;
/// # fn submit() -> std::result::Result<(), i32> { Err(-4) }
/// # fn run() -> Result<()> {
/// submit().map_err(|e| engine_err!("voxel::vulkan", "Failed to submit: {:?}", e))?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::voxel::Engine::log_detailed(
            $crate::voxel::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::voxel::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
