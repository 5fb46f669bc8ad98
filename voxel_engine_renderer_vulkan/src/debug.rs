/// Vulkan debug messenger - routes validation layer messages into the engine logger
///
/// Messages are counted per severity and identical messages are grouped so the
/// end-of-run report can point out repeats.

use std::borrow::Cow;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use ash::vk;
use colored::*;
use rustc_hash::FxHashMap;
use voxel_engine::voxel::log::LogSeverity;
use voxel_engine::voxel::Engine;

const SOURCE: &str = "voxel::vulkan";

static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Occurrences per message text
static MESSAGE_TRACKER: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Validation message counts since the device was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn record(&self, severity: LogSeverity) {
        let counter = match severity {
            LogSeverity::Error => &self.errors,
            LogSeverity::Warn => &self.warnings,
            LogSeverity::Info => &self.info,
            LogSeverity::Debug | LogSeverity::Trace => &self.verbose,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Engine severity for a messenger severity; the most severe bit wins
pub(crate) fn log_severity(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Info
    } else {
        LogSeverity::Trace
    }
}

pub(crate) fn message_kind(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Severities the messenger subscribes to
pub(crate) fn messenger_severities() -> vk::DebugUtilsMessageSeverityFlagsEXT {
    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
}

/// Reset counters and message grouping; called when a messenger is installed
pub(crate) fn reset_validation_stats() {
    VALIDATION_STATS.reset();
    let mut tracker = MESSAGE_TRACKER.lock().unwrap_or_else(|e| e.into_inner());
    *tracker = Some(FxHashMap::default());
}

pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.get()
}

fn track_message(message: &str) -> u32 {
    let mut guard = MESSAGE_TRACKER.lock().unwrap_or_else(|e| e.into_inner());
    let count = guard
        .get_or_insert_with(FxHashMap::default)
        .entry(message.to_string())
        .or_insert(0);
    *count += 1;
    *count
}

pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());
    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }
    println!("  {} {}", "Total:".white().bold(), stats.total());

    let guard = MESSAGE_TRACKER.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(tracker) = guard.as_ref() {
        let repeated = tracker.values().filter(|&&count| count > 1).count();
        if repeated > 0 {
            println!("\n  {} message(s) appeared multiple times", repeated);
        }
    }
    println!("{}\n", "====================================".bright_blue().bold());
}

/// Messenger callback installed on the instance
///
/// # Safety
///
/// Called by the Vulkan loader with a valid callback data pointer.
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = *p_callback_data;
    let message_id = if callback_data.p_message_id_name.is_null() {
        Cow::Borrowed("Unknown")
    } else {
        CStr::from_ptr(callback_data.p_message_id_name).to_string_lossy()
    };
    let message = if callback_data.p_message.is_null() {
        Cow::Borrowed("No message")
    } else {
        CStr::from_ptr(callback_data.p_message).to_string_lossy()
    };

    let severity = log_severity(message_severity);
    VALIDATION_STATS.record(severity);
    let occurrences = track_message(&message);
    let repeat = if occurrences > 1 { format!(" [x{}]", occurrences) } else { String::new() };

    let text = format!("[{}] {}{}: {}", message_kind(message_type), message_id, repeat, message);
    if severity == LogSeverity::Error {
        Engine::log_detailed(severity, SOURCE, text, file!(), line!());
    } else {
        Engine::log(severity, SOURCE, text);
    }

    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
