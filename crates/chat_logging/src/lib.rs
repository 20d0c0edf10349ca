#![deny(missing_docs)]
//! Shared logging utilities for the prioritizer workspace.
//!
//! This crate provides the `chat_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line logged
//! through the macros is tagged with the current run generation, so that
//! output from a superseded prioritization run can be told
//! apart from the current one.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide, so engine threads tag their lines with the app's run.
static RUN_GENERATION: AtomicU64 = AtomicU64::new(0);

/// Sets the current run generation for every thread.
/// The app event loop calls this whenever a new run starts.
pub fn set_run_generation(generation: u64) {
    RUN_GENERATION.store(generation, Ordering::Relaxed);
}

/// Retrieves the current run generation.
/// Returns 0 if no run has started yet.
pub fn run_generation() -> u64 {
    RUN_GENERATION.load(Ordering::Relaxed)
}

/// Logs a trace-level message tagged with the current run generation.
#[macro_export]
macro_rules! chat_trace {
    ($($arg:tt)*) => {{
        log::trace!("[run {}] {}", $crate::run_generation(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current run generation.
#[macro_export]
macro_rules! chat_info {
    ($($arg:tt)*) => {{
        log::info!("[run {}] {}", $crate::run_generation(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current run generation.
#[macro_export]
macro_rules! chat_debug {
    ($($arg:tt)*) => {{
        log::debug!("[run {}] {}", $crate::run_generation(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current run generation.
#[macro_export]
macro_rules! chat_warn {
    ($($arg:tt)*) => {{
        log::warn!("[run {}] {}", $crate::run_generation(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current run generation.
#[macro_export]
macro_rules! chat_error {
    ($($arg:tt)*) => {{
        log::error!("[run {}] {}", $crate::run_generation(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
