#![warn(clippy::all, rust_2018_idioms)]

/// Logging macros that prefix each event with `[file:module:line]`
///
/// Dependencies that log through the `log` crate reach the same subscriber via `LogTracer`,
/// so these emit tracing events only.
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        tracing::trace!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        tracing::debug!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        tracing::info!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        tracing::warn!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

/*
Log level guidelines:

TRACE: per-item work inside loops (each log group read, each page fetched)
DEBUG: client construction, credential cache hits and misses, policy round progress
INFO:  agent setup, completed checks, tool completions
WARN:  skipped log groups or prefixes, round budget exhausted, best-effort posts that failed
ERROR: failed AWS calls surfaced to the user, policy failures, failed scheduled checks

Use log_* where the call site matters when reading a log (credential handling, agent setup);
plain tracing macros are fine elsewhere.
*/
