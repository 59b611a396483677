//! Leveled stderr logging for the job pool
//!
//! Thread-safe, optionally-flushing log lines. Every line is written under
//! the stderr lock so lines from concurrent lanes never interleave.
//!
//! # Environment Variables
//!
//! - `JP_LOG_LEVEL=<level>` - off, error, warn, info, debug, trace (or 0-5); default info
//! - `JP_FLUSH_EPRINT=1` - Flush stderr after each line
//! - `JP_LOG_THREAD=1` - Prefix each line with the current thread name
//!
//! # Usage
//!
//! ```ignore
//! use jobpool_core::{kinfo, kwarn, kdebug};
//!
//! kinfo!("pool armed: {} lanes", lanes);
//! kwarn!("job {} dropped: {}", id, err);
//! kdebug!("accepted {}", peer);
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Once;

/// Log levels
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a level name or digit; `None` for anything unrecognised
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "1" => Some(LogLevel::Error),
            "warn" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static INIT: Once = Once::new();
static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static THREAD_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Read `JP_LOG_LEVEL`, `JP_FLUSH_EPRINT` and `JP_LOG_THREAD`
///
/// Runs once; later calls are no-ops. Called lazily by the first log line.
/// Programmatic setters called before the first line win over the
/// environment only if they run after `init()`.
pub fn init() {
    INIT.call_once(|| {
        if let Some(level) = std::env::var("JP_LOG_LEVEL").ok().and_then(|v| LogLevel::parse(&v)) {
            LOG_LEVEL.store(level as u8, Ordering::Relaxed);
        }
        FLUSH_ENABLED.store(crate::env::env_get_bool("JP_FLUSH_EPRINT", false), Ordering::Relaxed);
        THREAD_ENABLED.store(crate::env::env_get_bool("JP_LOG_THREAD", false), Ordering::Relaxed);
    });
}

/// Get current log level
#[inline]
pub fn log_level() -> LogLevel {
    init();
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level programmatically
pub fn set_log_level(level: LogLevel) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Set flush mode programmatically
pub fn set_flush_enabled(enabled: bool) {
    init();
    FLUSH_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Toggle the thread-name prefix programmatically
pub fn set_thread_enabled(enabled: bool) {
    init();
    THREAD_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Check if a log level is enabled
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level <= log_level()
}

fn write_line(prefix: &str, args: std::fmt::Arguments<'_>) {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    if !prefix.is_empty() {
        let _ = write!(handle, "{} ", prefix);
    }
    if THREAD_ENABLED.load(Ordering::Relaxed) {
        let current = std::thread::current();
        let _ = write!(handle, "<{}> ", current.name().unwrap_or("unnamed"));
    }
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");
    if FLUSH_ENABLED.load(Ordering::Relaxed) {
        let _ = handle.flush();
    }
}

/// Internal: unleveled line
#[doc(hidden)]
pub fn _kprintln_impl(args: std::fmt::Arguments<'_>) {
    init();
    write_line("", args);
}

/// Internal: leveled line
#[doc(hidden)]
pub fn _klog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    write_line(level.prefix(), args);
}

// ============================================================================
// Public Macros
// ============================================================================

/// Print a line to stderr regardless of level
#[macro_export]
macro_rules! kprintln {
    () => {{
        $crate::kprint::_kprintln_impl(format_args!(""));
    }};
    ($($arg:tt)*) => {{
        $crate::kprint::_kprintln_impl(format_args!($($arg)*));
    }};
}

/// Error level log (shown unless logging is off)
#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Error, format_args!($($arg)*));
    }};
}

/// Warning level log
#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Warn, format_args!($($arg)*));
    }};
}

/// Info level log
#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Info, format_args!($($arg)*));
    }};
}

/// Debug level log
#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Debug, format_args!($($arg)*));
    }};
}

/// Trace level log (most verbose)
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Trace, format_args!($($arg)*));
    }};
}
