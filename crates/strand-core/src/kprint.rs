//! Leveled, context-tagged debug output for the strand executor.
//!
//! Every worker thread's log line is automatically tagged with its worker id
//! and the strand it currently holds, similar in spirit to the Linux kernel's
//! `printk` level prefixes.
//!
//! # Environment Variables
//!
//! - `STX_FLUSH_EPRINT=1` - Flush stderr after each print
//! - `STX_LOG_LEVEL=<level>` - 0=off, 1=error, 2=warn, 3=info, 4=debug, 5=trace
//! - `STX_KPRINT_TIME=1` - Include nanosecond timestamp in output
//!
//! # Output Format
//!
//! `[LEVEL] [w<worker>:s<strand>] message`, with an optional `[<ns>]` after
//! the level when timestamps are enabled.
//!
//! # Usage
//!
//! ```
//! use strand_core::{kdebug, kinfo, kwarn, kerror};
//!
//! kdebug!("dequeued task for strand {}", 3);
//! kinfo!("worker parked");
//! kwarn!("unexpected strand state");
//! kerror!("task panicked: {}", "boom");
//! ```

use crate::env::env_get_bool;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Instant;

/// Log levels (matches common conventions)
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

static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static TIME_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize logging from environment variables.
///
/// Called automatically on first log, but can be called explicitly for
/// deterministic initialization (e.g. in tests that set the level first).
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    START_TIME.get_or_init(Instant::now);

    FLUSH_ENABLED.store(env_get_bool("STX_FLUSH_EPRINT", false), Ordering::Relaxed);
    TIME_ENABLED.store(env_get_bool("STX_KPRINT_TIME", false), Ordering::Relaxed);

    if let Ok(val) = std::env::var("STX_LOG_LEVEL") {
        let level = match val.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => LogLevel::Info,
        };
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }
}

#[inline]
pub fn flush_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    FLUSH_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub fn time_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    TIME_ENABLED.load(Ordering::Relaxed)
}

#[inline]
pub fn log_level() -> LogLevel {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn set_flush_enabled(enabled: bool) {
    FLUSH_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn set_time_enabled(enabled: bool) {
    TIME_ENABLED.store(enabled, Ordering::Relaxed);
}

#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level as u8 <= log_level() as u8
}

#[inline]
pub fn elapsed_ns() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

thread_local! {
    static WORKER_ID: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
    static STRAND_ID: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
}

/// Set the current worker id for this thread (called by the worker loop).
pub fn set_worker_id(id: u32) {
    WORKER_ID.with(|w| w.set(Some(id)));
}

pub fn clear_worker_id() {
    WORKER_ID.with(|w| w.set(None));
}

/// Set the strand currently held by this worker (or clear with `None`).
pub fn set_strand_id(id: Option<u32>) {
    STRAND_ID.with(|s| s.set(id));
}

pub fn get_worker_id() -> Option<u32> {
    WORKER_ID.with(|w| w.get())
}

pub fn get_strand_id() -> Option<u32> {
    STRAND_ID.with(|s| s.get())
}

fn format_context() -> String {
    let worker = match get_worker_id() {
        Some(id) => format!("w{}", id),
        None => "w--".to_string(),
    };
    let strand = match get_strand_id() {
        Some(id) => format!("s{}", id),
        None => "s--".to_string(),
    };
    format!("[{}:{}]", worker, strand)
}

#[doc(hidden)]
pub fn _klog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }

    let stderr = std::io::stderr();
    let mut handle = stderr.lock();

    let _ = write!(handle, "{} ", level.prefix());
    if time_enabled() {
        let _ = write!(handle, "[{}] ", elapsed_ns());
    }
    let _ = write!(handle, "{} ", format_context());
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");

    if flush_enabled() {
        let _ = handle.flush();
    }
}

/// Error level log with context
#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Error, format_args!($($arg)*));
    }};
}

/// Warning level log with context
#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Warn, format_args!($($arg)*));
    }};
}

/// Info level log with context
#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Info, format_args!($($arg)*));
    }};
}

/// Debug level log with context
#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Debug, format_args!($($arg)*));
    }};
}

/// Trace level log with context
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Trace, format_args!($($arg)*));
    }};
}
