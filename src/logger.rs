//! Structured logging for swapdesk
//!
//! Provides tagged, leveled console logging with per-module debug control:
//! - Standard levels (Error/Warning/Info/Debug/Verbose)
//! - Debug output gated by `--debug-<module>` command-line flags
//! - Verbose output gated by `--verbose`
//!
//! Call `logger::init()` once at startup (main.rs) before any logging.

use crate::arguments::get_cmd_args;
use chrono::Utc;
use colored::*;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

/// Log level ordering: Error < Warning < Info < Debug < Verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
    Verbose = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Verbose => "VERBOSE",
        }
    }
}

/// Source module tags for log filtering and display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Quote,
    Provider,
    Oracle,
    Watcher,
    Tx,
}

impl LogTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Quote => "QUOTE",
            LogTag::Provider => "PROVIDER",
            LogTag::Oracle => "ORACLE",
            LogTag::Watcher => "WATCHER",
            LogTag::Tx => "TX",
        }
    }

    /// Key used in `--debug-<key>` flags
    pub fn debug_key(&self) -> &'static str {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Quote => "quotes",
            LogTag::Provider => "providers",
            LogTag::Oracle => "oracle",
            LogTag::Watcher => "watcher",
            LogTag::Tx => "tx",
        }
    }
}

#[derive(Debug, Clone)]
struct LoggerConfig {
    min_level: LogLevel,
    debug_tags: HashSet<&'static str>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

const ALL_TAGS: [LogTag; 7] = [
    LogTag::System,
    LogTag::Config,
    LogTag::Quote,
    LogTag::Provider,
    LogTag::Oracle,
    LogTag::Watcher,
    LogTag::Tx,
];

/// Initialize the logger from command-line arguments
///
/// Scans for `--debug-<module>`, `--debug-all`, `--verbose` and `--quiet`
/// and configures the filtering rules accordingly.
pub fn init() {
    let args = get_cmd_args();
    let mut config = LoggerConfig::default();

    if args.iter().any(|a| a == "--verbose") {
        config.min_level = LogLevel::Verbose;
    } else if args.iter().any(|a| a == "--quiet") {
        config.min_level = LogLevel::Warning;
    }

    for tag in ALL_TAGS {
        let flag = format!("--debug-{}", tag.debug_key());
        if args.iter().any(|a| *a == flag || a == "--debug-all") {
            config.debug_tags.insert(tag.debug_key());
        }
    }

    *LOGGER_CONFIG.write() = config;
}

fn should_log(tag: LogTag, level: LogLevel) -> bool {
    let config = LOGGER_CONFIG.read();

    // Errors always log
    if level == LogLevel::Error {
        return true;
    }

    // Debug requires the per-module flag regardless of min level
    if level == LogLevel::Debug {
        return config.debug_tags.contains(tag.debug_key())
            || config.min_level == LogLevel::Verbose;
    }

    level <= config.min_level
}

fn write_line(tag: LogTag, level: LogLevel, message: &str) {
    let timestamp = Utc::now().format("%H:%M:%S%.3f").to_string();
    let tag_colored = match level {
        LogLevel::Error => tag.as_str().red().bold(),
        LogLevel::Warning => tag.as_str().yellow().bold(),
        LogLevel::Info => tag.as_str().cyan().bold(),
        LogLevel::Debug | LogLevel::Verbose => tag.as_str().purple(),
    };
    let level_str = format!("[{}]", level.as_str());
    let body = match level {
        LogLevel::Error => message.red().to_string(),
        LogLevel::Warning => message.yellow().to_string(),
        LogLevel::Debug | LogLevel::Verbose => message.dimmed().to_string(),
        LogLevel::Info => message.to_string(),
    };
    println!(
        "{} {} {} {}",
        format!("[{}]", timestamp).dimmed(),
        level_str.dimmed(),
        tag_colored,
        body
    );
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    if should_log(tag, LogLevel::Error) {
        write_line(tag, LogLevel::Error, message);
    }
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    if should_log(tag, LogLevel::Warning) {
        write_line(tag, LogLevel::Warning, message);
    }
}

/// Log at INFO level
pub fn info(tag: LogTag, message: &str) {
    if should_log(tag, LogLevel::Info) {
        write_line(tag, LogLevel::Info, message);
    }
}

/// Log at DEBUG level (only with `--debug-<module>` for that tag)
pub fn debug(tag: LogTag, message: &str) {
    if should_log(tag, LogLevel::Debug) {
        write_line(tag, LogLevel::Debug, message);
    }
}

/// Log at VERBOSE level (only with `--verbose`)
pub fn verbose(tag: LogTag, message: &str) {
    if should_log(tag, LogLevel::Verbose) {
        write_line(tag, LogLevel::Verbose, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_always_logs() {
        assert!(should_log(LogTag::Quote, LogLevel::Error));
    }

    #[test]
    fn debug_gated_by_tag_flag() {
        {
            let mut config = LOGGER_CONFIG.write();
            config.min_level = LogLevel::Info;
            config.debug_tags.clear();
        }
        assert!(!should_log(LogTag::Watcher, LogLevel::Debug));

        LOGGER_CONFIG
            .write()
            .debug_tags
            .insert(LogTag::Watcher.debug_key());
        assert!(should_log(LogTag::Watcher, LogLevel::Debug));
        LOGGER_CONFIG.write().debug_tags.clear();
    }
}
