//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger and the global logger.

use crate::log::{self, Logger, LogEntry, LogSeverity, DefaultLogger};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn entry(severity: LogSeverity, message: &str) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "beam::Test".to_string(),
        message: message.to_string(),
        file: None,
        line: None,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Warn), "Warn");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_with_file_line() {
    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "beam::ShaderLinker".to_string(),
        message: "Error compiling shader".to_string(),
        file: Some("shader.rs"),
        line: Some(42),
    };

    let copy = entry.clone();
    assert_eq!(copy.severity, LogSeverity::Error);
    assert_eq!(copy.source, "beam::ShaderLinker");
    assert_eq!(copy.file, Some("shader.rs"));
    assert_eq!(copy.line, Some(42));
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;

    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        // Just verify it doesn't panic
        logger.log(&entry(severity, "message"));
    }
}

#[test]
fn test_default_logger_error_with_file_line() {
    let logger = DefaultLogger;
    let mut e = entry(LogSeverity::Error, "incomplete framebuffer");
    e.file = Some("offscreen_target.rs");
    e.line = Some(7);
    logger.log(&e);
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}

// ============================================================================
// GLOBAL LOGGER TESTS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

#[test]
#[serial]
fn test_global_logger_macros() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    log::set_logger(CaptureLogger { entries: entries.clone() });

    crate::engine_warn!("beam::LogTest", "Missing texture {} at unit {}", "albedo", 0);
    crate::engine_error!("beam::LogTest", "link failed");

    log::reset_logger();

    let captured = entries.lock().unwrap();
    let ours: Vec<&LogEntry> = captured.iter().filter(|e| e.source == "beam::LogTest").collect();
    assert_eq!(ours.len(), 2);

    assert_eq!(ours[0].severity, LogSeverity::Warn);
    assert_eq!(ours[0].message, "Missing texture albedo at unit 0");
    assert!(ours[0].file.is_none());

    assert_eq!(ours[1].severity, LogSeverity::Error);
    assert_eq!(ours[1].message, "link failed");
    assert!(ours[1].file.is_some());
    assert!(ours[1].line.is_some());
}

#[test]
#[serial]
fn test_reset_logger_stops_capture() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    log::set_logger(CaptureLogger { entries: entries.clone() });
    log::reset_logger();

    crate::engine_info!("beam::LogResetTest", "after reset");

    let captured = entries.lock().unwrap();
    assert!(captured.iter().all(|e| e.source != "beam::LogResetTest"));
}
