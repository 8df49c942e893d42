//! Logging
//!
//! The crate logs through the `log` facade; `init_logging` must route those
//! records into the rolling files. Runs in its own binary because the
//! subscriber is process-global.

use filmdesk::LoggerError;

#[test]
fn test_log_records_reach_rolling_files() {
    let dir = tempfile::tempdir().unwrap();
    let handle = filmdesk::init_logging(dir.path()).expect("first init");

    log::warn!("bid request failed: {}", "connection reset by peer");

    let lines = handle.recent_lines();
    assert!(lines.iter().any(|l| l.contains("filmdesk") && l.contains("logging to")));
    assert!(lines.iter().any(|l| l.contains("bid request failed: connection reset by peer")));
    assert!(handle.active_file().starts_with(dir.path()));

    assert!(matches!(filmdesk::init_logging(dir.path()), Err(LoggerError::AlreadyInitialized)));
}
