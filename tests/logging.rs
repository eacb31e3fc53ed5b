use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn writes_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bridge.log");

    window_event_bridge::logging::init(true, Some(path.clone()));
    tracing::info!("bridge started");
    // A second initialisation leaves the first subscriber in place.
    window_event_bridge::logging::init(false, None);
    tracing::info!("still logging");

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("bridge started"));
    assert!(contents.contains("still logging"));
}
